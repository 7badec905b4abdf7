use kurbo::{BezPath, PathSeg, Point};

use crate::{
    path::contour::Contour,
    winding::{fix_winding, restore_starting_points},
    FillType, OpOptions, Path, PathOp, PathOpsError, StrokeStyle,
};

mod arrangement;
mod intersect;
mod stroke;

/// Provider of the numeric path operations.
///
/// Implementors supply the raw boolean, overlap removal and stroking; the
/// provided methods add winding normalization and starting-point
/// restoration on top.
pub trait GeometryEngine {
    /// The region selected by `operator` from `one` and `two`, each filled
    /// with its own fill type.
    fn boolean(&self, one: &Path, two: &Path, operator: PathOp) -> Result<Path, PathOpsError>;

    /// An equivalent path without self-overlapping contours.
    fn remove_overlaps(&self, path: &Path) -> Result<Path, PathOpsError>;

    /// The outline of `path` stroked with `style`.
    fn stroke(&self, path: &Path, style: &StrokeStyle) -> Result<Path, PathOpsError>;

    fn op(
        &self,
        one: &Path,
        two: &Path,
        operator: PathOp,
        options: &OpOptions,
    ) -> Result<Path, PathOpsError> {
        let mut first_points = one.first_points();
        first_points.extend(two.first_points());
        let mut result = self.boolean(one, two, operator)?;
        finish(self, &mut result, options, &first_points);
        Ok(result)
    }

    fn simplify(&self, path: &Path, options: &OpOptions) -> Result<Path, PathOpsError> {
        let mut result = self.remove_overlaps(path)?;
        finish(self, &mut result, options, &path.first_points());
        Ok(result)
    }

    fn fix_winding(&self, path: &mut Path, clockwise: bool) {
        fix_winding(path, clockwise);
    }
}

/// Apply the post-processing selected by `options` to an engine result.
pub(crate) fn finish<E: GeometryEngine + ?Sized>(
    engine: &E,
    result: &mut Path,
    options: &OpOptions,
    first_points: &[Point],
) {
    if options.fix_winding {
        engine.fix_winding(result, options.clockwise);
    } else if options.clockwise {
        result.reverse();
    }
    if options.keep_starting_points {
        restore_starting_points(result, first_points);
    }
}

/// Numeric tolerances of the [`PlanarEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Distance under which two points are the same vertex.
    pub point: f64,
    /// Parameter distance under which two split positions coincide.
    pub param: f64,
    /// Distance of the midpoints under which two pieces joining the same
    /// vertices are the same piece.
    pub coincidence: f64,
    /// Control point distance from the chord under which a curve is treated
    /// as straight while intersecting.
    pub flatness: f64,
    /// Offset of the inside/outside probes, relative to a piece's size.
    pub probe: f64,
    /// Accuracy of curve approximations (conics, strokes).
    pub curve: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            point: 1e-6,
            param: 1e-9,
            coincidence: 1e-4,
            flatness: 1e-7,
            probe: 1e-3,
            curve: 0.01,
        }
    }
}

/// Geometry engine working on the planar arrangement of all input segments.
///
/// Segments are split wherever they cross or touch, every piece is kept or
/// dropped depending on the fill on either side of it, and the kept pieces
/// are walked into closed contours. Results are canonical: each contour
/// starts at its lowest vertex (by y, then x), contours are sorted by start
/// point, outer contours run counter-clockwise and holes clockwise.
#[derive(Debug, Clone, Default)]
pub struct PlanarEngine {
    tolerances: Tolerances,
}

impl PlanarEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerances(tolerances: Tolerances) -> Self {
        PlanarEngine { tolerances }
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// The input as a shape with every contour closed, for winding queries.
    fn filled_shape(&self, path: &Path) -> Result<BezPath, PathOpsError> {
        if let Some(bad) = path.points.iter().find(|p| !p.is_finite()) {
            return Err(PathOpsError::Geometry(format!(
                "non-finite point {bad:?} in input"
            )));
        }
        if let Some(bad) = path.weights.iter().find(|w| !w.is_finite()) {
            return Err(PathOpsError::Geometry(format!(
                "non-finite conic weight {bad} in input"
            )));
        }
        let mut path = path.clone();
        path.convert_conics_to_quads(self.tolerances.curve);
        Ok(path.to_closed_bezpath())
    }

    /// Non-degenerate segments of `shape`, tagged with the input they
    /// belong to.
    fn edges(&self, shape: &BezPath, input: usize) -> Vec<(PathSeg, usize)> {
        let eps = self.tolerances.point;
        shape
            .segments()
            .filter(|seg| {
                let rect = intersect::control_box(seg);
                rect.width() > eps || rect.height() > eps
            })
            .map(|seg| (seg, input))
            .collect()
    }

    fn build(&self, contours: Vec<Contour>) -> Path {
        Path::from_contours(&contours, FillType::EvenOdd)
    }
}

impl GeometryEngine for PlanarEngine {
    fn boolean(&self, one: &Path, two: &Path, operator: PathOp) -> Result<Path, PathOpsError> {
        let shape_one = self.filled_shape(one)?;
        let shape_two = self.filled_shape(two)?;
        let mut edges = self.edges(&shape_one, 0);
        edges.extend(self.edges(&shape_two, 1));
        log::debug!(
            "{operator:?} of {} and {} contours",
            one.contour_count(),
            two.contour_count()
        );
        let (fill_one, fill_two) = (one.fill_type(), two.fill_type());
        let inside = |w: arrangement::Windings| {
            operator.keeps(fill_one.is_inside(w[0]), fill_two.is_inside(w[1]))
        };
        let contours = arrangement::trace_region(&edges, &inside, &self.tolerances);
        Ok(self.build(contours))
    }

    fn remove_overlaps(&self, path: &Path) -> Result<Path, PathOpsError> {
        let shape = self.filled_shape(path)?;
        let edges = self.edges(&shape, 0);
        log::debug!("removing overlaps from {} contours", path.contour_count());
        let fill = path.fill_type();
        let inside = |w: arrangement::Windings| fill.is_inside(w[0]);
        let contours = arrangement::trace_region(&edges, &inside, &self.tolerances);
        Ok(self.build(contours))
    }

    fn stroke(&self, path: &Path, style: &StrokeStyle) -> Result<Path, PathOpsError> {
        stroke::stroke(path, style, self.tolerances.curve)
    }
}
