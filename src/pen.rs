use std::{collections::HashMap, hash::BuildHasher};

use indexmap::IndexMap;
use kurbo::{Affine, Point};
use smol_str::SmolStr;

use crate::{
    engine::GeometryEngine, ArcSize, Direction, Path, PathOpsError, PlanarEngine, StrokeStyle,
};

/// Receiver of drawing commands, in the style of a glyph outline pen.
pub trait Pen {
    fn move_to(&mut self, pt: Point) -> Result<(), PathOpsError>;

    fn line_to(&mut self, pt: Point) -> Result<(), PathOpsError>;

    /// Cubic curve from the current point.
    fn curve_to(&mut self, c1: Point, c2: Point, pt: Point) -> Result<(), PathOpsError>;

    /// TrueType quadratic spline: on-curve points between consecutive
    /// off-curves are implied at their midpoints. With `on_curve` of `None`
    /// the whole closed contour consists of off-curve points.
    fn q_curve_to(
        &mut self,
        off_curves: &[Point],
        on_curve: Option<Point>,
    ) -> Result<(), PathOpsError>;

    fn close_path(&mut self) -> Result<(), PathOpsError>;

    fn end_path(&mut self) -> Result<(), PathOpsError>;

    /// Draw the glyph `name` with `transform` applied.
    fn add_component(&mut self, name: &str, transform: Affine) -> Result<(), PathOpsError>;
}

/// A named collection of paths that components resolve against.
pub trait GlyphSet {
    fn glyph(&self, name: &str) -> Option<&Path>;
}

impl<S: BuildHasher> GlyphSet for HashMap<String, Path, S> {
    fn glyph(&self, name: &str) -> Option<&Path> {
        self.get(name)
    }
}

impl GlyphSet for IndexMap<SmolStr, Path> {
    fn glyph(&self, name: &str) -> Option<&Path> {
        self.get(name)
    }
}

/// Anything that can replay itself as drawing commands.
pub trait Draw {
    fn draw(&self, pen: &mut dyn Pen) -> Result<(), PathOpsError>;
}

impl Draw for Path {
    fn draw(&self, pen: &mut dyn Pen) -> Result<(), PathOpsError> {
        Path::draw(self, pen)
    }
}

impl<T: Draw + ?Sized> Draw for &T {
    fn draw(&self, pen: &mut dyn Pen) -> Result<(), PathOpsError> {
        (**self).draw(pen)
    }
}

/// One recorded drawing command.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
    QCurveTo(Vec<Point>, Option<Point>),
    ClosePath,
    EndPath,
    AddComponent(String, Affine),
}

impl Segment {
    /// Send this command to `pen`.
    pub fn replay(&self, pen: &mut dyn Pen) -> Result<(), PathOpsError> {
        match self {
            Segment::MoveTo(p) => pen.move_to(*p),
            Segment::LineTo(p) => pen.line_to(*p),
            Segment::CurveTo(c1, c2, p) => pen.curve_to(*c1, *c2, *p),
            Segment::QCurveTo(offs, on) => pen.q_curve_to(offs, *on),
            Segment::ClosePath => pen.close_path(),
            Segment::EndPath => pen.end_path(),
            Segment::AddComponent(name, transform) => pen.add_component(name, *transform),
        }
    }
}

/// Pen that keeps every call as a [`Segment`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingPen {
    pub segments: Vec<Segment>,
}

impl RecordingPen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pen for RecordingPen {
    fn move_to(&mut self, pt: Point) -> Result<(), PathOpsError> {
        self.segments.push(Segment::MoveTo(pt));
        Ok(())
    }

    fn line_to(&mut self, pt: Point) -> Result<(), PathOpsError> {
        self.segments.push(Segment::LineTo(pt));
        Ok(())
    }

    fn curve_to(&mut self, c1: Point, c2: Point, pt: Point) -> Result<(), PathOpsError> {
        self.segments.push(Segment::CurveTo(c1, c2, pt));
        Ok(())
    }

    fn q_curve_to(
        &mut self,
        off_curves: &[Point],
        on_curve: Option<Point>,
    ) -> Result<(), PathOpsError> {
        self.segments
            .push(Segment::QCurveTo(off_curves.to_vec(), on_curve));
        Ok(())
    }

    fn close_path(&mut self) -> Result<(), PathOpsError> {
        self.segments.push(Segment::ClosePath);
        Ok(())
    }

    fn end_path(&mut self) -> Result<(), PathOpsError> {
        self.segments.push(Segment::EndPath);
        Ok(())
    }

    fn add_component(&mut self, name: &str, transform: Affine) -> Result<(), PathOpsError> {
        self.segments
            .push(Segment::AddComponent(name.to_string(), transform));
        Ok(())
    }
}

impl Draw for RecordingPen {
    fn draw(&self, pen: &mut dyn Pen) -> Result<(), PathOpsError> {
        for segment in &self.segments {
            segment.replay(pen)?;
        }
        Ok(())
    }
}

/// Pen which appends to a borrowed [`Path`].
///
/// A contour left open when the pen is dropped is terminated with an END
/// verb.
pub struct PathPen<'a> {
    path: &'a mut Path,
    glyph_set: Option<&'a dyn GlyphSet>,
    allow_open_paths: bool,
}

impl<'a> PathPen<'a> {
    pub fn new(path: &'a mut Path) -> Self {
        PathPen {
            path,
            glyph_set: None,
            allow_open_paths: true,
        }
    }

    /// Resolve components against `glyph_set`.
    pub fn with_glyph_set(mut self, glyph_set: &'a dyn GlyphSet) -> Self {
        self.glyph_set = Some(glyph_set);
        self
    }

    /// With `false`, leaving a contour open is an [`PathOpsError::OpenPath`]
    /// error.
    pub fn with_allow_open_paths(mut self, allow_open_paths: bool) -> Self {
        self.allow_open_paths = allow_open_paths;
        self
    }

    pub fn path(&self) -> &Path {
        self.path
    }

    fn end_open_contour(&mut self) -> Result<(), PathOpsError> {
        if self.path.has_open_contour() {
            if !self.allow_open_paths {
                return Err(PathOpsError::OpenPath);
            }
            self.path.end();
        }
        Ok(())
    }

    fn expand_spline(&mut self, off_curves: &[Point], on_curve: Point) {
        for (i, off) in off_curves.iter().enumerate() {
            let end = match off_curves.get(i + 1) {
                Some(next) => off.midpoint(*next),
                None => on_curve,
            };
            self.path.quad_to(*off, end);
        }
    }

    pub fn conic_to(&mut self, control: Point, pt: Point, weight: f64) {
        self.path.conic_to(control, pt, weight);
    }

    pub fn arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        arc_size: ArcSize,
        sweep: Direction,
        pt: Point,
    ) {
        self.path.arc_to(rx, ry, x_axis_rotation, arc_size, sweep, pt);
    }

    /// End the open contour and replace the path by the outline of its
    /// stroke.
    pub fn stroke(&mut self, style: &StrokeStyle) -> Result<(), PathOpsError> {
        self.path.end();
        *self.path = PlanarEngine::default().stroke(self.path, style)?;
        Ok(())
    }
}

impl Pen for PathPen<'_> {
    fn move_to(&mut self, pt: Point) -> Result<(), PathOpsError> {
        self.end_open_contour()?;
        self.path.move_to(pt);
        Ok(())
    }

    fn line_to(&mut self, pt: Point) -> Result<(), PathOpsError> {
        self.path.line_to(pt);
        Ok(())
    }

    fn curve_to(&mut self, c1: Point, c2: Point, pt: Point) -> Result<(), PathOpsError> {
        self.path.cubic_to(c1, c2, pt);
        Ok(())
    }

    fn q_curve_to(
        &mut self,
        off_curves: &[Point],
        on_curve: Option<Point>,
    ) -> Result<(), PathOpsError> {
        match on_curve {
            Some(on_curve) if off_curves.is_empty() => self.line_to(on_curve),
            Some(on_curve) => {
                self.expand_spline(off_curves, on_curve);
                Ok(())
            }
            None => {
                if self.path.has_open_contour() {
                    return Err(PathOpsError::InvalidSpline(
                        "a spline without on-curve points must start a new contour",
                    ));
                }
                let (Some(first), Some(last)) = (off_curves.first(), off_curves.last()) else {
                    return Err(PathOpsError::InvalidSpline("no points given"));
                };
                let start = last.midpoint(*first);
                self.path.move_to(start);
                self.expand_spline(off_curves, start);
                Ok(())
            }
        }
    }

    fn close_path(&mut self) -> Result<(), PathOpsError> {
        if !self.path.has_open_contour() {
            return Ok(());
        }
        // closing lines are implied by CLOSE
        while self.path.verbs.last() == Some(&crate::Verb::Line)
            && self.path.points.last().copied() == self.path.last_move_point()
        {
            self.path.verbs.pop();
            self.path.points.pop();
        }
        self.path.close();
        Ok(())
    }

    fn end_path(&mut self) -> Result<(), PathOpsError> {
        self.end_open_contour()
    }

    fn add_component(&mut self, name: &str, transform: Affine) -> Result<(), PathOpsError> {
        let glyph_set = self.glyph_set.ok_or(PathOpsError::MissingGlyphSet)?;
        let glyph = glyph_set
            .glyph(name)
            .ok_or_else(|| PathOpsError::GlyphNotFound {
                glyph: name.to_string(),
            })?;
        self.end_open_contour()?;
        log::trace!("decomposing component {name} with {transform:?}");
        self.path.append(&glyph.transform(transform));
        Ok(())
    }
}

impl Drop for PathPen<'_> {
    fn drop(&mut self) {
        self.path.end();
    }
}
