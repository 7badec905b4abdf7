use std::{f64::consts::FRAC_PI_2, fmt::Write as _};

use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape};

use crate::{
    common::float2bits, engine::GeometryEngine, ArcSize, Direction, FillType, OpOptions, PathOp,
    PathOpsError, PlanarEngine, StrokeStyle, Verb,
};

mod conic;
pub(crate) mod contour;
mod reverse;

pub(crate) use conic::conic_to_quads;

/// Tolerance used when a conic has to be approximated implicitly, e.g. when
/// converting to a [`BezPath`].
pub const DEFAULT_CONIC_TOLERANCE: f64 = 0.25;

/// A sequence of contours stored as parallel verb, point and conic-weight
/// arrays, Skia style.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPath"))]
pub struct Path {
    pub(crate) verbs: Vec<Verb>,
    pub(crate) points: Vec<Point>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub(crate) weights: Vec<f64>,
    pub(crate) fill_type: FillType,
}

/// A deserialized path before its arrays are checked against each other.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawPath {
    verbs: Vec<Verb>,
    points: Vec<Point>,
    #[serde(default)]
    weights: Vec<f64>,
    #[serde(default)]
    fill_type: FillType,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPath> for Path {
    type Error = PathOpsError;

    fn try_from(raw: RawPath) -> Result<Self, Self::Error> {
        let mut open = false;
        for (index, verb) in raw.verbs.iter().enumerate() {
            match verb {
                Verb::Move => open = true,
                _ if !open => {
                    return Err(PathOpsError::InvalidPath(format!(
                        "{verb:?} at verb {index} has no contour to continue"
                    )))
                }
                Verb::Close | Verb::End => open = false,
                _ => {}
            }
        }
        let expected: usize = raw.verbs.iter().map(|verb| verb.point_count()).sum();
        if expected != raw.points.len() {
            return Err(PathOpsError::InvalidPath(format!(
                "verbs take {expected} points, got {}",
                raw.points.len()
            )));
        }
        let conics = raw.verbs.iter().filter(|verb| **verb == Verb::Conic).count();
        if conics != raw.weights.len() {
            return Err(PathOpsError::InvalidPath(format!(
                "{conics} conics but {} weights",
                raw.weights.len()
            )));
        }
        Ok(Path {
            verbs: raw.verbs,
            points: raw.points,
            weights: raw.weights,
            fill_type: raw.fill_type,
        })
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill_type(fill_type: FillType) -> Self {
        Path {
            fill_type,
            ..Default::default()
        }
    }

    pub fn fill_type(&self) -> FillType {
        self.fill_type
    }

    pub fn set_fill_type(&mut self, fill_type: FillType) {
        self.fill_type = fill_type;
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// One weight per CONIC verb, in order.
    pub fn conic_weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    pub fn clear(&mut self) {
        self.verbs.clear();
        self.points.clear();
        self.weights.clear();
    }

    /// Iterate over `(verb, points)` entries.
    pub fn iter(&self) -> Elements<'_> {
        Elements {
            path: self,
            verb: 0,
            point: 0,
        }
    }

    /// True while the last contour has neither been closed nor ended.
    pub(crate) fn has_open_contour(&self) -> bool {
        self.verbs.last().is_some_and(|verb| !verb.is_terminator())
    }

    /// The MOVE point of the last contour.
    pub(crate) fn last_move_point(&self) -> Option<Point> {
        let mut offset = self.points.len();
        for verb in self.verbs.iter().rev() {
            offset = offset.checked_sub(verb.point_count())?;
            if *verb == Verb::Move {
                return self.points.get(offset).copied();
            }
        }
        None
    }

    fn inject_move_to_if_needed(&mut self) {
        if !self.has_open_contour() {
            let start = self.last_move_point().unwrap_or(Point::ORIGIN);
            self.move_to(start);
        }
    }

    pub fn move_to(&mut self, pt: impl Into<Point>) {
        self.verbs.push(Verb::Move);
        self.points.push(pt.into());
    }

    pub fn line_to(&mut self, pt: impl Into<Point>) {
        self.inject_move_to_if_needed();
        self.verbs.push(Verb::Line);
        self.points.push(pt.into());
    }

    pub fn quad_to(&mut self, control: impl Into<Point>, pt: impl Into<Point>) {
        self.inject_move_to_if_needed();
        self.verbs.push(Verb::Quad);
        self.points.extend([control.into(), pt.into()]);
    }

    pub fn conic_to(&mut self, control: impl Into<Point>, pt: impl Into<Point>, weight: f64) {
        self.inject_move_to_if_needed();
        self.verbs.push(Verb::Conic);
        self.points.extend([control.into(), pt.into()]);
        self.weights.push(weight);
    }

    pub fn cubic_to(
        &mut self,
        control1: impl Into<Point>,
        control2: impl Into<Point>,
        pt: impl Into<Point>,
    ) {
        self.inject_move_to_if_needed();
        self.verbs.push(Verb::Cubic);
        self.points
            .extend([control1.into(), control2.into(), pt.into()]);
    }

    /// Close the current contour. Does nothing if no contour is open.
    pub fn close(&mut self) {
        if self.has_open_contour() {
            self.verbs.push(Verb::Close);
        }
    }

    /// Terminate the current contour as open. Does nothing if no contour is
    /// open.
    pub fn end(&mut self) {
        if self.has_open_contour() {
            self.verbs.push(Verb::End);
        }
    }

    /// Append an SVG-style elliptical arc from the current point to `pt`.
    ///
    /// `x_axis_rotation` is in degrees. The arc is stored as conics spanning
    /// at most a quarter turn each; a degenerate arc (zero radius or
    /// coincident end points) becomes a line.
    pub fn arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        arc_size: ArcSize,
        sweep: Direction,
        pt: impl Into<Point>,
    ) {
        self.inject_move_to_if_needed();
        let from = self.points.last().copied().unwrap_or(Point::ORIGIN);
        let to = pt.into();
        let arc = kurbo::SvgArc {
            from,
            to,
            radii: kurbo::Vec2::new(rx, ry),
            x_rotation: x_axis_rotation.to_radians(),
            large_arc: arc_size == ArcSize::Large,
            sweep: sweep == Direction::Cw,
        };
        match kurbo::Arc::from_svg_arc(&arc) {
            Some(arc) => {
                let count = (arc.sweep_angle.abs() / FRAC_PI_2 - 1e-9).ceil().max(1.0) as usize;
                let step = arc.sweep_angle / count as f64;
                let weight = (step / 2.0).cos();
                let ellipse = Affine::translate(arc.center.to_vec2())
                    * Affine::rotate(arc.x_rotation)
                    * Affine::scale_non_uniform(arc.radii.x, arc.radii.y);
                for i in 0..count {
                    let mid = arc.start_angle + step * (i as f64 + 0.5);
                    let control = ellipse * Point::new(mid.cos() / weight, mid.sin() / weight);
                    let end = if i + 1 == count {
                        to
                    } else {
                        let angle = arc.start_angle + step * (i + 1) as f64;
                        ellipse * Point::new(angle.cos(), angle.sin())
                    };
                    self.conic_to(control, end, weight);
                }
            }
            None => {
                log::trace!("degenerate arc from {from:?} to {to:?}, drawing a line");
                self.line_to(to);
            }
        }
    }

    /// Append an entry by verb. CONIC needs a weight and is rejected; use
    /// [`Path::conic_to`].
    pub fn add(&mut self, verb: Verb, points: &[Point]) -> Result<(), PathOpsError> {
        if points.len() != verb.point_count() {
            return Err(PathOpsError::InvalidPointCount {
                verb,
                expected: verb.point_count(),
                got: points.len(),
            });
        }
        match (verb, points) {
            (Verb::Move, &[p]) => self.move_to(p),
            (Verb::Line, &[p]) => self.line_to(p),
            (Verb::Quad, &[c, p]) => self.quad_to(c, p),
            (Verb::Cubic, &[c1, c2, p]) => self.cubic_to(c1, c2, p),
            (Verb::Close, _) => self.close(),
            (Verb::End, _) => self.end(),
            (verb, _) => {
                return Err(PathOpsError::UnsupportedVerb(format!(
                    "{verb:?} cannot be added without a weight"
                )))
            }
        }
        Ok(())
    }

    /// Each contour as its own path, with this path's fill type.
    pub fn contours(&self) -> impl Iterator<Item = Path> + '_ {
        let fill_type = self.fill_type;
        self.split_contours()
            .into_iter()
            .map(move |contour| Path::from_contours(&[contour], fill_type))
    }

    pub fn contour_count(&self) -> usize {
        self.verbs.iter().filter(|v| **v == Verb::Move).count()
    }

    /// The MOVE point of every contour.
    pub fn first_points(&self) -> Vec<Point> {
        self.iter()
            .filter(|(verb, _)| *verb == Verb::Move)
            .map(|(_, pts)| pts[0])
            .collect()
    }

    /// Append the contours of `other` as they are. An open contour of this
    /// path is ended first.
    pub fn append(&mut self, other: &Path) {
        self.end();
        self.verbs.extend_from_slice(&other.verbs);
        self.points.extend_from_slice(&other.points);
        self.weights.extend_from_slice(&other.weights);
        self.end();
    }

    /// Reverse the direction of every contour in place.
    pub fn reverse(&mut self) {
        reverse::reverse_contours(self);
    }

    /// A copy of this path with every point mapped through `affine`.
    pub fn transform(&self, affine: Affine) -> Path {
        Path {
            verbs: self.verbs.clone(),
            points: self.points.iter().map(|p| affine * *p).collect(),
            weights: self.weights.clone(),
            fill_type: self.fill_type,
        }
    }

    /// Replace every CONIC with quadratic curves within `tolerance`.
    pub fn convert_conics_to_quads(&mut self, tolerance: f64) {
        if self.weights.is_empty() {
            return;
        }
        let mut converted = Path::with_fill_type(self.fill_type);
        for (verb, pts, weight) in self.iter_with_weights() {
            match verb {
                Verb::Conic => {
                    let start = converted.points.last().copied().unwrap_or(Point::ORIGIN);
                    for (control, end) in conic_to_quads(start, pts[0], pts[1], weight, tolerance)
                    {
                        converted.verbs.push(Verb::Quad);
                        converted.points.extend([control, end]);
                    }
                }
                _ => {
                    converted.verbs.push(verb);
                    converted.points.extend_from_slice(pts);
                }
            }
        }
        *self = converted;
    }

    fn iter_with_weights(&self) -> impl Iterator<Item = (Verb, &[Point], f64)> + '_ {
        let mut weights = self.weights.iter().copied();
        self.iter().map(move |(verb, pts)| {
            let weight = if verb == Verb::Conic {
                weights.next().unwrap_or(1.0)
            } else {
                1.0
            };
            (verb, pts, weight)
        })
    }

    /// Convert to a [`kurbo::BezPath`]. Conics are approximated by quads;
    /// open contours stay open.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut last = Point::ORIGIN;
        for (verb, pts, weight) in self.iter_with_weights() {
            match verb {
                Verb::Move => path.move_to(pts[0]),
                Verb::Line => path.line_to(pts[0]),
                Verb::Quad => path.quad_to(pts[0], pts[1]),
                Verb::Conic => {
                    for (control, end) in
                        conic_to_quads(last, pts[0], pts[1], weight, DEFAULT_CONIC_TOLERANCE)
                    {
                        path.quad_to(control, end);
                    }
                }
                Verb::Cubic => path.curve_to(pts[0], pts[1], pts[2]),
                Verb::Close => path.close_path(),
                Verb::End => {}
            }
            if let Some(p) = pts.last() {
                last = *p;
            }
        }
        path
    }

    /// Like [`Path::to_bezpath`], but every contour is closed. This is the
    /// shape a fill rule is evaluated against.
    pub(crate) fn to_closed_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        for el in self.to_bezpath().elements() {
            if let PathEl::MoveTo(_) = el {
                if !path.elements().is_empty()
                    && !matches!(path.elements().last(), Some(PathEl::ClosePath))
                {
                    path.close_path();
                }
            }
            path.push(*el);
        }
        if !path.elements().is_empty() && !matches!(path.elements().last(), Some(PathEl::ClosePath))
        {
            path.close_path();
        }
        path
    }

    /// Tight-ish bounds: the bounding box of the curves, or
    /// [`Rect::ZERO`] for an empty path.
    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::ZERO;
        }
        self.to_bezpath().bounding_box()
    }

    /// Signed area, positive for counter-clockwise contours in y-up
    /// coordinates. Open contours count as closed.
    pub fn area(&self) -> f64 {
        self.to_closed_bezpath().area()
    }

    pub fn is_clockwise(&self) -> bool {
        self.area() < 0.0
    }

    /// Replace this path by its overlap-free equivalent.
    pub fn simplify(&mut self, options: &OpOptions) -> Result<(), PathOpsError> {
        *self = PlanarEngine::default().simplify(self, options)?;
        Ok(())
    }

    /// Orient contours by nesting depth and switch to the nonzero rule.
    pub fn fix_winding(&mut self, clockwise: bool) {
        crate::winding::fix_winding(self, clockwise);
    }

    /// Combine with `other` under `operator`.
    pub fn op(
        &self,
        other: &Path,
        operator: PathOp,
        options: &OpOptions,
    ) -> Result<Path, PathOpsError> {
        PlanarEngine::default().op(self, other, operator, options)
    }

    /// Replace this path by the outline of its stroke.
    pub fn stroke(&mut self, style: &StrokeStyle) -> Result<(), PathOpsError> {
        *self = PlanarEngine::default().stroke(self, style)?;
        Ok(())
    }

    /// Skia-style textual dump, one call per entry. With `as_hex`, each
    /// coordinate is written as the bit pattern of its f32 value.
    pub fn dump(&self, as_hex: bool) -> String {
        let mut out = String::new();
        let fill = match self.fill_type {
            FillType::NonZero => "kWinding",
            FillType::EvenOdd => "kEvenOdd",
        };
        let _ = writeln!(out, "path.setFillType(SkPathFillType::{fill});");
        let coord = |v: f64| {
            if as_hex {
                format!("SkBits2Float(0x{:08x})", float2bits(v))
            } else {
                format!("{}f", v as f32)
            }
        };
        for (verb, pts, weight) in self.iter_with_weights() {
            let mut args: Vec<String> = pts
                .iter()
                .flat_map(|p| [coord(p.x), coord(p.y)])
                .collect();
            let call = match verb {
                Verb::Move => "moveTo",
                Verb::Line => "lineTo",
                Verb::Quad => "quadTo",
                Verb::Conic => {
                    args.push(coord(weight));
                    "conicTo"
                }
                Verb::Cubic => "cubicTo",
                Verb::Close => "close",
                Verb::End => continue,
            };
            let _ = writeln!(out, "path.{call}({});", args.join(", "));
        }
        out
    }
}

impl From<&BezPath> for Path {
    fn from(bez: &BezPath) -> Self {
        let mut path = Path::new();
        for el in bez.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    path.end();
                    path.move_to(p);
                }
                PathEl::LineTo(p) => path.line_to(p),
                PathEl::QuadTo(c, p) => path.quad_to(c, p),
                PathEl::CurveTo(c1, c2, p) => path.cubic_to(c1, c2, p),
                PathEl::ClosePath => path.close(),
            }
        }
        path.end();
        path
    }
}

/// Iterator over the `(verb, points)` entries of a [`Path`].
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    path: &'a Path,
    verb: usize,
    point: usize,
}

impl<'a> Iterator for Elements<'a> {
    type Item = (Verb, &'a [Point]);

    fn next(&mut self) -> Option<Self::Item> {
        let verb = *self.path.verbs.get(self.verb)?;
        let end = self.point + verb.point_count();
        let pts = self.path.points.get(self.point..end)?;
        self.verb += 1;
        self.point = end;
        Some((verb, pts))
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = (Verb, &'a [Point]);
    type IntoIter = Elements<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
