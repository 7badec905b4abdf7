pub(crate) mod tolerance;

pub use tolerance::{bits2float, float2bits, points_almost_equal};

use crate::PathOpsError;

/// The kind of a path entry.
///
/// Discriminants match Skia's `SkPath::Verb` numbering, with `End` standing in
/// for `kDone_Verb` as the explicit terminator of an open contour.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Verb {
    Move = 0,
    Line = 1,
    Quad = 2,
    Conic = 3,
    Cubic = 4,
    Close = 5,
    End = 6,
}

impl Verb {
    /// Every verb, in declaration order.
    pub const ALL: [Verb; 7] = [
        Verb::Move,
        Verb::Line,
        Verb::Quad,
        Verb::Conic,
        Verb::Cubic,
        Verb::Close,
        Verb::End,
    ];

    /// Number of points stored with this verb.
    pub fn point_count(self) -> usize {
        match self {
            Verb::Move | Verb::Line => 1,
            Verb::Quad | Verb::Conic => 2,
            Verb::Cubic => 3,
            Verb::Close | Verb::End => 0,
        }
    }

    /// True for the verbs which terminate a contour.
    pub fn is_terminator(self) -> bool {
        matches!(self, Verb::Close | Verb::End)
    }

    /// True for the verbs which draw a segment from the current point.
    pub fn is_segment(self) -> bool {
        matches!(self, Verb::Line | Verb::Quad | Verb::Conic | Verb::Cubic)
    }
}

impl TryFrom<u8> for Verb {
    type Error = PathOpsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Verb::ALL
            .into_iter()
            .find(|verb| *verb as u8 == value)
            .ok_or_else(|| PathOpsError::UnsupportedVerb(format!("tag {}", value)))
    }
}

/// How the interior of a path is determined.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillType {
    /// Nonzero winding rule.
    #[default]
    NonZero,
    /// Even-odd rule.
    EvenOdd,
}

impl FillType {
    pub const ALL: [FillType; 2] = [FillType::NonZero, FillType::EvenOdd];

    /// Whether a point with the given winding number is filled.
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillType::NonZero => winding != 0,
            FillType::EvenOdd => winding % 2 != 0,
        }
    }
}

/// Boolean operator applied between two paths.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathOp {
    Difference,
    Intersection,
    Union,
    Xor,
    ReverseDifference,
}

impl PathOp {
    pub const ALL: [PathOp; 5] = [
        PathOp::Difference,
        PathOp::Intersection,
        PathOp::Union,
        PathOp::Xor,
        PathOp::ReverseDifference,
    ];

    /// Whether a region inside `one` and/or `two` belongs to the result.
    pub fn keeps(self, in_one: bool, in_two: bool) -> bool {
        match self {
            PathOp::Difference => in_one && !in_two,
            PathOp::Intersection => in_one && in_two,
            PathOp::Union => in_one || in_two,
            PathOp::Xor => in_one != in_two,
            PathOp::ReverseDifference => in_two && !in_one,
        }
    }
}

/// Which of the two candidate arcs `arc_to` draws.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ArcSize {
    Small,
    Large,
}

impl ArcSize {
    pub const ALL: [ArcSize; 2] = [ArcSize::Small, ArcSize::Large];
}

/// Sweep direction of an arc, in y-down device terms as Skia defines it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Direction {
    Cw,
    Ccw,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Cw, Direction::Ccw];
}

/// Stroke end cap.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub const ALL: [LineCap; 3] = [LineCap::Butt, LineCap::Round, LineCap::Square];
}

/// Stroke corner join.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub const ALL: [LineJoin; 3] = [LineJoin::Miter, LineJoin::Round, LineJoin::Bevel];
}

/// Parameters for [`crate::Path::stroke`].
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    /// Alternating on/off lengths; empty for a solid stroke.
    pub dash_array: Vec<f64>,
    pub dash_offset: f64,
}

impl StrokeStyle {
    pub fn new(width: f64) -> Self {
        StrokeStyle {
            width,
            ..Default::default()
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    pub fn with_dashes(mut self, dash_array: impl Into<Vec<f64>>, dash_offset: f64) -> Self {
        self.dash_array = dash_array.into();
        self.dash_offset = dash_offset;
        self
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        StrokeStyle {
            width: 1.0,
            cap: LineCap::default(),
            join: LineJoin::default(),
            miter_limit: 4.0,
            dash_array: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

/// Post-processing applied to the result of a boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpOptions {
    /// Re-orient contours by nesting depth and switch to the nonzero rule.
    pub fix_winding: bool,
    /// Rotate each result contour to start at an input contour's first point
    /// when it passes through one.
    pub keep_starting_points: bool,
    /// Outer contours clockwise (TrueType convention) instead of
    /// counter-clockwise.
    pub clockwise: bool,
}

impl OpOptions {
    pub fn with_fix_winding(mut self, fix_winding: bool) -> Self {
        self.fix_winding = fix_winding;
        self
    }

    pub fn with_keep_starting_points(mut self, keep_starting_points: bool) -> Self {
        self.keep_starting_points = keep_starting_points;
        self
    }

    pub fn with_clockwise(mut self, clockwise: bool) -> Self {
        self.clockwise = clockwise;
        self
    }
}

impl Default for OpOptions {
    fn default() -> Self {
        OpOptions {
            fix_winding: true,
            keep_starting_points: true,
            clockwise: false,
        }
    }
}
