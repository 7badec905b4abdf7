#![deny(clippy::unwrap_used, clippy::expect_used)]
//! Boolean operations, overlap removal and winding normalization for
//! outline paths, driven through pen-style drawing commands.

mod builder;
mod common;
mod engine;
mod error;
pub mod operations;
mod path;
mod pen;
mod segments;
mod winding;

pub use crate::{
    builder::OpBuilder,
    common::{
        bits2float, float2bits, points_almost_equal, ArcSize, Direction, FillType, LineCap,
        LineJoin, OpOptions, PathOp, StrokeStyle, Verb,
    },
    engine::{GeometryEngine, PlanarEngine, Tolerances},
    error::PathOpsError,
    path::{Elements, Path, DEFAULT_CONIC_TOLERANCE},
    pen::{Draw, GlyphSet, PathPen, Pen, RecordingPen, Segment},
    segments::Segments,
};
pub use kurbo::{Affine, Point};

/// Combine two paths with the bundled engine.
pub fn op(
    one: &Path,
    two: &Path,
    operator: PathOp,
    options: &OpOptions,
) -> Result<Path, PathOpsError> {
    PlanarEngine::default().op(one, two, operator, options)
}

/// Remove the overlaps of `path` with the bundled engine.
pub fn simplify(path: &Path, options: &OpOptions) -> Result<Path, PathOpsError> {
    PlanarEngine::default().simplify(path, options)
}
