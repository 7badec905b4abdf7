use thiserror::Error;

use crate::Verb;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathOpsError {
    #[error("Open contours are not supported")]
    OpenPath,

    #[error("Unsupported verb: {0}")]
    UnsupportedVerb(String),

    #[error("Verb {verb:?} takes {expected} points, got {got}")]
    InvalidPointCount {
        verb: Verb,
        expected: usize,
        got: usize,
    },

    #[error("Malformed path: {0}")]
    InvalidPath(String),

    #[error("Invalid quadratic spline: {0}")]
    InvalidSpline(&'static str),

    #[error("Missing required glyphSet; can't decompose components")]
    MissingGlyphSet,

    #[error("Glyph {glyph} not found")]
    GlyphNotFound { glyph: String },

    #[error("OpBuilder has already been resolved")]
    BuilderConsumed,

    #[error("OpBuilder has no paths to resolve")]
    EmptyBuilder,

    #[error("Geometry engine failure: {0}")]
    Geometry(String),
}
