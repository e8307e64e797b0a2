use raster_api_core::ValueKind;
use thiserror::Error;

use crate::ids::KeyframeId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("attribute '{attribute}' holds {expected:?} values, got {found:?}")]
    KindMismatch {
        attribute: String,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("keyframe frame must be finite, got {0}")]
    InvalidFrame(f32),
    #[error("unknown keyframe {0}")]
    UnknownKeyframe(KeyframeId),
    #[error("duplicate keyframe {0}")]
    DuplicateKeyframe(KeyframeId),
    #[error("attribute json parse error: {0}")]
    Parse(String),
}
