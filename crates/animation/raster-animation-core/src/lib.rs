//! Raster Animation Core
//!
//! Keyframed attributes: ordered `(frame, value)` samples with per-segment easing,
//! evaluated with the blend rules from `raster-api-core`.

pub mod attribute;
pub mod error;
pub mod ids;
pub mod interp;
pub mod keyframe;
pub mod sampling;

pub use attribute::{parse_attribute_json, Attribute, AttributeDocument};
pub use error::AttributeError;
pub use ids::{AttributeId, KeyframeId};
pub use interp::Easing;
pub use keyframe::Keyframe;
pub use raster_api_core::{Value, ValueKind};
pub use sampling::{find_segment, sample_keyframes};
