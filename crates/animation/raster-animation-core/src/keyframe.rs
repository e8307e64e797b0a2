use raster_api_core::Value;
use serde::{Deserialize, Serialize};

use crate::ids::KeyframeId;
use crate::interp::Easing;

/// A `(frame, value)` sample plus the easing of the segment that starts here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Keyframe {
    #[serde(rename = "ID", default = "KeyframeId::unassigned")]
    pub id: KeyframeId,
    pub frame: f32,
    #[serde(deserialize_with = "raster_api_core::json::deserialize_value")]
    pub value: Value,
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(id: KeyframeId, frame: f32, value: Value) -> Self {
        Self {
            id,
            frame,
            value,
            easing: Easing::Linear,
        }
    }
}
