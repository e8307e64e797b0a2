//! Connection endpoints.
//!
//! Edges are stored on the input side only: an input pin records the output it reads
//! from in `connected_pin_id`. Outputs keep no back-references, so one output can feed any
//! number of inputs.

use raster_api_core::ValueKind;
use serde::{Deserialize, Serialize};

use crate::ids::{LinkId, PinId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    Input,
    Output,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenericPin {
    #[serde(rename = "PinID")]
    pub pin_id: PinId,
    /// Identifies the edge ending at this pin.
    #[serde(rename = "LinkID")]
    pub link_id: LinkId,
    #[serde(rename = "ConnectedPinID", default)]
    pub connected_pin_id: Option<PinId>,
    /// Attribute an input overrides, or the name of an output.
    pub linked_attribute: String,
    #[serde(rename = "Type")]
    pub direction: PinDirection,
    #[serde(default)]
    pub flow: bool,
    /// Declared payload kind of a data output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValueKind>,
}

impl GenericPin {
    pub fn new(
        pin_id: PinId,
        link_id: LinkId,
        linked_attribute: impl Into<String>,
        direction: PinDirection,
        flow: bool,
    ) -> Self {
        Self {
            pin_id,
            link_id,
            connected_pin_id: None,
            linked_attribute: linked_attribute.into(),
            direction,
            flow,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }

    pub fn is_connected(&self) -> bool {
        self.connected_pin_id.is_some()
    }
}
