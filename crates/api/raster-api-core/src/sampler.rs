//! Texture sampling settings emitted by the sampler constant nodes.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFiltering {
    #[default]
    Linear,
    Nearest,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureWrapping {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Sampling state a node asks for. Each sampler constant sets one mode and leaves the
/// other unset, so the renderer keeps its own choice for it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SamplerSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtering: Option<TextureFiltering>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapping: Option<TextureWrapping>,
}

impl SamplerSettings {
    pub fn new(filtering: TextureFiltering, wrapping: TextureWrapping) -> Self {
        Self {
            filtering: Some(filtering),
            wrapping: Some(wrapping),
        }
    }

    pub fn filtering(filtering: TextureFiltering) -> Self {
        Self {
            filtering: Some(filtering),
            wrapping: None,
        }
    }

    pub fn wrapping(wrapping: TextureWrapping) -> Self {
        Self {
            filtering: None,
            wrapping: Some(wrapping),
        }
    }

    /// `self` with every mode `other` leaves unset filled in from `other`.
    pub fn or(self, other: SamplerSettings) -> Self {
        Self {
            filtering: self.filtering.or(other.filtering),
            wrapping: self.wrapping.or(other.wrapping),
        }
    }
}
