//! Traverser configuration.

use serde::{Deserialize, Serialize};

/// Knobs for a [`Traverser`](crate::Traverser). Round-trips through JSON with every field
/// optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TraverserConfig {
    /// Upper bound on flow signals delivered in one frame. Guards re-entrant loops.
    pub max_flow_signals: usize,
    /// Resolution used when nodes acquire framebuffers.
    pub resolution: [u32; 2],
}

impl Default for TraverserConfig {
    fn default() -> Self {
        Self {
            max_flow_signals: 4096,
            resolution: [1080, 1080],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TraverserConfig = serde_json::from_str(r#"{ "MaxFlowSignals": 8 }"#).unwrap();
        assert_eq!(config.max_flow_signals, 8);
        assert_eq!(config.resolution, [1080, 1080]);
    }
}
