use raster_animation_core::AttributeError;
use thiserror::Error;

use crate::ids::{CompositionId, NodeId, PinId};

/// Rejected graph edits. The workspace is left untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("unknown {0}")]
    UnknownNode(NodeId),
    #[error("unknown {0}")]
    UnknownPin(PinId),
    #[error("unknown {0}")]
    UnknownComposition(CompositionId),
    #[error("no node package named '{0}'")]
    UnknownPackage(String),
    #[error("package '{0}' is already registered")]
    DuplicatePackage(String),
    #[error("{node} has no attribute '{name}'")]
    UnknownAttribute { node: NodeId, name: String },
    #[error("composition has no attribute '{0}'")]
    UnknownCompositionAttribute(String),
    #[error("{0} is not a data output of this composition")]
    NotADataOutput(PinId),
    #[error("{0} and {1} have the same direction")]
    SameDirection(PinId, PinId),
    #[error("cannot link data pin and flow pin ({0} -> {1})")]
    FlowMismatch(PinId, PinId),
    #[error("{0} and {1} live in different compositions")]
    CrossComposition(PinId, PinId),
    #[error("linking {0} -> {1} would create a cycle")]
    CycleDetected(PinId, PinId),
    #[error(transparent)]
    Attribute(#[from] AttributeError),
}

/// Failures that abort loading a whole project document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("project json parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate {0} in document")]
    DuplicateNode(NodeId),
    #[error("duplicate {0} in document")]
    DuplicatePin(PinId),
    #[error("duplicate {0} in document")]
    DuplicateComposition(CompositionId),
    #[error("data links in {0} form a cycle")]
    Cycle(CompositionId),
}
