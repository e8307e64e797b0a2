//! Raster Graph Core
//!
//! Nodes connected through pins, grouped into compositions and executed once per frame:
//! - [`Workspace`] owns every composition, node and pin, and applies graph edits.
//! - [`Traverser`] walks the active compositions for one frame and returns a
//!   [`FrameOutput`].
//! - [`NodeRegistry`] maps package names to node factories; [`builtin_registry`] holds
//!   the packaged nodes.

pub mod composition;
pub mod config;
pub mod document;
pub mod error;
pub mod ids;
pub mod node;
pub mod nodes;
pub mod pin;
pub mod project;
pub mod registry;
pub mod topo;
pub mod traverse;
pub mod workspace;

pub use composition::{BlendMode, Composition};
pub use config::TraverserConfig;
pub use document::{CompositionDocument, LoadReport, NodeDocument, ProjectDocument};
pub use error::{DocumentError, GraphError};
pub use ids::{CompositionId, IdAllocator, LinkId, NodeId, PinId};
pub use node::{
    ExecuteContext, FlowSignal, Node, NodeBehavior, NodeOutputs, NodeSetup, PinValueMap,
};
pub use pin::{GenericPin, PinDirection};
pub use project::Project;
pub use registry::{builtin_registry, NodeDescription, NodeFactory, NodeRegistry};
pub use topo::topo_order;
pub use traverse::{CompositionFrame, FrameOutput, Traverser, TraverserState};
pub use workspace::Workspace;

pub use raster_animation_core::{Attribute, AttributeId, Easing};
pub use raster_api_core::{HeadlessBackend, ResourceBackend, Value, ValueKind};
