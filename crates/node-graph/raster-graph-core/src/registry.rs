//! Spawn registry: package name to node factory.

use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::GraphError;
use crate::node::NodeBehavior;
use crate::nodes;

pub type NodeFactory = fn() -> Box<dyn NodeBehavior>;

pub const PACKAGE_PREFIX: &str = "raster.packaged.";

pub const CATEGORY_UTILITIES: &str = "Utilities";
pub const CATEGORY_MATH: &str = "Math";
pub const CATEGORY_RENDERING: &str = "Rendering";
pub const CATEGORY_SHAPES: &str = "Shapes";
pub const CATEGORY_SAMPLER_CONSTANTS: &str = "Sampler Constants";
pub const CATEGORY_FLOW: &str = "Flow";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDescription {
    pub package_name: String,
    pub pretty_name: String,
    pub category: String,
}

impl NodeDescription {
    pub fn new(package_name: &str, pretty_name: &str, category: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            pretty_name: pretty_name.to_string(),
            category: category.to_string(),
        }
    }
}

#[derive(Clone)]
struct Entry {
    description: NodeDescription,
    factory: NodeFactory,
}

#[derive(Clone, Default)]
pub struct NodeRegistry {
    entries: IndexMap<String, Entry>,
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        description: NodeDescription,
        factory: NodeFactory,
    ) -> Result<(), GraphError> {
        if self.entries.contains_key(&description.package_name) {
            return Err(GraphError::DuplicatePackage(description.package_name));
        }
        debug!("registered node package {}", description.package_name);
        self.entries.insert(
            description.package_name.clone(),
            Entry {
                description,
                factory,
            },
        );
        Ok(())
    }

    pub fn contains(&self, package: &str) -> bool {
        self.entries.contains_key(package)
    }

    pub fn description(&self, package: &str) -> Option<&NodeDescription> {
        self.entries.get(package).map(|e| &e.description)
    }

    pub fn spawn(&self, package: &str) -> Result<Box<dyn NodeBehavior>, GraphError> {
        self.entries
            .get(package)
            .map(|e| (e.factory)())
            .ok_or_else(|| GraphError::UnknownPackage(package.to_string()))
    }

    /// Descriptions in registration order.
    pub fn descriptions(&self) -> impl Iterator<Item = &NodeDescription> {
        self.entries.values().map(|e| &e.description)
    }

    /// Descriptions grouped by category, categories in first-seen order.
    pub fn by_category(&self) -> IndexMap<&str, Vec<&NodeDescription>> {
        let mut out: IndexMap<&str, Vec<&NodeDescription>> = IndexMap::new();
        for desc in self.descriptions() {
            out.entry(desc.category.as_str()).or_default().push(desc);
        }
        out
    }
}

/// Registry holding every built-in node.
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    for (description, factory) in nodes::builtins() {
        if let Err(err) = registry.register(description, factory) {
            warn!("builtin registry: {err}");
        }
    }
    registry
}
