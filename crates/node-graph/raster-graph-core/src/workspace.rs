//! The workspace registry: every composition, node and pin of a project, plus the edits
//! that keep the connection graph consistent.
//!
//! Node and pin ids are unique across all compositions. `pin_owner` and `node_owner`
//! index them so edits never have to scan the whole project to find an endpoint.

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use log::{debug, warn};
use raster_api_core::{HeadlessBackend, ResourceBackend};

use crate::composition::Composition;
use crate::error::GraphError;
use crate::ids::{CompositionId, IdAllocator, LinkId, NodeId, PinId};
use crate::node::Node;
use crate::pin::GenericPin;
use crate::project::Project;
use crate::registry::{builtin_registry, NodeRegistry};

pub struct Workspace<B: ResourceBackend = HeadlessBackend> {
    pub project: Project,
    pub(crate) ids: IdAllocator,
    pub(crate) compositions: IndexMap<CompositionId, Composition>,
    pub(crate) pin_owner: HashMap<PinId, NodeId>,
    pub(crate) node_owner: HashMap<NodeId, CompositionId>,
    pub(crate) registry: NodeRegistry,
    pub(crate) backend: B,
}

impl Default for Workspace<HeadlessBackend> {
    fn default() -> Self {
        Self::new(HeadlessBackend::new())
    }
}

impl<B: ResourceBackend> std::fmt::Debug for Workspace<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("project", &self.project.name)
            .field("compositions", &self.compositions.len())
            .field("nodes", &self.node_owner.len())
            .finish()
    }
}

impl<B: ResourceBackend> Workspace<B> {
    /// Empty workspace with every built-in node package registered.
    pub fn new(backend: B) -> Self {
        Self::with_registry(backend, builtin_registry())
    }

    pub fn with_registry(backend: B, registry: NodeRegistry) -> Self {
        Self {
            project: Project::default(),
            ids: IdAllocator::new(),
            compositions: IndexMap::new(),
            pin_owner: HashMap::new(),
            node_owner: HashMap::new(),
            registry,
            backend,
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ----- compositions -----

    pub fn add_composition(&mut self, name: &str) -> CompositionId {
        let id = self.ids.alloc_composition();
        debug!("add {id} '{name}'");
        self.compositions.insert(id, Composition::new(id, name));
        id
    }

    /// Remove a composition and every node in it, releasing their resources.
    pub fn remove_composition(&mut self, id: CompositionId) -> Result<(), GraphError> {
        let mut comp = self
            .compositions
            .shift_remove(&id)
            .ok_or(GraphError::UnknownComposition(id))?;
        for node in comp.nodes.values_mut() {
            for pin in node.pins() {
                self.pin_owner.remove(&pin.pin_id);
            }
            self.node_owner.remove(&node.id);
            node.behavior.release_resources(&mut self.backend);
        }
        debug!("removed {id} with {} nodes", comp.nodes.len());
        Ok(())
    }

    pub fn composition(&self, id: CompositionId) -> Option<&Composition> {
        self.compositions.get(&id)
    }

    pub fn composition_mut(&mut self, id: CompositionId) -> Option<&mut Composition> {
        self.compositions.get_mut(&id)
    }

    pub fn compositions(&self) -> impl Iterator<Item = &Composition> {
        self.compositions.values()
    }

    /// Largest composition end frame.
    pub fn project_length(&self) -> f32 {
        self.compositions
            .values()
            .map(|c| c.end_frame)
            .fold(0.0, f32::max)
    }

    // ----- nodes -----

    /// Spawn a node from the registry into `composition`.
    pub fn add_node(
        &mut self,
        composition: CompositionId,
        package: &str,
    ) -> Result<NodeId, GraphError> {
        if !self.compositions.contains_key(&composition) {
            return Err(GraphError::UnknownComposition(composition));
        }
        let behavior = self.registry.spawn(package)?;
        let node = Node::spawn(&mut self.ids, package, behavior);
        let id = node.id;
        self.insert_node(composition, node);
        debug!("add {id} ({package}) to {composition}");
        Ok(id)
    }

    pub(crate) fn insert_node(&mut self, composition: CompositionId, node: Node) {
        for pin in node.pins() {
            self.pin_owner.insert(pin.pin_id, node.id);
        }
        self.node_owner.insert(node.id, composition);
        if let Some(comp) = self.compositions.get_mut(&composition) {
            comp.nodes.insert(node.id, node);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        let comp = self.node_owner.get(&id)?;
        self.compositions.get(comp)?.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let comp = self.node_owner.get(&id)?;
        self.compositions.get_mut(comp)?.nodes.get_mut(&id)
    }

    pub fn node_composition(&self, id: NodeId) -> Option<CompositionId> {
        self.node_owner.get(&id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.node_owner.len()
    }

    pub fn pin(&self, id: PinId) -> Option<&GenericPin> {
        let node = self.pin_owner.get(&id)?;
        self.node(*node)?.pin(id)
    }

    fn pin_mut(&mut self, id: PinId) -> Option<&mut GenericPin> {
        let node = *self.pin_owner.get(&id)?;
        self.node_mut(node)?.pin_mut(id)
    }

    pub fn pin_node(&self, id: PinId) -> Option<NodeId> {
        self.pin_owner.get(&id).copied()
    }

    fn locate(&self, pin: PinId) -> Result<(CompositionId, NodeId), GraphError> {
        let node = *self.pin_owner.get(&pin).ok_or(GraphError::UnknownPin(pin))?;
        let comp = *self.node_owner.get(&node).ok_or(GraphError::UnknownNode(node))?;
        Ok((comp, node))
    }

    /// Remove a node and every connection to its pins. Its resources are released here.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let comp_id = *self.node_owner.get(&id).ok_or(GraphError::UnknownNode(id))?;
        let comp = self
            .compositions
            .get_mut(&comp_id)
            .ok_or(GraphError::UnknownComposition(comp_id))?;
        let mut node = comp
            .nodes
            .shift_remove(&id)
            .ok_or(GraphError::UnknownNode(id))?;

        let removed: HashSet<PinId> = node.pins().map(|p| p.pin_id).collect();
        let mut cleared = 0usize;
        for other in comp.nodes.values_mut() {
            for pin in other.pins_mut() {
                if pin.connected_pin_id.is_some_and(|src| removed.contains(&src)) {
                    pin.connected_pin_id = None;
                    cleared += 1;
                }
            }
        }
        for pin in &removed {
            comp.clear_driver_pin(*pin);
            self.pin_owner.remove(pin);
        }
        self.node_owner.remove(&id);
        node.behavior.release_resources(&mut self.backend);
        debug!("deleted {id}, cleared {cleared} links");
        Ok(())
    }

    /// Give `attribute` an input pin so it can be connected. Returns the existing pin if
    /// it already has one.
    pub fn expose_attribute(&mut self, node: NodeId, attribute: &str) -> Result<PinId, GraphError> {
        let comp_id = *self
            .node_owner
            .get(&node)
            .ok_or(GraphError::UnknownNode(node))?;
        let target = self
            .compositions
            .get_mut(&comp_id)
            .and_then(|c| c.nodes.get_mut(&node))
            .ok_or(GraphError::UnknownNode(node))?;
        let pin = target.expose_attribute(&mut self.ids, attribute)?;
        self.pin_owner.insert(pin, node);
        Ok(pin)
    }

    // ----- links -----

    /// Link an output to an input; the pins may be given in either order. An input that
    /// is already connected is rewired. Returns the link id of the input.
    pub fn connect(&mut self, a: PinId, b: PinId) -> Result<LinkId, GraphError> {
        let pa = self.pin(a).ok_or(GraphError::UnknownPin(a))?;
        let pb = self.pin(b).ok_or(GraphError::UnknownPin(b))?;
        if pa.direction == pb.direction {
            return Err(GraphError::SameDirection(a, b));
        }
        let (output, input) = if pa.is_input() { (b, a) } else { (a, b) };
        if pa.flow != pb.flow {
            return Err(GraphError::FlowMismatch(output, input));
        }

        let (out_comp, out_node) = self.locate(output)?;
        let (in_comp, in_node) = self.locate(input)?;
        if out_comp != in_comp {
            return Err(GraphError::CrossComposition(output, input));
        }
        if out_node == in_node || self.depends_on(out_node, in_node) {
            return Err(GraphError::CycleDetected(output, input));
        }

        let pin = self.pin_mut(input).ok_or(GraphError::UnknownPin(input))?;
        if let Some(previous) = pin.connected_pin_id.replace(output) {
            debug!("{input} rewired from {previous} to {output}");
        } else {
            debug!("linked {output} -> {input}");
        }
        Ok(pin.link_id)
    }

    /// Whether `node` reads, directly or transitively, from `target`. Data and flow links
    /// both count.
    fn depends_on(&self, node: NodeId, target: NodeId) -> bool {
        let mut stack = vec![node];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(n) = self.node(current) else { continue };
            let upstream = n
                .flow_input
                .iter()
                .chain(&n.inputs)
                .filter_map(|p| p.connected_pin_id)
                .filter_map(|src| self.pin_owner.get(&src).copied());
            for source in upstream {
                if source == target {
                    return true;
                }
                stack.push(source);
            }
        }
        false
    }

    /// Clear an input's link, or every link and driver fed by an output. Returns how
    /// many links were removed.
    pub fn disconnect(&mut self, pin: PinId) -> Result<usize, GraphError> {
        let (comp_id, _) = self.locate(pin)?;
        let target = self.pin_mut(pin).ok_or(GraphError::UnknownPin(pin))?;
        if target.is_input() {
            let removed = usize::from(target.connected_pin_id.take().is_some());
            debug!("disconnected {pin}");
            return Ok(removed);
        }

        let comp = self
            .compositions
            .get_mut(&comp_id)
            .ok_or(GraphError::UnknownComposition(comp_id))?;
        let mut removed = 0;
        for node in comp.nodes.values_mut() {
            for input in node.pins_mut() {
                if input.connected_pin_id == Some(pin) {
                    input.connected_pin_id = None;
                    removed += 1;
                }
            }
        }
        comp.clear_driver_pin(pin);
        debug!("disconnected {removed} links from {pin}");
        Ok(removed)
    }

    /// Drive a composition attribute from a data output of one of its nodes, or clear
    /// the driver with `None`.
    pub fn set_composition_driver(
        &mut self,
        composition: CompositionId,
        attribute: &str,
        pin: Option<PinId>,
    ) -> Result<(), GraphError> {
        if let Some(pin) = pin {
            let (comp_id, _) = self.locate(pin)?;
            let p = self.pin(pin).ok_or(GraphError::UnknownPin(pin))?;
            if p.is_input() || p.flow || comp_id != composition {
                return Err(GraphError::NotADataOutput(pin));
            }
        }
        let comp = self
            .compositions
            .get_mut(&composition)
            .ok_or(GraphError::UnknownComposition(composition))?;
        let attr = comp
            .attribute_mut(attribute)
            .ok_or_else(|| GraphError::UnknownCompositionAttribute(attribute.to_string()))?;
        attr.set_driver_pin(pin.map(|p| p.0));
        Ok(())
    }

    /// Copy `nodes` into the same composition with fresh ids. Links between copied nodes
    /// are remapped to the copies; links from nodes outside the set are kept.
    pub fn duplicate_nodes(
        &mut self,
        composition: CompositionId,
        nodes: &[NodeId],
    ) -> Result<Vec<NodeId>, GraphError> {
        let comp = self
            .compositions
            .get(&composition)
            .ok_or(GraphError::UnknownComposition(composition))?;
        for id in nodes {
            if !comp.nodes.contains_key(id) {
                return Err(GraphError::UnknownNode(*id));
            }
        }

        let mut remap: HashMap<PinId, PinId> = HashMap::new();
        let mut links: Vec<(PinId, PinId)> = Vec::new();
        let mut created = Vec::with_capacity(nodes.len());
        for id in nodes {
            let copy = self.copy_node(composition, *id, &mut remap, &mut links)?;
            created.push(copy);
        }

        for (input, source) in links {
            let source = remap.get(&source).copied().unwrap_or(source);
            if let Some(pin) = self.pin_mut(input) {
                pin.connected_pin_id = Some(source);
            }
        }
        debug!("duplicated {} nodes in {composition}", created.len());
        Ok(created)
    }

    fn copy_node(
        &mut self,
        composition: CompositionId,
        source: NodeId,
        remap: &mut HashMap<PinId, PinId>,
        links: &mut Vec<(PinId, PinId)>,
    ) -> Result<NodeId, GraphError> {
        let src = self.node(source).ok_or(GraphError::UnknownNode(source))?;
        let behavior = self.registry.spawn(&src.library_name)?;
        let library_name = src.library_name.clone();
        let attributes = src.attributes.clone();
        let exposed: Vec<String> = src.inputs.iter().map(|p| p.linked_attribute.clone()).collect();
        let pins: Vec<GenericPin> = src.pins().cloned().collect();
        let (enabled, bypassed, header) = (src.enabled, src.bypassed, src.header_override.clone());
        let saved = src.behavior.save();

        let mut node = Node::spawn(&mut self.ids, &library_name, behavior);
        node.enabled = enabled;
        node.bypassed = bypassed;
        node.header_override = header;
        if let Some(data) = &saved {
            node.behavior.load(data);
        }
        for (name, attr) in attributes {
            node.attributes
                .insert(name, attr.with_id(self.ids.alloc_attribute()));
        }
        for name in &exposed {
            node.expose_attribute(&mut self.ids, name)?;
        }

        for pin in pins {
            let Some(copy) = node.pins().find(|p| {
                p.linked_attribute == pin.linked_attribute
                    && p.direction == pin.direction
                    && p.flow == pin.flow
            }) else {
                warn!("{source}: no counterpart for {} on copy", pin.pin_id);
                continue;
            };
            remap.insert(pin.pin_id, copy.pin_id);
            if let Some(src_pin) = pin.connected_pin_id {
                links.push((copy.pin_id, src_pin));
            }
        }

        let id = node.id;
        self.insert_node(composition, node);
        Ok(id)
    }
}

impl<B: ResourceBackend> Drop for Workspace<B> {
    fn drop(&mut self) {
        for comp in self.compositions.values_mut() {
            for node in comp.nodes.values_mut() {
                node.behavior.release_resources(&mut self.backend);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_constants() -> (Workspace, CompositionId, NodeId, NodeId) {
        let mut ws = Workspace::default();
        let comp = ws.add_composition("Main");
        let a = ws.add_node(comp, "raster.packaged.float_constant").unwrap();
        let b = ws.add_node(comp, "raster.packaged.add").unwrap();
        (ws, comp, a, b)
    }

    #[test]
    fn indices_track_added_nodes() {
        let (ws, comp, a, _) = two_constants();
        assert_eq!(ws.node_count(), 2);
        assert_eq!(ws.node_composition(a), Some(comp));
        let out = ws.node(a).unwrap().output_pin("Value").unwrap().pin_id;
        assert_eq!(ws.pin_node(out), Some(a));
    }

    #[test]
    fn connect_accepts_reversed_arguments() {
        let (mut ws, _, a, b) = two_constants();
        let out = ws.node(a).unwrap().output_pin("Value").unwrap().pin_id;
        let input = ws.node(b).unwrap().input_pin("A").unwrap().pin_id;
        ws.connect(input, out).unwrap();
        assert_eq!(ws.pin(input).unwrap().connected_pin_id, Some(out));
    }

    #[test]
    fn self_links_are_cycles() {
        let (mut ws, _, _, b) = two_constants();
        let node = ws.node(b).unwrap();
        let out = node.output_pin("Value").unwrap().pin_id;
        let input = node.input_pin("A").unwrap().pin_id;
        assert_eq!(
            ws.connect(out, input),
            Err(GraphError::CycleDetected(out, input))
        );
    }

    #[test]
    fn unknown_ids_are_errors() {
        let (mut ws, _, _, _) = two_constants();
        assert_eq!(ws.delete_node(NodeId(99)), Err(GraphError::UnknownNode(NodeId(99))));
        assert_eq!(ws.disconnect(PinId(99)), Err(GraphError::UnknownPin(PinId(99))));
        assert!(matches!(
            ws.add_node(CompositionId(42), "raster.packaged.add"),
            Err(GraphError::UnknownComposition(_))
        ));
    }
}
