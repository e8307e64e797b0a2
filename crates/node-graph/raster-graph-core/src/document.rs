//! Project documents: the persisted form of a [`Workspace`].
//!
//! Loading is tolerant where it can be (unknown packages are skipped, links to missing
//! pins are dropped, missing keys keep compiled-in defaults) and strict where the graph
//! would otherwise be ambiguous: duplicate ids and cyclic links abort the load.

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use log::{debug, warn};
use raster_animation_core::{Attribute, AttributeId};
use raster_api_core::{json::parse_value, ResourceBackend};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::composition::{BlendMode, Composition};
use crate::error::DocumentError;
use crate::ids::{CompositionId, IdAllocator, NodeId, PinId};
use crate::node::Node;
use crate::pin::GenericPin;
use crate::project::Project;
use crate::registry::NodeRegistry;
use crate::topo::{dependencies, topo_order};
use crate::workspace::Workspace;

fn yes() -> bool {
    true
}

fn one() -> f32 {
    1.0
}

fn default_end_frame() -> f32 {
    60.0
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectDocument {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default)]
    pub compositions: Vec<CompositionDocument>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompositionDocument {
    #[serde(rename = "ID")]
    pub id: CompositionId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub begin_frame: f32,
    #[serde(default = "default_end_frame")]
    pub end_frame: f32,
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(
        rename = "OpacityAttributeID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub opacity_attribute: Option<AttributeId>,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeDocument {
    #[serde(rename = "NodeID")]
    pub node_id: NodeId,
    pub library_name: String,
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub bypassed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Attribute name to either a full attribute document or a bare value that replaces
    /// the default.
    #[serde(default)]
    pub attributes: IndexMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_input: Option<GenericPin>,
    #[serde(default)]
    pub flow_outputs: Vec<GenericPin>,
    #[serde(default)]
    pub inputs: Vec<GenericPin>,
    #[serde(default)]
    pub outputs: Vec<GenericPin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl NodeDocument {
    fn pins(&self) -> impl Iterator<Item = &GenericPin> {
        self.flow_input
            .iter()
            .chain(&self.flow_outputs)
            .chain(&self.inputs)
            .chain(&self.outputs)
    }
}

/// What a load had to leave out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    /// Nodes whose package is not registered, with that package name.
    pub skipped_nodes: Vec<(NodeId, String)>,
    /// Inputs whose link pointed at a missing or incompatible pin.
    pub dropped_links: Vec<PinId>,
    /// Pins in the document with no counterpart on the spawned node.
    pub dropped_pins: Vec<PinId>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_nodes.is_empty()
            && self.dropped_links.is_empty()
            && self.dropped_pins.is_empty()
    }
}

fn check_unique_ids(doc: &ProjectDocument) -> Result<(), DocumentError> {
    let mut comps = HashSet::new();
    let mut nodes = HashSet::new();
    let mut pins = HashSet::new();
    for comp in &doc.compositions {
        if !comps.insert(comp.id) {
            return Err(DocumentError::DuplicateComposition(comp.id));
        }
        for node in &comp.nodes {
            if !nodes.insert(node.node_id) {
                return Err(DocumentError::DuplicateNode(node.node_id));
            }
            for pin in node.pins() {
                if !pins.insert(pin.pin_id) {
                    return Err(DocumentError::DuplicatePin(pin.pin_id));
                }
            }
        }
    }
    Ok(())
}

fn document_attribute(json: &JsonValue) -> Option<Result<Attribute, serde_json::Error>> {
    let is_document = json
        .as_object()
        .is_some_and(|o| o.contains_key("Default") && o.contains_key("Name"));
    is_document.then(|| serde_json::from_value(json.clone()))
}

/// Apply one document attribute entry. Anything unusable is logged and leaves the
/// compiled-in default in place.
fn apply_attribute(node: &mut Node, name: &str, json: &JsonValue) {
    let node_id = node.id;
    let Some(current) = node.attribute_mut(name) else {
        warn!("{node_id}: document sets unknown attribute '{name}'");
        return;
    };
    match document_attribute(json) {
        Some(Ok(loaded)) if loaded.kind() == current.kind() => {
            let id = if loaded.id().is_unassigned() {
                current.id()
            } else {
                loaded.id()
            };
            *current = loaded.with_id(id);
        }
        Some(Ok(loaded)) => warn!(
            "{node_id}: attribute '{name}' is {:?} in the document, expected {:?}",
            loaded.kind(),
            current.kind()
        ),
        Some(Err(err)) => warn!("{node_id}: attribute '{name}' keeps its default: {err}"),
        None => match parse_value(json.clone()) {
            Ok(value) => {
                if let Err(err) = current.set_default(value) {
                    warn!("{node_id}: {err}");
                }
            }
            Err(err) => warn!("{node_id}: attribute '{name}': {err}"),
        },
    }
}

/// Move document pin ids and links onto the freshly spawned pins.
fn adopt_pins(
    node: &mut Node,
    doc: &NodeDocument,
    ids: &mut IdAllocator,
    report: &mut LoadReport,
) {
    for pin in &doc.inputs {
        if node.input_pin(&pin.linked_attribute).is_none()
            && node.attribute(&pin.linked_attribute).is_some()
        {
            // exposed in the document only
            if let Err(err) = node.expose_attribute(ids, &pin.linked_attribute) {
                warn!("{}: {err}", doc.node_id);
            }
        }
    }
    for pin in doc.pins() {
        let target = node.pins_mut().find(|p| {
            p.linked_attribute == pin.linked_attribute
                && p.direction == pin.direction
                && p.flow == pin.flow
        });
        match target {
            Some(target) => {
                target.pin_id = pin.pin_id;
                target.link_id = pin.link_id;
                target.connected_pin_id = pin.connected_pin_id;
            }
            None => {
                warn!(
                    "{}: no pin '{}' on {}",
                    doc.node_id, pin.linked_attribute, doc.library_name
                );
                report.dropped_pins.push(pin.pin_id);
            }
        }
    }
}

impl<B: ResourceBackend> Workspace<B> {
    /// Build a workspace from a document. Unknown packages are skipped and reported;
    /// duplicate ids and cycles fail the whole load.
    pub fn from_document(
        doc: ProjectDocument,
        backend: B,
        registry: NodeRegistry,
    ) -> Result<(Self, LoadReport), DocumentError> {
        check_unique_ids(&doc)?;
        let mut ws = Workspace::with_registry(backend, registry);
        let mut report = LoadReport::default();
        ws.project = doc.project;

        // every id in the document first, so ids spawned below never collide with them
        for comp in &doc.compositions {
            ws.ids.observe_composition(comp.id);
            for attr in comp.attributes.iter().filter(|a| !a.id().is_unassigned()) {
                ws.ids.observe_attribute(attr.id());
            }
            for node in &comp.nodes {
                ws.ids.observe_node(node.node_id);
                for pin in node.pins() {
                    ws.ids.observe_pin(pin.pin_id);
                    ws.ids.observe_link(pin.link_id);
                }
                for json in node.attributes.values() {
                    let Some(raw) = json.get("ID").and_then(JsonValue::as_u64) else {
                        continue;
                    };
                    match u32::try_from(raw) {
                        Ok(id) if id != AttributeId::UNASSIGNED.0 => {
                            ws.ids.observe_attribute(AttributeId(id))
                        }
                        _ => warn!("{}: attribute id {raw} is out of range", node.node_id),
                    }
                }
            }
        }

        for comp_doc in doc.compositions {
            let mut comp = Composition::new(comp_doc.id, comp_doc.name);
            comp.description = comp_doc.description;
            comp.begin_frame = comp_doc.begin_frame;
            comp.end_frame = comp_doc.end_frame;
            comp.enabled = comp_doc.enabled;
            comp.opacity = comp_doc.opacity;
            comp.opacity_attribute = comp_doc.opacity_attribute;
            comp.blend_mode = comp_doc.blend_mode;
            for attr in comp_doc.attributes {
                let attr = if attr.id().is_unassigned() {
                    let id = ws.ids.alloc_attribute();
                    attr.with_id(id)
                } else {
                    attr
                };
                comp.insert_attribute(attr);
            }
            let comp_id = comp.id;
            ws.compositions.insert(comp_id, comp);

            for node_doc in comp_doc.nodes {
                let behavior = match ws.registry.spawn(&node_doc.library_name) {
                    Ok(b) => b,
                    Err(err) => {
                        warn!("skipping {}: {err}", node_doc.node_id);
                        report
                            .skipped_nodes
                            .push((node_doc.node_id, node_doc.library_name));
                        continue;
                    }
                };
                let mut node = Node::spawn(&mut ws.ids, &node_doc.library_name, behavior);
                node.id = node_doc.node_id;
                node.enabled = node_doc.enabled;
                node.bypassed = node_doc.bypassed;
                node.header_override = node_doc.header.clone();
                for (name, json) in &node_doc.attributes {
                    apply_attribute(&mut node, name, json);
                }
                adopt_pins(&mut node, &node_doc, &mut ws.ids, &mut report);
                if let Some(data) = &node_doc.data {
                    node.behavior.load(data);
                }
                ws.insert_node(comp_id, node);
            }
        }

        ws.drop_invalid_links(&mut report);

        for comp in ws.compositions.values() {
            let deps = dependencies(comp, &ws.pin_owner);
            if topo_order(&deps).is_err() {
                return Err(DocumentError::Cycle(comp.id()));
            }
        }

        debug!(
            "loaded '{}': {} compositions, {} nodes, {} skipped",
            ws.project.name,
            ws.compositions.len(),
            ws.node_owner.len(),
            report.skipped_nodes.len()
        );
        Ok((ws, report))
    }

    pub fn from_json_str(
        s: &str,
        backend: B,
        registry: NodeRegistry,
    ) -> Result<(Self, LoadReport), DocumentError> {
        let doc: ProjectDocument = serde_json::from_str(s)?;
        Self::from_document(doc, backend, registry)
    }

    /// Clear every link that does not end at a known output of the same kind in the same
    /// composition, and every composition driver that is not a known data output.
    fn drop_invalid_links(&mut self, report: &mut LoadReport) {
        let outputs: HashMap<PinId, (NodeId, bool)> = self
            .compositions
            .values()
            .flat_map(|c| c.nodes())
            .flat_map(|n| {
                n.outputs
                    .iter()
                    .chain(&n.flow_outputs)
                    .map(move |p| (p.pin_id, (n.id, p.flow)))
            })
            .collect();

        for comp in self.compositions.values_mut() {
            let comp_id = comp.id;
            for node in comp.nodes.values_mut() {
                for pin in node.pins_mut().filter(|p| p.is_input()) {
                    let Some(source) = pin.connected_pin_id else { continue };
                    let valid = outputs.get(&source).is_some_and(|(owner, flow)| {
                        *flow == pin.flow && self.node_owner.get(owner) == Some(&comp_id)
                    });
                    if !valid {
                        debug!("dropping link {source} -> {}", pin.pin_id);
                        pin.connected_pin_id = None;
                        report.dropped_links.push(pin.pin_id);
                    }
                }
            }
            let stale: Vec<PinId> = comp
                .attributes
                .values()
                .filter_map(|a| a.driver_pin().map(PinId))
                .filter(|p| !outputs.get(p).is_some_and(|(_, flow)| !flow))
                .collect();
            for pin in stale {
                comp.clear_driver_pin(pin);
            }
        }
    }

    pub fn to_document(&self) -> Result<ProjectDocument, DocumentError> {
        let mut compositions = Vec::with_capacity(self.compositions.len());
        for comp in self.compositions.values() {
            let mut nodes = Vec::with_capacity(comp.nodes.len());
            for node in comp.nodes() {
                let mut attributes = IndexMap::new();
                for (name, attr) in node.attributes() {
                    attributes.insert(name.clone(), serde_json::to_value(attr)?);
                }
                nodes.push(NodeDocument {
                    node_id: node.id,
                    library_name: node.library_name.clone(),
                    enabled: node.enabled,
                    bypassed: node.bypassed,
                    header: node.header_override.clone(),
                    attributes,
                    flow_input: node.flow_input.clone(),
                    flow_outputs: node.flow_outputs.clone(),
                    inputs: node.inputs.clone(),
                    outputs: node.outputs.clone(),
                    data: node.behavior.save(),
                });
            }
            compositions.push(CompositionDocument {
                id: comp.id,
                name: comp.name.clone(),
                description: comp.description.clone(),
                begin_frame: comp.begin_frame,
                end_frame: comp.end_frame,
                enabled: comp.enabled,
                opacity: comp.opacity,
                opacity_attribute: comp.opacity_attribute,
                blend_mode: comp.blend_mode,
                attributes: comp.attributes.values().cloned().collect(),
                nodes,
            });
        }
        Ok(ProjectDocument {
            project: self.project.clone(),
            compositions,
        })
    }

    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&self.to_document()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::builtin_registry;
    use raster_api_core::{HeadlessBackend, Value};

    fn load(json: &str) -> Result<(Workspace, LoadReport), DocumentError> {
        Workspace::from_json_str(json, HeadlessBackend::new(), builtin_registry())
    }

    #[test]
    fn bare_attribute_values_replace_defaults() {
        let (ws, report) = load(
            r#"{
                "Name": "Doc",
                "Compositions": [{
                    "ID": 3,
                    "Nodes": [{
                        "NodeID": 10,
                        "LibraryName": "raster.packaged.sdf_rounded_rect",
                        "Attributes": { "Rounding": 0.25 }
                    }]
                }]
            }"#,
        )
        .unwrap();
        assert!(report.is_clean());
        let node = ws.node(NodeId(10)).unwrap();
        assert_eq!(
            node.attribute("Rounding").unwrap().default_value(),
            &Value::Float(0.25)
        );
        assert_eq!(ws.composition(CompositionId(3)).unwrap().end_frame, 60.0);
    }

    #[test]
    fn spawned_ids_stay_clear_of_loaded_ones() {
        let (mut ws, _) = load(
            r#"{
                "Compositions": [{
                    "ID": 0,
                    "Nodes": [{
                        "NodeID": 40,
                        "LibraryName": "raster.packaged.float_constant",
                        "Outputs": [{ "PinID": 90, "LinkID": 90, "LinkedAttribute": "Value", "Type": "Output", "Kind": "float" }]
                    }]
                }]
            }"#,
        )
        .unwrap();
        let fresh = ws.add_node(CompositionId(0), "raster.packaged.add").unwrap();
        assert!(fresh.0 > 40);
        let node = ws.node(fresh).unwrap();
        assert!(node.pins().all(|p| p.pin_id.0 > 90));
    }

    #[test]
    fn duplicate_composition_ids_fail() {
        let err = load(r#"{ "Compositions": [{ "ID": 1 }, { "ID": 1 }] }"#).unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateComposition(CompositionId(1))));
    }
}
