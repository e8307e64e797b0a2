//! Nodes and the execution contract behaviors implement.
//!
//! A [`Node`] owns its pins and attribute table; the per-package logic lives behind
//! [`NodeBehavior`]. Execution resolves every attribute (the connected pin's value, or the
//! local attribute when unconnected; a connected source with nothing to give leaves the
//! attribute absent), then either replays cached outputs, passes inputs through when
//! bypassed, or calls the behavior.

use std::fmt;

use hashbrown::HashMap;
use indexmap::IndexMap;
use log::{trace, warn};
use raster_animation_core::Attribute;
use raster_api_core::{FromValue, ResourceBackend, Value, ValueKind};

use crate::config::TraverserConfig;
use crate::error::GraphError;
use crate::ids::{IdAllocator, NodeId, PinId};
use crate::pin::{GenericPin, PinDirection};

/// Resolved values keyed by pin id.
pub type PinValueMap = IndexMap<PinId, Value>;

/// Values a behavior produces, keyed by output name.
pub type NodeOutputs = IndexMap<String, Value>;

/// Name given to a node's flow input pin.
pub const FLOW_INPUT: &str = "Flow";

/// Control message emitted on a flow output. `payload` entries are written to the
/// emitter's data outputs of the same name when the signal is delivered.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowSignal {
    pub output: String,
    pub payload: Vec<(String, Value)>,
}

impl FlowSignal {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            payload: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone, Debug)]
struct AttributeDecl {
    name: String,
    default: Value,
    exposed: bool,
}

/// Declarations a behavior makes when its node is spawned.
#[derive(Clone, Debug, Default)]
pub struct NodeSetup {
    attributes: Vec<AttributeDecl>,
    outputs: Vec<(String, ValueKind)>,
    flow_input: bool,
    flow_outputs: Vec<String>,
}

impl NodeSetup {
    /// Attribute with a connectable input pin.
    pub fn attribute(&mut self, name: &str, default: impl Into<Value>) -> &mut Self {
        self.attributes.push(AttributeDecl {
            name: name.to_string(),
            default: default.into(),
            exposed: true,
        });
        self
    }

    /// Attribute without a pin. It can be exposed later.
    pub fn internal_attribute(&mut self, name: &str, default: impl Into<Value>) -> &mut Self {
        self.attributes.push(AttributeDecl {
            name: name.to_string(),
            default: default.into(),
            exposed: false,
        });
        self
    }

    pub fn output(&mut self, name: &str, kind: ValueKind) -> &mut Self {
        self.outputs.push((name.to_string(), kind));
        self
    }

    pub fn flow_input(&mut self) -> &mut Self {
        self.flow_input = true;
        self
    }

    pub fn flow_output(&mut self, name: &str) -> &mut Self {
        self.flow_outputs.push(name.to_string());
        self
    }
}

/// What a behavior sees while executing.
pub struct ExecuteContext<'a> {
    pub frame: f32,
    pub framerate: f32,
    pub config: &'a TraverserConfig,
    pub backend: &'a mut dyn ResourceBackend,
    inputs: &'a IndexMap<String, Value>,
    flow_triggered: bool,
    signals: Vec<FlowSignal>,
}

impl<'a> ExecuteContext<'a> {
    pub fn new(
        frame: f32,
        framerate: f32,
        config: &'a TraverserConfig,
        backend: &'a mut dyn ResourceBackend,
        inputs: &'a IndexMap<String, Value>,
        flow_triggered: bool,
    ) -> Self {
        Self {
            frame,
            framerate,
            config,
            backend,
            inputs,
            flow_triggered,
            signals: Vec::new(),
        }
    }

    /// Resolved value of an attribute, connected or local.
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    /// Typed read of a resolved attribute. A missing value or a kind mismatch is absence.
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        let value = self.inputs.get(name)?;
        match value.get::<T>() {
            Ok(v) => Some(v),
            Err(err) => {
                trace!("input '{name}': {err}");
                None
            }
        }
    }

    /// Seconds elapsed at the current frame.
    pub fn time(&self) -> f32 {
        if self.framerate > 0.0 {
            self.frame / self.framerate
        } else {
            0.0
        }
    }

    /// Whether this execution was caused by a flow signal.
    pub fn is_flow_triggered(&self) -> bool {
        self.flow_triggered
    }

    pub fn emit(&mut self, signal: FlowSignal) {
        self.signals.push(signal);
    }

    pub fn into_signals(self) -> Vec<FlowSignal> {
        self.signals
    }
}

/// Per-package node logic.
pub trait NodeBehavior: fmt::Debug + Send {
    /// Declare attributes and pins. Called once when the node is spawned.
    fn setup(&self, setup: &mut NodeSetup);

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs;

    /// Pure nodes produce the same outputs for the same resolved inputs and are skipped
    /// when nothing changed since their last run.
    fn is_pure(&self) -> bool {
        true
    }

    /// Called once per traversal before anything executes.
    fn frame_started(&mut self, _frame: f32) {}

    /// Extra state persisted next to the attributes.
    fn save(&self) -> Option<serde_json::Value> {
        None
    }

    fn load(&mut self, _data: &serde_json::Value) {}

    /// Give back every handle this behavior acquired. Called exactly once, on removal.
    fn release_resources(&mut self, _backend: &mut dyn ResourceBackend) {}
}

/// Result of one [`Node::run`].
#[derive(Debug, Default)]
pub(crate) struct Execution {
    /// Resolved values of the node's data input pins.
    pub inputs: PinValueMap,
    pub outputs: PinValueMap,
    pub signals: Vec<FlowSignal>,
}

pub(crate) struct RunEnv<'a> {
    pub frame: f32,
    pub framerate: f32,
    pub config: &'a TraverserConfig,
    pub backend: &'a mut dyn ResourceBackend,
    /// Owner of every live pin, used to tell dangling links from live ones.
    pub pin_owner: &'a HashMap<PinId, NodeId>,
    pub flow_triggered: bool,
}

pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) library_name: String,
    pub enabled: bool,
    pub bypassed: bool,
    /// Title shown instead of the package's pretty name.
    pub header_override: Option<String>,
    pub(crate) flow_input: Option<GenericPin>,
    pub(crate) flow_outputs: Vec<GenericPin>,
    pub(crate) inputs: Vec<GenericPin>,
    pub(crate) outputs: Vec<GenericPin>,
    pub(crate) attributes: IndexMap<String, Attribute>,
    resolved: IndexMap<String, Value>,
    last_outputs: Option<PinValueMap>,
    executions: u32,
    behavior_runs: u64,
    cache_hits: u64,
    pub(crate) behavior: Box<dyn NodeBehavior>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("library_name", &self.library_name)
            .field("enabled", &self.enabled)
            .field("bypassed", &self.bypassed)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

impl Node {
    /// Build a node around `behavior`, allocating every id it needs.
    pub fn spawn(
        ids: &mut IdAllocator,
        library_name: &str,
        behavior: Box<dyn NodeBehavior>,
    ) -> Self {
        let mut setup = NodeSetup::default();
        behavior.setup(&mut setup);

        let id = ids.alloc_node();
        let mut attributes = IndexMap::new();
        let mut inputs = Vec::new();
        for decl in setup.attributes {
            if decl.exposed {
                inputs.push(GenericPin::new(
                    ids.alloc_pin(),
                    ids.alloc_link(),
                    decl.name.clone(),
                    PinDirection::Input,
                    false,
                ));
            }
            let attribute = Attribute::new(ids.alloc_attribute(), decl.name.clone(), decl.default);
            attributes.insert(decl.name, attribute);
        }

        let outputs = setup
            .outputs
            .into_iter()
            .map(|(name, kind)| {
                GenericPin::new(
                    ids.alloc_pin(),
                    ids.alloc_link(),
                    name,
                    PinDirection::Output,
                    false,
                )
                .with_kind(kind)
            })
            .collect();

        let flow_input = setup.flow_input.then(|| {
            GenericPin::new(
                ids.alloc_pin(),
                ids.alloc_link(),
                FLOW_INPUT,
                PinDirection::Input,
                true,
            )
        });
        let flow_outputs = setup
            .flow_outputs
            .into_iter()
            .map(|name| {
                GenericPin::new(
                    ids.alloc_pin(),
                    ids.alloc_link(),
                    name,
                    PinDirection::Output,
                    true,
                )
            })
            .collect();

        Self {
            id,
            library_name: library_name.to_string(),
            enabled: true,
            bypassed: false,
            header_override: None,
            flow_input,
            flow_outputs,
            inputs,
            outputs,
            attributes,
            resolved: IndexMap::new(),
            last_outputs: None,
            executions: 0,
            behavior_runs: 0,
            cache_hits: 0,
            behavior,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    pub fn inputs(&self) -> &[GenericPin] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[GenericPin] {
        &self.outputs
    }

    pub fn flow_input(&self) -> Option<&GenericPin> {
        self.flow_input.as_ref()
    }

    pub fn flow_outputs(&self) -> &[GenericPin] {
        &self.flow_outputs
    }

    /// Nodes with a flow input only run when a flow signal reaches them.
    pub fn is_flow_driven(&self) -> bool {
        self.flow_input.is_some()
    }

    pub fn pins(&self) -> impl Iterator<Item = &GenericPin> {
        self.flow_input
            .iter()
            .chain(&self.flow_outputs)
            .chain(&self.inputs)
            .chain(&self.outputs)
    }

    pub(crate) fn pins_mut(&mut self) -> impl Iterator<Item = &mut GenericPin> {
        self.flow_input
            .iter_mut()
            .chain(self.flow_outputs.iter_mut())
            .chain(self.inputs.iter_mut())
            .chain(self.outputs.iter_mut())
    }

    pub fn pin(&self, id: PinId) -> Option<&GenericPin> {
        self.pins().find(|p| p.pin_id == id)
    }

    pub(crate) fn pin_mut(&mut self, id: PinId) -> Option<&mut GenericPin> {
        self.pins_mut().find(|p| p.pin_id == id)
    }

    pub fn input_pin(&self, attribute: &str) -> Option<&GenericPin> {
        self.inputs.iter().find(|p| p.linked_attribute == attribute)
    }

    pub fn output_pin(&self, name: &str) -> Option<&GenericPin> {
        self.outputs.iter().find(|p| p.linked_attribute == name)
    }

    pub fn flow_output_pin(&self, name: &str) -> Option<&GenericPin> {
        self.flow_outputs.iter().find(|p| p.linked_attribute == name)
    }

    pub fn attributes(&self) -> &IndexMap<String, Attribute> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    /// Value the attribute resolved to during the last execution.
    pub fn resolved_attribute(&self, name: &str) -> Option<&Value> {
        self.resolved.get(name)
    }

    /// Executions during the current frame.
    pub fn executions(&self) -> u32 {
        self.executions
    }

    /// Times the behavior itself was called, over the node's lifetime.
    pub fn behavior_runs(&self) -> u64 {
        self.behavior_runs
    }

    /// Executions answered from the output cache, over the node's lifetime.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }

    pub(crate) fn expose_attribute(
        &mut self,
        ids: &mut IdAllocator,
        name: &str,
    ) -> Result<PinId, GraphError> {
        if let Some(pin) = self.input_pin(name) {
            return Ok(pin.pin_id);
        }
        if !self.attributes.contains_key(name) {
            return Err(GraphError::UnknownAttribute {
                node: self.id,
                name: name.to_string(),
            });
        }
        let pin = GenericPin::new(
            ids.alloc_pin(),
            ids.alloc_link(),
            name,
            PinDirection::Input,
            false,
        );
        let id = pin.pin_id;
        self.inputs.push(pin);
        Ok(id)
    }

    pub(crate) fn begin_frame(&mut self, frame: f32) {
        self.executions = 0;
        self.behavior.frame_started(frame);
    }

    pub(crate) fn invalidate_cache(&mut self) {
        self.last_outputs = None;
    }

    /// Resolve every attribute. A connected input takes its source pin's value and is
    /// absent when the source produced nothing usable this frame (no value, wrong kind,
    /// upload still pending). Unconnected inputs, and links whose source pin no longer
    /// exists, read the local attribute at `frame`.
    pub(crate) fn resolve_inputs(
        &self,
        frame: f32,
        accumulator: &HashMap<PinId, Value>,
        pin_owner: &HashMap<PinId, NodeId>,
    ) -> IndexMap<String, Value> {
        self.attributes
            .iter()
            .filter_map(|(name, attribute)| {
                let source = self
                    .input_pin(name)
                    .and_then(|pin| pin.connected_pin_id)
                    .filter(|source| pin_owner.contains_key(source));
                let value = match source {
                    Some(source) => accumulator
                        .get(&source)
                        .cloned()
                        .and_then(Value::resolve_pending)
                        .filter(|value| value.kind() == attribute.kind())?,
                    None => attribute.evaluate(frame),
                };
                Some((name.clone(), value))
            })
            .collect()
    }

    pub(crate) fn run(
        &mut self,
        accumulator: &HashMap<PinId, Value>,
        env: RunEnv<'_>,
    ) -> Execution {
        if !self.enabled {
            trace!("{} disabled, skipping", self.id);
            return Execution::default();
        }
        self.executions += 1;

        let values = self.resolve_inputs(env.frame, accumulator, env.pin_owner);
        let inputs: PinValueMap = self
            .inputs
            .iter()
            .filter_map(|pin| {
                values
                    .get(&pin.linked_attribute)
                    .map(|v| (pin.pin_id, v.clone()))
            })
            .collect();

        if self.bypassed {
            let outputs = self.bypass_outputs(&values);
            let signals = match (env.flow_triggered, self.flow_outputs.first()) {
                (true, Some(pin)) => vec![FlowSignal::new(pin.linked_attribute.clone())],
                _ => Vec::new(),
            };
            self.resolved = values;
            self.last_outputs = None;
            return Execution {
                inputs,
                outputs,
                signals,
            };
        }

        if !env.flow_triggered && self.behavior.is_pure() && self.resolved == values {
            if let Some(outputs) = &self.last_outputs {
                trace!("{} cache hit", self.id);
                self.cache_hits += 1;
                return Execution {
                    inputs,
                    outputs: outputs.clone(),
                    signals: Vec::new(),
                };
            }
        }

        trace!("{} executing {}", self.id, self.library_name);
        let (named, signals) = {
            let mut ctx = ExecuteContext::new(
                env.frame,
                env.framerate,
                env.config,
                env.backend,
                &values,
                env.flow_triggered,
            );
            let named = self.behavior.execute(&mut ctx);
            (named, ctx.into_signals())
        };
        self.behavior_runs += 1;

        let outputs = self.map_outputs(named);
        self.resolved = values;
        self.last_outputs = Some(outputs.clone());
        Execution {
            inputs,
            outputs,
            signals,
        }
    }

    fn map_outputs(&self, named: NodeOutputs) -> PinValueMap {
        let mut outputs = PinValueMap::new();
        for (name, value) in named {
            let Some(pin) = self.output_pin(&name) else {
                warn!("{} produced unknown output '{name}'", self.id);
                continue;
            };
            let accepted = match pin.kind {
                None => true,
                Some(ValueKind::Resource) => {
                    matches!(value.kind(), ValueKind::Resource | ValueKind::Pending)
                }
                Some(kind) => value.kind() == kind,
            };
            if accepted {
                outputs.insert(pin.pin_id, value);
            } else {
                warn!(
                    "{} output '{name}' declared {:?}, got {:?}",
                    self.id,
                    pin.kind,
                    value.kind()
                );
            }
        }
        outputs
    }

    /// Each output takes the first input (declaration order) whose resolved value has the
    /// output's declared kind.
    fn bypass_outputs(&self, values: &IndexMap<String, Value>) -> PinValueMap {
        let mut outputs = PinValueMap::new();
        for out in &self.outputs {
            let Some(kind) = out.kind else { continue };
            let passed = self
                .inputs
                .iter()
                .filter_map(|pin| values.get(&pin.linked_attribute))
                .find(|value| value.kind() == kind);
            if let Some(value) = passed {
                outputs.insert(out.pin_id, value.clone());
            }
        }
        outputs
    }
}
