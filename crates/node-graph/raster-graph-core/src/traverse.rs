//! Per-frame traversal.
//!
//! For every active composition the traverser
//! 1. tells each node a new frame started,
//! 2. runs the flow roots and drains the signal queue depth-first,
//! 3. executes the remaining data nodes on demand (inputs first, memoized),
//! 4. resolves the composition attributes.
//!
//! Nodes with a flow input only ever run when a signal reaches them.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use log::{debug, trace, warn};
use raster_api_core::{ResourceBackend, Value};

use crate::composition::BlendMode;
use crate::config::TraverserConfig;
use crate::ids::{CompositionId, NodeId, PinId};
use crate::node::{FlowSignal, Node, RunEnv};
use crate::workspace::Workspace;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TraverserState {
    #[default]
    Idle,
    Resolving,
    Done,
}

/// Resolved state of one composition for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositionFrame {
    pub id: CompositionId,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub attributes: IndexMap<String, Value>,
}

#[derive(Clone, Debug, Default)]
pub struct FrameOutput {
    pub frame: f32,
    /// Every pin value produced this frame, inputs included.
    pub accumulator: HashMap<PinId, Value>,
    pub compositions: Vec<CompositionFrame>,
    /// Node executions this frame, cache hits included.
    pub executions: usize,
}

impl FrameOutput {
    pub fn value(&self, pin: PinId) -> Option<&Value> {
        self.accumulator.get(&pin)
    }

    pub fn composition(&self, id: CompositionId) -> Option<&CompositionFrame> {
        self.compositions.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Default)]
pub struct Traverser {
    config: TraverserConfig,
    state: TraverserState,
    config_changed: bool,
}

impl Traverser {
    pub fn new(config: TraverserConfig) -> Self {
        Self {
            config,
            state: TraverserState::Idle,
            config_changed: false,
        }
    }

    pub fn config(&self) -> &TraverserConfig {
        &self.config
    }

    /// Replace the configuration. Every node cache is dropped on the next traversal
    /// when anything changed.
    pub fn set_config(&mut self, config: TraverserConfig) {
        if config != self.config {
            self.config = config;
            self.config_changed = true;
        }
    }

    pub fn state(&self) -> TraverserState {
        self.state
    }

    /// Execute every active composition of `workspace` at `frame`.
    pub fn traverse<B: ResourceBackend>(
        &mut self,
        workspace: &mut Workspace<B>,
        frame: f32,
    ) -> FrameOutput {
        self.state = TraverserState::Resolving;
        if self.config_changed {
            for comp in workspace.compositions.values_mut() {
                for node in comp.nodes.values_mut() {
                    node.invalidate_cache();
                }
            }
            self.config_changed = false;
        }

        let mut out = FrameOutput {
            frame,
            ..FrameOutput::default()
        };
        let framerate = workspace.project.framerate;
        let mut signals_left = self.config.max_flow_signals;

        let active: Vec<CompositionId> = workspace
            .compositions
            .values()
            .filter(|c| c.is_active(frame))
            .map(|c| c.id())
            .collect();

        for id in active {
            let Some(comp) = workspace.compositions.get_mut(&id) else {
                continue;
            };
            let mut pass = FramePass::new(
                &mut comp.nodes,
                &workspace.pin_owner,
                &mut workspace.backend,
                &self.config,
                &mut out.accumulator,
                frame,
                framerate,
            );
            pass.begin_frame();
            signals_left = pass.run_flow(signals_left);
            pass.run_data();
            out.executions += pass.executions;

            let attributes = comp.evaluate_attributes(frame, &out.accumulator);
            out.compositions.push(CompositionFrame {
                id,
                opacity: comp.opacity_at(&attributes),
                blend_mode: comp.blend_mode,
                attributes,
            });
        }

        debug!(
            "frame {frame}: {} compositions, {} executions",
            out.compositions.len(),
            out.executions
        );
        self.state = TraverserState::Done;
        out
    }
}

/// State of one composition's traversal.
struct FramePass<'a> {
    nodes: &'a mut IndexMap<NodeId, Node>,
    pin_owner: &'a HashMap<PinId, NodeId>,
    backend: &'a mut dyn ResourceBackend,
    config: &'a TraverserConfig,
    accumulator: &'a mut HashMap<PinId, Value>,
    frame: f32,
    framerate: f32,
    /// Data consumers of each node.
    consumers: HashMap<NodeId, Vec<NodeId>>,
    executed: HashSet<NodeId>,
    visiting: HashSet<NodeId>,
    executions: usize,
}

impl<'a> FramePass<'a> {
    fn new(
        nodes: &'a mut IndexMap<NodeId, Node>,
        pin_owner: &'a HashMap<PinId, NodeId>,
        backend: &'a mut dyn ResourceBackend,
        config: &'a TraverserConfig,
        accumulator: &'a mut HashMap<PinId, Value>,
        frame: f32,
        framerate: f32,
    ) -> Self {
        let mut pass = Self {
            nodes,
            pin_owner,
            backend,
            config,
            accumulator,
            frame,
            framerate,
            consumers: HashMap::new(),
            executed: HashSet::new(),
            visiting: HashSet::new(),
            executions: 0,
        };
        let ids: Vec<NodeId> = pass.nodes.keys().copied().collect();
        for id in ids {
            for source in pass.data_sources(id) {
                pass.consumers.entry(source).or_default().push(id);
            }
        }
        pass
    }

    /// Nodes in this composition feeding `id` through data links.
    fn data_sources(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        node.inputs
            .iter()
            .filter_map(|p| p.connected_pin_id)
            .filter_map(|src| self.pin_owner.get(&src).copied())
            .filter(|src| self.nodes.contains_key(src))
            .collect()
    }

    fn begin_frame(&mut self) {
        for node in self.nodes.values_mut() {
            node.begin_frame(self.frame);
        }
    }

    /// Run one node now and publish its pin values.
    fn execute(&mut self, id: NodeId, flow_triggered: bool) -> Vec<FlowSignal> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Vec::new();
        };
        let execution = node.run(
            &*self.accumulator,
            RunEnv {
                frame: self.frame,
                framerate: self.framerate,
                config: self.config,
                backend: &mut *self.backend,
                pin_owner: self.pin_owner,
                flow_triggered,
            },
        );
        if node.enabled {
            self.executions += 1;
        }
        for pin in &node.inputs {
            if !execution.inputs.contains_key(&pin.pin_id) {
                self.accumulator.remove(&pin.pin_id);
            }
        }
        for pin in &node.outputs {
            if !execution.outputs.contains_key(&pin.pin_id) {
                self.accumulator.remove(&pin.pin_id);
            }
        }
        self.accumulator.extend(execution.inputs);
        self.accumulator.extend(execution.outputs);
        self.executed.insert(id);
        execution.signals
    }

    /// Execute `id` after everything it reads from. Flow-driven nodes are never run here;
    /// their last published values stand.
    fn demand(&mut self, id: NodeId) {
        if self.executed.contains(&id) || self.visiting.contains(&id) {
            return;
        }
        match self.nodes.get(&id) {
            Some(node) if !node.is_flow_driven() => {}
            _ => return,
        }
        self.visiting.insert(id);
        self.demand_inputs(id);
        self.visiting.remove(&id);
        self.execute(id, false);
    }

    fn demand_inputs(&mut self, id: NodeId) {
        for source in self.data_sources(id) {
            self.demand(source);
        }
    }

    /// Forget memoized results of everything reading from `id`, transitively.
    fn invalidate_downstream(&mut self, id: NodeId) {
        let mut stack: Vec<NodeId> = self.consumers.get(&id).cloned().unwrap_or_default();
        let mut seen = HashSet::new();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            self.executed.remove(&next);
            if let Some(more) = self.consumers.get(&next) {
                stack.extend(more.iter().copied());
            }
        }
    }

    fn run_data(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.demand(id);
        }
    }

    /// Run every flow root and drain the signals they cause. Returns the unused budget.
    fn run_flow(&mut self, mut budget: usize) -> usize {
        let roots: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| !n.is_flow_driven() && !n.flow_outputs.is_empty())
            .map(|n| n.id)
            .collect();

        let mut queue: VecDeque<(NodeId, FlowSignal)> = VecDeque::new();
        for root in roots {
            self.demand_inputs(root);
            let signals = self.execute(root, true);
            self.invalidate_downstream(root);
            push_front(&mut queue, root, signals);

            while let Some((emitter, signal)) = queue.pop_front() {
                if budget == 0 {
                    warn!(
                        "flow budget of {} signals exhausted at frame {}; {} pending dropped",
                        self.config.max_flow_signals,
                        self.frame,
                        queue.len() + 1
                    );
                    return 0;
                }
                budget -= 1;
                let emitted = self.deliver(emitter, signal);
                for (source, signals) in emitted.into_iter().rev() {
                    push_front(&mut queue, source, signals);
                }
            }
        }
        budget
    }

    /// Publish a signal's payload, then run every node listening on its flow output.
    fn deliver(
        &mut self,
        emitter: NodeId,
        signal: FlowSignal,
    ) -> Vec<(NodeId, Vec<FlowSignal>)> {
        let Some(node) = self.nodes.get(&emitter) else {
            return Vec::new();
        };
        let Some(flow_pin) = node.flow_output_pin(&signal.output).map(|p| p.pin_id) else {
            warn!("{emitter} emitted on unknown flow output '{}'", signal.output);
            return Vec::new();
        };
        for (name, value) in signal.payload {
            match node.output_pin(&name) {
                Some(pin) => {
                    self.accumulator.insert(pin.pin_id, value);
                }
                None => warn!("{emitter} signal payload names unknown output '{name}'"),
            }
        }
        trace!("{emitter} -> '{}'", signal.output);

        let targets: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| {
                n.flow_input
                    .as_ref()
                    .is_some_and(|p| p.connected_pin_id == Some(flow_pin))
            })
            .map(|n| n.id)
            .collect();

        self.invalidate_downstream(emitter);
        let mut emitted = Vec::with_capacity(targets.len());
        for target in targets {
            self.demand_inputs(target);
            let signals = self.execute(target, true);
            self.invalidate_downstream(target);
            emitted.push((target, signals));
        }
        emitted
    }
}

fn push_front(
    queue: &mut VecDeque<(NodeId, FlowSignal)>,
    source: NodeId,
    signals: Vec<FlowSignal>,
) {
    for signal in signals.into_iter().rev() {
        queue.push_front((source, signal));
    }
}
