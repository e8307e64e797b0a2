//! Flow control. These nodes run when a signal reaches their flow input (or, for
//! [`Begin`], once per frame) and steer execution by emitting signals.

use raster_api_core::ValueKind;

use super::single;
use crate::node::{ExecuteContext, FlowSignal, NodeBehavior, NodeOutputs, NodeSetup};

/// Flow root. Fires `Then` every frame.
#[derive(Debug, Default)]
pub struct Begin;

impl Begin {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for Begin {
    fn setup(&self, setup: &mut NodeSetup) {
        setup.flow_output("Then");
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        ctx.emit(FlowSignal::new("Then"));
        NodeOutputs::new()
    }

    fn is_pure(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct Branch;

impl Branch {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for Branch {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .flow_input()
            .attribute("Condition", false)
            .flow_output("True")
            .flow_output("False");
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        let taken = if ctx.get::<bool>("Condition").unwrap_or(false) {
            "True"
        } else {
            "False"
        };
        ctx.emit(FlowSignal::new(taken));
        NodeOutputs::new()
    }
}

/// Fires `Loop` `Count` times with `Index` set to the iteration, then `Completed`.
#[derive(Debug, Default)]
pub struct Repeat;

impl Repeat {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for Repeat {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .flow_input()
            .attribute("Count", 1i32)
            .output("Index", ValueKind::Int)
            .flow_output("Loop")
            .flow_output("Completed");
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        let budget = i32::try_from(ctx.config.max_flow_signals).unwrap_or(i32::MAX);
        let count = ctx.get::<i32>("Count").unwrap_or(0).clamp(0, budget);
        for index in 0..count {
            ctx.emit(FlowSignal::new("Loop").with("Index", index));
        }
        ctx.emit(FlowSignal::new("Completed"));
        NodeOutputs::new()
    }
}

/// Adds `Value` to a running total each time it is triggered. The total restarts every
/// frame.
#[derive(Debug, Default)]
pub struct Accumulate {
    total: f32,
}

impl Accumulate {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self::default())
    }
}

impl NodeBehavior for Accumulate {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .flow_input()
            .attribute("Value", 0.0f32)
            .output("Total", ValueKind::Float)
            .flow_output("Then");
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        self.total += ctx.get::<f32>("Value").unwrap_or(0.0);
        ctx.emit(FlowSignal::new("Then"));
        single("Total", self.total)
    }

    fn is_pure(&self) -> bool {
        false
    }

    fn frame_started(&mut self, _frame: f32) {
        self.total = 0.0;
    }
}
