use raster_api_core::ValueKind;

use super::single;
use crate::node::{ExecuteContext, NodeBehavior, NodeOutputs, NodeSetup};

fn binary_setup(setup: &mut NodeSetup) {
    setup
        .attribute("A", 0.0f32)
        .attribute("B", 0.0f32)
        .output("Value", ValueKind::Float);
}

fn binary(ctx: &ExecuteContext<'_>, op: fn(f32, f32) -> f32) -> NodeOutputs {
    match (ctx.get::<f32>("A"), ctx.get::<f32>("B")) {
        (Some(a), Some(b)) => single("Value", op(a, b)),
        _ => NodeOutputs::new(),
    }
}

#[derive(Debug, Default)]
pub struct Add;

impl Add {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for Add {
    fn setup(&self, setup: &mut NodeSetup) {
        binary_setup(setup);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        binary(ctx, |a, b| a + b)
    }
}

#[derive(Debug, Default)]
pub struct Multiply;

impl Multiply {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for Multiply {
    fn setup(&self, setup: &mut NodeSetup) {
        binary_setup(setup);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        binary(ctx, |a, b| a * b)
    }
}
