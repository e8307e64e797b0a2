use raster_api_core::{SamplerSettings, TextureFiltering, TextureWrapping, ValueKind};

use super::single;
use crate::node::{ExecuteContext, NodeBehavior, NodeOutputs, NodeSetup};

#[derive(Debug, Default)]
pub struct FloatConstant;

impl FloatConstant {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for FloatConstant {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .attribute("Value", 0.0f32)
            .output("Value", ValueKind::Float);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        match ctx.get::<f32>("Value") {
            Some(v) => single("Value", v),
            None => NodeOutputs::new(),
        }
    }
}

/// Emits a fixed [`SamplerSettings`] that sets a single sampling mode.
#[derive(Debug)]
pub struct SamplerConstant {
    settings: SamplerSettings,
}

impl SamplerConstant {
    pub fn repeat_wrapping() -> Box<dyn NodeBehavior> {
        Box::new(Self {
            settings: SamplerSettings::wrapping(TextureWrapping::Repeat),
        })
    }

    pub fn clamp_to_border_wrapping() -> Box<dyn NodeBehavior> {
        Box::new(Self {
            settings: SamplerSettings::wrapping(TextureWrapping::ClampToBorder),
        })
    }

    pub fn linear_filtering() -> Box<dyn NodeBehavior> {
        Box::new(Self {
            settings: SamplerSettings::filtering(TextureFiltering::Linear),
        })
    }
}

impl NodeBehavior for SamplerConstant {
    fn setup(&self, setup: &mut NodeSetup) {
        setup.output("Sampler", ValueKind::Sampler);
    }

    fn execute(&mut self, _ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        single("Sampler", self.settings)
    }
}
