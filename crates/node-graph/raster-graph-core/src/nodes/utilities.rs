use log::warn;
use raster_api_core::{
    ResourceBackend, ResourceHandle, ResourceKind, ResourceParams, Transform2D, ValueKind,
};

use super::single;
use crate::node::{ExecuteContext, NodeBehavior, NodeOutputs, NodeSetup};

/// Current playback position. Not pure: its output changes with the frame alone.
#[derive(Debug, Default)]
pub struct GetTime;

impl GetTime {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for GetTime {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .output("Time", ValueKind::Float)
            .output("Frame", ValueKind::Float);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        let mut out = single("Time", ctx.time());
        out.insert("Frame".into(), ctx.frame.into());
        out
    }

    fn is_pure(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct MakeTransform2D;

impl MakeTransform2D {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for MakeTransform2D {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .attribute("Position", [0.0f32, 0.0])
            .attribute("Size", [1.0f32, 1.0])
            .attribute("Anchor", [0.0f32, 0.0])
            .attribute("Angle", 0.0f32)
            .attribute("ParentTransform", Transform2D::default())
            .output("Output", ValueKind::Transform2D);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        let (Some(position), Some(size), Some(anchor), Some(angle), Some(parent)) = (
            ctx.get::<[f32; 2]>("Position"),
            ctx.get::<[f32; 2]>("Size"),
            ctx.get::<[f32; 2]>("Anchor"),
            ctx.get::<f32>("Angle"),
            ctx.get::<Transform2D>("ParentTransform"),
        ) else {
            return NodeOutputs::new();
        };
        let mut transform = Transform2D::new(position, size, anchor, angle);
        if !parent.is_identity() {
            transform = transform.with_parent(parent);
        }
        single("Output", transform)
    }
}

/// Owns one framebuffer sized to the configured resolution.
#[derive(Debug)]
pub struct MakeFramebuffer {
    framebuffer: Option<ResourceHandle>,
    clear_color: [f32; 4],
}

impl MakeFramebuffer {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self {
            framebuffer: None,
            clear_color: [1.0; 4],
        })
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }
}

impl NodeBehavior for MakeFramebuffer {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .attribute("BackgroundColor", [1.0f32; 4])
            .output("Value", ValueKind::Resource);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        let Some(color) = ctx.get::<[f32; 4]>("BackgroundColor") else {
            return NodeOutputs::new();
        };
        self.clear_color = color;

        let [width, height] = ctx.config.resolution;
        let stale = self
            .framebuffer
            .as_ref()
            .is_some_and(|fb| fb.width != width || fb.height != height);
        if stale {
            if let Some(old) = self.framebuffer.take() {
                ctx.backend.release(old);
            }
        }
        if self.framebuffer.is_none() {
            match ctx
                .backend
                .acquire(ResourceKind::Framebuffer, ResourceParams { width, height })
            {
                Ok(handle) => self.framebuffer = Some(handle),
                Err(err) => {
                    warn!("make_framebuffer: {err}");
                    return NodeOutputs::new();
                }
            }
        }
        match &self.framebuffer {
            Some(fb) => single("Value", fb.clone()),
            None => NodeOutputs::new(),
        }
    }

    fn release_resources(&mut self, backend: &mut dyn ResourceBackend) {
        if let Some(fb) = self.framebuffer.take() {
            backend.release(fb);
        }
    }
}
