//! Signed distance field shape sources.

use raster_api_core::{SdfShape, ShapeUniform, Value, ValueKind};

use super::single;
use crate::node::{ExecuteContext, NodeBehavior, NodeOutputs, NodeSetup};

fn float_shape(
    ctx: &ExecuteContext<'_>,
    attribute: &str,
    function: &str,
    uniform: &str,
) -> NodeOutputs {
    match ctx.get::<f32>(attribute) {
        Some(v) => single(
            "Shape",
            SdfShape::new(
                function,
                vec![ShapeUniform::new("float", uniform, Value::Float(v))],
            ),
        ),
        None => NodeOutputs::new(),
    }
}

#[derive(Debug, Default)]
pub struct SdfRoundedRect;

impl SdfRoundedRect {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for SdfRoundedRect {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .attribute("Rounding", 0.5f32)
            .output("Shape", ValueKind::Shape);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        float_shape(ctx, "Rounding", "fSDFRoundedRect", "uSDFRoundedRectRadius")
    }
}

#[derive(Debug, Default)]
pub struct SdfCircle;

impl SdfCircle {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for SdfCircle {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .attribute("Radius", 0.5f32)
            .output("Shape", ValueKind::Shape);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        float_shape(ctx, "Radius", "fSDFCircle", "uSDFCircleRadius")
    }
}

/// Hollows out the shape on `A`. Its uniforms gain an `Annular` suffix and `Intensity`
/// sets the ring width.
#[derive(Debug, Default)]
pub struct SdfAnnular;

impl SdfAnnular {
    pub fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

const ANNULAR_SUFFIX: &str = "Annular";

impl NodeBehavior for SdfAnnular {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .attribute("A", SdfShape::default())
            .attribute("Intensity", 0.5f32)
            .output("Shape", ValueKind::Shape);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        let (Some(shape), Some(intensity)) =
            (ctx.get::<SdfShape>("A"), ctx.get::<f32>("Intensity"))
        else {
            return NodeOutputs::new();
        };
        if shape.is_empty() {
            return NodeOutputs::new();
        }
        let mut uniforms: Vec<ShapeUniform> = shape
            .uniforms
            .into_iter()
            .map(|u| ShapeUniform {
                name: format!("{}{ANNULAR_SUFFIX}", u.name),
                ..u
            })
            .collect();
        uniforms.push(ShapeUniform::new(
            "float",
            "uSDFAnnularIntensity",
            Value::Float(intensity * 0.04),
        ));
        single("Shape", SdfShape::new("fSDFAnnular", uniforms))
    }
}
