//! Built-in node packages.

pub mod constants;
pub mod flow;
pub mod math;
pub mod shapes;
pub mod utilities;

use raster_api_core::Value;

use crate::node::NodeOutputs;
use crate::registry::{
    NodeDescription, NodeFactory, CATEGORY_FLOW, CATEGORY_MATH, CATEGORY_RENDERING,
    CATEGORY_SAMPLER_CONSTANTS, CATEGORY_SHAPES, CATEGORY_UTILITIES, PACKAGE_PREFIX,
};

pub(crate) fn single(name: &str, value: impl Into<Value>) -> NodeOutputs {
    let mut out = NodeOutputs::new();
    out.insert(name.to_string(), value.into());
    out
}

fn packaged(name: &str, pretty: &str, category: &str) -> NodeDescription {
    NodeDescription::new(&format!("{PACKAGE_PREFIX}{name}"), pretty, category)
}

/// Description and factory of every built-in package.
pub fn builtins() -> Vec<(NodeDescription, NodeFactory)> {
    vec![
        (
            packaged("float_constant", "Float Constant", CATEGORY_UTILITIES),
            constants::FloatConstant::spawn as NodeFactory,
        ),
        (
            packaged("get_time", "Get Time", CATEGORY_UTILITIES),
            utilities::GetTime::spawn,
        ),
        (
            packaged("make_transform2d", "Make Transform2D", CATEGORY_UTILITIES),
            utilities::MakeTransform2D::spawn,
        ),
        (
            packaged("make_framebuffer", "Make Framebuffer", CATEGORY_RENDERING),
            utilities::MakeFramebuffer::spawn,
        ),
        (packaged("add", "Add", CATEGORY_MATH), math::Add::spawn),
        (
            packaged("multiply", "Multiply", CATEGORY_MATH),
            math::Multiply::spawn,
        ),
        (
            packaged("sdf_rounded_rect", "SDF Rounded Rect", CATEGORY_SHAPES),
            shapes::SdfRoundedRect::spawn,
        ),
        (
            packaged("sdf_circle", "SDF Circle", CATEGORY_SHAPES),
            shapes::SdfCircle::spawn,
        ),
        (
            packaged("sdf_annular", "SDF Annular", CATEGORY_SHAPES),
            shapes::SdfAnnular::spawn,
        ),
        (
            packaged(
                "repeat_sampler_wrapping_constant",
                "Repeat Sampler Wrapping",
                CATEGORY_SAMPLER_CONSTANTS,
            ),
            constants::SamplerConstant::repeat_wrapping,
        ),
        (
            packaged(
                "clamp_to_border_sampler_wrapping_constant",
                "Clamp To Border Sampler Wrapping",
                CATEGORY_SAMPLER_CONSTANTS,
            ),
            constants::SamplerConstant::clamp_to_border_wrapping,
        ),
        (
            packaged(
                "linear_sampler_filtering_constant",
                "Linear Sampler Filtering",
                CATEGORY_SAMPLER_CONSTANTS,
            ),
            constants::SamplerConstant::linear_filtering,
        ),
        (packaged("begin", "Begin", CATEGORY_FLOW), flow::Begin::spawn),
        (packaged("branch", "Branch", CATEGORY_FLOW), flow::Branch::spawn),
        (packaged("repeat", "Repeat", CATEGORY_FLOW), flow::Repeat::spawn),
        (
            packaged("accumulate", "Accumulate", CATEGORY_FLOW),
            flow::Accumulate::spawn,
        ),
    ]
}
