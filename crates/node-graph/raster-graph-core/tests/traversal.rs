mod common;

use common::*;
use raster_graph_core::{
    builtin_registry, BlendMode, ExecuteContext, NodeBehavior, NodeDescription, NodeOutputs,
    NodeSetup, Traverser, TraverserConfig, Value, ValueKind, Workspace,
};
use once_cell::sync::Lazy;
use raster_animation_core::{Attribute, AttributeId};
use raster_api_core::{
    HeadlessBackend, ResourceHandle, ResourceKind, SamplerSettings, SdfShape, TextureFiltering,
    TextureWrapping, Transform2D, UploadTicket,
};

#[test]
fn keyframed_constant_interpolates() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let a = constant(&mut ws, comp, 0.0);
    {
        let attr = ws
            .node_mut(a)
            .and_then(|n| n.attribute_mut("Value"))
            .expect("attribute");
        attr.add_keyframe(0.0, 0.0f32).expect("key 0");
        attr.add_keyframe(10.0, 100.0f32).expect("key 10");
    }
    let out = Traverser::default().traverse(&mut ws, 5.0);
    assert_eq!(out.value(output(&ws, a, "Value")), Some(&Value::Float(50.0)));
}

#[test]
fn same_frame_twice_reuses_outputs_and_resources() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let fb = ws
        .add_node(comp, "raster.packaged.make_framebuffer")
        .expect("spawn framebuffer");
    let fb_out = output(&ws, fb, "Value");

    let mut traverser = Traverser::default();
    let first = traverser.traverse(&mut ws, 3.0);
    let second = traverser.traverse(&mut ws, 3.0);
    assert_eq!(first.value(fb_out), second.value(fb_out));
    assert_eq!(ws.backend().acquired(), 1);
    let node = ws.node(fb).expect("node");
    assert_eq!(node.behavior_runs(), 1);
    assert_eq!(node.cache_hits(), 1);
    assert_eq!(node.executions(), 1);

    let mut config = TraverserConfig::default();
    config.resolution = [640, 360];
    traverser.set_config(config);
    let resized = traverser.traverse(&mut ws, 3.0);
    assert_eq!(ws.backend().acquired(), 2);
    assert_eq!(ws.backend().released(), 1);
    let handle = resized
        .value(fb_out)
        .and_then(|v| v.get::<ResourceHandle>().ok())
        .expect("framebuffer handle");
    assert_eq!((handle.width, handle.height), (640, 360));

    ws.delete_node(fb).expect("delete");
    assert_eq!(ws.backend().released(), 2);
    assert_eq!(ws.backend().live_count(), 0);
}

#[test]
fn removing_a_composition_releases_its_nodes() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    ws.add_node(comp, "raster.packaged.make_framebuffer")
        .expect("spawn framebuffer");
    Traverser::default().traverse(&mut ws, 0.0);
    assert_eq!(ws.backend().live_count(), 1);

    ws.remove_composition(comp).expect("remove");
    assert_eq!(ws.backend().live_count(), 0);
    assert_eq!(ws.node_count(), 0);
}

#[test]
fn bypass_passes_the_first_input_of_each_output_kind() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let add = ws.add_node(comp, ADD).expect("spawn add");
    set_default(&mut ws, add, "A", 3.0f32);
    set_default(&mut ws, add, "B", 4.0f32);
    let make = ws
        .add_node(comp, "raster.packaged.make_transform2d")
        .expect("spawn make");
    let parent = Transform2D::new([5.0, 5.0], [1.0, 1.0], [0.0, 0.0], 0.0);
    set_default(&mut ws, make, "ParentTransform", parent.clone());
    let circle = ws
        .add_node(comp, "raster.packaged.sdf_circle")
        .expect("spawn circle");
    for id in [add, make, circle] {
        ws.node_mut(id).expect("node").bypassed = true;
    }

    let out = Traverser::default().traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, add, "Value")), Some(&Value::Float(3.0)));
    assert_eq!(
        out.value(output(&ws, make, "Output")),
        Some(&Value::Transform2D(parent))
    );
    // no shape input to pass through
    assert_eq!(out.value(output(&ws, circle, "Shape")), None);
    assert_eq!(ws.node(add).expect("add").behavior_runs(), 0);
}

#[test]
fn disabled_source_leaves_connected_inputs_absent() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let a = constant(&mut ws, comp, 5.0);
    let b = ws.add_node(comp, ADD).expect("spawn add");
    set_default(&mut ws, b, "A", 1.5f32);
    ws.connect(output(&ws, a, "Value"), input(&ws, b, "A"))
        .expect("connect");
    ws.node_mut(a).expect("a").enabled = false;

    let out = Traverser::default().traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, a, "Value")), None);
    assert_eq!(out.value(input(&ws, b, "A")), None);
    assert_eq!(out.value(input(&ws, b, "B")), Some(&Value::Float(0.0)));
    assert_eq!(out.value(output(&ws, b, "Value")), None);
    assert_eq!(ws.node(a).expect("a").executions(), 0);
    assert_eq!(ws.node(b).expect("b").executions(), 1);

    ws.node_mut(a).expect("a").enabled = true;
    let out = Traverser::default().traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, b, "Value")), Some(&Value::Float(5.0)));
}

#[test]
fn absence_propagates_down_a_chain() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let a = constant(&mut ws, comp, 5.0);
    let b = ws.add_node(comp, ADD).expect("spawn b");
    let c = ws.add_node(comp, ADD).expect("spawn c");
    set_default(&mut ws, b, "A", 1.0f32);
    set_default(&mut ws, c, "A", 2.0f32);
    ws.connect(output(&ws, a, "Value"), input(&ws, b, "A"))
        .expect("a -> b");
    ws.connect(output(&ws, b, "Value"), input(&ws, c, "A"))
        .expect("b -> c");
    ws.node_mut(a).expect("a").enabled = false;

    let out = Traverser::default().traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, b, "Value")), None);
    assert_eq!(out.value(input(&ws, c, "A")), None);
    assert_eq!(out.value(output(&ws, c, "Value")), None);
}

#[test]
fn unfired_flow_node_leaves_its_readers_absent() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let acc = ws.add_node(comp, "raster.packaged.accumulate").expect("acc");
    let add = ws.add_node(comp, ADD).expect("spawn add");
    ws.connect(output(&ws, acc, "Total"), input(&ws, add, "A"))
        .expect("total -> add");

    let out = Traverser::default().traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, acc, "Total")), None);
    assert_eq!(out.value(output(&ws, add, "Value")), None);
}

#[test]
fn get_time_reports_seconds() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let t = ws.add_node(comp, "raster.packaged.get_time").expect("spawn");
    let mut traverser = Traverser::default();
    let out = traverser.traverse(&mut ws, 30.0);
    assert_eq!(out.value(output(&ws, t, "Time")), Some(&Value::Float(0.5)));
    let out = traverser.traverse(&mut ws, 30.0);
    assert_eq!(out.value(output(&ws, t, "Frame")), Some(&Value::Float(30.0)));
    assert_eq!(ws.node(t).expect("node").behavior_runs(), 2);
}

#[test]
fn rounded_rect_shape_carries_its_uniform() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let rect = ws
        .add_node(comp, "raster.packaged.sdf_rounded_rect")
        .expect("spawn");
    let out = Traverser::default().traverse(&mut ws, 0.0);
    let shape: SdfShape = out
        .value(output(&ws, rect, "Shape"))
        .and_then(|v| v.get().ok())
        .expect("shape");
    assert_eq!(shape.distance_function_name, "fSDFRoundedRect");
    assert_eq!(shape.uniform("uSDFRoundedRectRadius"), Some(&Value::Float(0.5)));
}

#[test]
fn annular_wraps_a_connected_shape() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let circle = ws
        .add_node(comp, "raster.packaged.sdf_circle")
        .expect("spawn circle");
    let ring = ws
        .add_node(comp, "raster.packaged.sdf_annular")
        .expect("spawn annular");
    set_default(&mut ws, circle, "Radius", 0.25f32);
    set_default(&mut ws, ring, "Intensity", 0.5f32);

    // nothing to hollow out yet
    let out = Traverser::default().traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, ring, "Shape")), None);

    ws.connect(output(&ws, circle, "Shape"), input(&ws, ring, "A"))
        .expect("circle -> annular");
    let out = Traverser::default().traverse(&mut ws, 0.0);
    let shape: SdfShape = out
        .value(output(&ws, ring, "Shape"))
        .and_then(|v| v.get().ok())
        .expect("annular shape");
    assert_eq!(shape.distance_function_name, "fSDFAnnular");
    assert_eq!(shape.uniform("uSDFCircleRadiusAnnular"), Some(&Value::Float(0.25)));
    assert_eq!(shape.uniform("uSDFCircleRadius"), None);
    assert_eq!(shape.uniform("uSDFAnnularIntensity"), Some(&Value::Float(0.5 * 0.04)));
}

#[test]
fn sampler_constants_each_set_one_mode() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let packages = [
        "raster.packaged.repeat_sampler_wrapping_constant",
        "raster.packaged.clamp_to_border_sampler_wrapping_constant",
        "raster.packaged.linear_sampler_filtering_constant",
    ];
    let nodes: Vec<_> = packages
        .iter()
        .map(|p| ws.add_node(comp, p).expect("spawn sampler constant"))
        .collect();

    let out = Traverser::default().traverse(&mut ws, 0.0);
    let settings: Vec<SamplerSettings> = nodes
        .iter()
        .map(|&n| {
            out.value(output(&ws, n, "Sampler"))
                .and_then(|v| v.get().ok())
                .expect("sampler settings")
        })
        .collect();
    assert_eq!(
        settings,
        vec![
            SamplerSettings::wrapping(TextureWrapping::Repeat),
            SamplerSettings::wrapping(TextureWrapping::ClampToBorder),
            SamplerSettings::filtering(TextureFiltering::Linear),
        ]
    );
}

#[test]
fn composition_attributes_follow_drivers() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let a = constant(&mut ws, comp, 0.25);
    {
        let c = ws.composition_mut(comp).expect("comp");
        c.blend_mode = BlendMode::Multiply;
        c.insert_attribute(Attribute::new(AttributeId(900), "Fade", 1.0f32));
        c.opacity_attribute = Some(AttributeId(900));
    }
    ws.set_composition_driver(comp, "Fade", Some(output(&ws, a, "Value")))
        .expect("drive");

    let out = Traverser::default().traverse(&mut ws, 0.0);
    let frame = out.composition(comp).expect("composition frame");
    assert_eq!(frame.attributes.get("Fade"), Some(&Value::Float(0.25)));
    assert_eq!(frame.opacity, 0.25);
    assert_eq!(frame.blend_mode, BlendMode::Multiply);

    ws.delete_node(a).expect("delete");
    let out = Traverser::default().traverse(&mut ws, 0.0);
    assert_eq!(out.composition(comp).expect("frame").opacity, 1.0);
}

// ----- flow -----

fn repeat_into_accumulate(ws: &mut Workspace, count: i32) -> (raster_graph_core::NodeId, raster_graph_core::NodeId) {
    let comp = ws.add_composition("Main");
    let begin = ws.add_node(comp, "raster.packaged.begin").expect("begin");
    let repeat = ws.add_node(comp, "raster.packaged.repeat").expect("repeat");
    let acc = ws.add_node(comp, "raster.packaged.accumulate").expect("acc");
    let value = constant(ws, comp, 2.5);
    set_default(ws, repeat, "Count", count);
    ws.connect(flow_output(ws, begin, "Then"), flow_input(ws, repeat))
        .expect("begin -> repeat");
    ws.connect(flow_output(ws, repeat, "Loop"), flow_input(ws, acc))
        .expect("loop -> acc");
    ws.connect(output(ws, value, "Value"), input(ws, acc, "Value"))
        .expect("value -> acc");
    (repeat, acc)
}

#[test]
fn repeat_drives_accumulate_each_iteration() {
    let mut ws = Workspace::default();
    let (repeat, acc) = repeat_into_accumulate(&mut ws, 4);

    let mut traverser = Traverser::default();
    let out = traverser.traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, acc, "Total")), Some(&Value::Float(10.0)));
    assert_eq!(out.value(output(&ws, repeat, "Index")), Some(&Value::Int(3)));
    assert_eq!(ws.node(acc).expect("acc").executions(), 4);

    // the running total restarts every frame
    let out = traverser.traverse(&mut ws, 1.0);
    assert_eq!(out.value(output(&ws, acc, "Total")), Some(&Value::Float(10.0)));
}

#[test]
fn flow_budget_bounds_signal_delivery() {
    let mut ws = Workspace::default();
    let (_, acc) = repeat_into_accumulate(&mut ws, 10);
    let mut config = TraverserConfig::default();
    config.max_flow_signals = 3;

    // Then, Loop #0 and the accumulator's own Then use the whole budget
    let out = Traverser::new(config).traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, acc, "Total")), Some(&Value::Float(2.5)));
}

#[test]
fn branch_takes_one_side() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let begin = ws.add_node(comp, "raster.packaged.begin").expect("begin");
    let branch = ws.add_node(comp, "raster.packaged.branch").expect("branch");
    let yes = ws.add_node(comp, "raster.packaged.accumulate").expect("yes");
    let no = ws.add_node(comp, "raster.packaged.accumulate").expect("no");
    set_default(&mut ws, yes, "Value", 1.0f32);
    set_default(&mut ws, no, "Value", 1.0f32);
    ws.connect(flow_output(&ws, begin, "Then"), flow_input(&ws, branch))
        .expect("begin -> branch");
    ws.connect(flow_output(&ws, branch, "True"), flow_input(&ws, yes))
        .expect("true");
    ws.connect(flow_output(&ws, branch, "False"), flow_input(&ws, no))
        .expect("false");
    {
        let cond = ws
            .node_mut(branch)
            .and_then(|n| n.attribute_mut("Condition"))
            .expect("condition");
        cond.add_keyframe(0.0, false).expect("key");
        cond.add_keyframe(10.0, true).expect("key");
    }

    let mut traverser = Traverser::default();
    let out = traverser.traverse(&mut ws, 5.0);
    assert_eq!(out.value(output(&ws, no, "Total")), Some(&Value::Float(1.0)));
    assert_eq!(out.value(output(&ws, yes, "Total")), None);

    let out = traverser.traverse(&mut ws, 12.0);
    assert_eq!(out.value(output(&ws, yes, "Total")), Some(&Value::Float(1.0)));
    assert_eq!(out.value(output(&ws, no, "Total")), None);
}

#[test]
fn flow_nodes_do_not_run_without_a_signal() {
    let mut ws = Workspace::default();
    let comp = ws.add_composition("Main");
    let acc = ws.add_node(comp, "raster.packaged.accumulate").expect("acc");
    let out = Traverser::default().traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, acc, "Total")), None);
    assert_eq!(ws.node(acc).expect("acc").executions(), 0);
}

/// Pure data node converting the loop index to a float.
#[derive(Debug, Default)]
struct IndexToFloat;

impl IndexToFloat {
    fn spawn() -> Box<dyn NodeBehavior> {
        Box::new(Self)
    }
}

impl NodeBehavior for IndexToFloat {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .attribute("Index", 0i32)
            .output("Value", ValueKind::Float);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        let mut out = NodeOutputs::new();
        if let Some(i) = ctx.get::<i32>("Index") {
            out.insert("Value".into(), Value::Float(i as f32));
        }
        out
    }
}

#[test]
fn signal_payload_invalidates_downstream_data_nodes() {
    let mut registry = builtin_registry();
    registry
        .register(
            NodeDescription::new("test.index_to_float", "Index To Float", "Math"),
            IndexToFloat::spawn,
        )
        .expect("register");
    let mut ws = Workspace::with_registry(HeadlessBackend::new(), registry);
    let comp = ws.add_composition("Main");
    let begin = ws.add_node(comp, "raster.packaged.begin").expect("begin");
    let repeat = ws.add_node(comp, "raster.packaged.repeat").expect("repeat");
    let convert = ws.add_node(comp, "test.index_to_float").expect("convert");
    let acc = ws.add_node(comp, "raster.packaged.accumulate").expect("acc");
    set_default(&mut ws, repeat, "Count", 4i32);
    ws.connect(flow_output(&ws, begin, "Then"), flow_input(&ws, repeat))
        .expect("begin -> repeat");
    ws.connect(flow_output(&ws, repeat, "Loop"), flow_input(&ws, acc))
        .expect("loop -> acc");
    ws.connect(output(&ws, repeat, "Index"), input(&ws, convert, "Index"))
        .expect("index -> convert");
    ws.connect(output(&ws, convert, "Value"), input(&ws, acc, "Value"))
        .expect("convert -> acc");

    let out = Traverser::default().traverse(&mut ws, 0.0);
    // 0 + 1 + 2 + 3
    assert_eq!(out.value(output(&ws, acc, "Total")), Some(&Value::Float(6.0)));
    assert_eq!(out.value(output(&ws, convert, "Value")), Some(&Value::Float(3.0)));
}

/// Hands out a texture that is still uploading.
#[derive(Debug)]
struct PendingTexture(UploadTicket);

impl NodeBehavior for PendingTexture {
    fn setup(&self, setup: &mut NodeSetup) {
        setup.output("Texture", ValueKind::Resource);
    }

    fn execute(&mut self, _ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        let mut out = NodeOutputs::new();
        out.insert("Texture".into(), Value::Pending(self.0.clone()));
        out
    }
}

#[derive(Debug, Default)]
struct TextureId;

impl NodeBehavior for TextureId {
    fn setup(&self, setup: &mut NodeSetup) {
        setup
            .attribute("Texture", ResourceHandle::new(ResourceKind::Texture, 0))
            .output("Id", ValueKind::Int);
    }

    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> NodeOutputs {
        let mut out = NodeOutputs::new();
        if let Some(handle) = ctx.get::<ResourceHandle>("Texture") {
            out.insert("Id".into(), Value::Int(handle.id as i32));
        }
        out
    }
}

static TICKET: Lazy<UploadTicket> = Lazy::new(UploadTicket::new);

#[test]
fn pending_uploads_read_as_absent_until_ready() {
    let mut registry = builtin_registry();
    registry
        .register(
            NodeDescription::new("test.pending_texture", "Pending Texture", "Utilities"),
            || -> Box<dyn NodeBehavior> { Box::new(PendingTexture(TICKET.clone())) },
        )
        .expect("register source");
    registry
        .register(
            NodeDescription::new("test.texture_id", "Texture Id", "Utilities"),
            || -> Box<dyn NodeBehavior> { Box::new(TextureId) },
        )
        .expect("register reader");
    let mut ws = Workspace::with_registry(HeadlessBackend::new(), registry);
    let comp = ws.add_composition("Main");
    let source = ws.add_node(comp, "test.pending_texture").expect("source");
    let reader = ws.add_node(comp, "test.texture_id").expect("reader");
    ws.connect(output(&ws, source, "Texture"), input(&ws, reader, "Texture"))
        .expect("connect");

    let mut traverser = Traverser::default();
    let out = traverser.traverse(&mut ws, 0.0);
    assert_eq!(out.value(input(&ws, reader, "Texture")), None);
    assert_eq!(out.value(output(&ws, reader, "Id")), None);

    assert!(TICKET.fulfil(ResourceHandle::new(ResourceKind::Texture, 7)));
    let out = traverser.traverse(&mut ws, 0.0);
    assert_eq!(out.value(output(&ws, reader, "Id")), Some(&Value::Int(7)));
}
