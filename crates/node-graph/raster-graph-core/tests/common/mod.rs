#![allow(dead_code)]

use raster_graph_core::{CompositionId, NodeId, PinId, Value, Workspace};

pub const FLOAT_CONSTANT: &str = "raster.packaged.float_constant";
pub const ADD: &str = "raster.packaged.add";

pub fn output(ws: &Workspace, node: NodeId, name: &str) -> PinId {
    ws.node(node)
        .and_then(|n| n.output_pin(name))
        .map(|p| p.pin_id)
        .expect("output pin")
}

pub fn input(ws: &Workspace, node: NodeId, name: &str) -> PinId {
    ws.node(node)
        .and_then(|n| n.input_pin(name))
        .map(|p| p.pin_id)
        .expect("input pin")
}

pub fn flow_output(ws: &Workspace, node: NodeId, name: &str) -> PinId {
    ws.node(node)
        .and_then(|n| n.flow_output_pin(name))
        .map(|p| p.pin_id)
        .expect("flow output pin")
}

pub fn flow_input(ws: &Workspace, node: NodeId) -> PinId {
    ws.node(node)
        .and_then(|n| n.flow_input())
        .map(|p| p.pin_id)
        .expect("flow input pin")
}

pub fn set_default(ws: &mut Workspace, node: NodeId, name: &str, value: impl Into<Value>) {
    ws.node_mut(node)
        .and_then(|n| n.attribute_mut(name))
        .expect("attribute")
        .set_default(value)
        .expect("kind matches");
}

pub fn constant(ws: &mut Workspace, comp: CompositionId, value: f32) -> NodeId {
    let id = ws.add_node(comp, FLOAT_CONSTANT).expect("spawn constant");
    set_default(ws, id, "Value", value);
    id
}
