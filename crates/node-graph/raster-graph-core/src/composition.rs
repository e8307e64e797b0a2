//! Time-bounded node groups.

use hashbrown::HashMap;
use indexmap::IndexMap;
use raster_animation_core::{Attribute, AttributeId};
use raster_api_core::Value;
use serde::{Deserialize, Serialize};

use crate::ids::{CompositionId, NodeId, PinId};
use crate::node::Node;

/// How a composition is layered onto the ones below it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Subtract,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
}

#[derive(Debug)]
pub struct Composition {
    pub(crate) id: CompositionId,
    pub name: String,
    pub description: String,
    pub begin_frame: f32,
    pub end_frame: f32,
    pub enabled: bool,
    pub opacity: f32,
    /// Float attribute that drives opacity when set.
    pub opacity_attribute: Option<AttributeId>,
    pub blend_mode: BlendMode,
    pub(crate) attributes: IndexMap<String, Attribute>,
    pub(crate) nodes: IndexMap<NodeId, Node>,
}

impl Composition {
    pub fn new(id: CompositionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            begin_frame: 0.0,
            end_frame: 60.0,
            enabled: true,
            opacity: 1.0,
            opacity_attribute: None,
            blend_mode: BlendMode::Normal,
            attributes: IndexMap::new(),
            nodes: IndexMap::new(),
        }
    }

    pub fn id(&self) -> CompositionId {
        self.id
    }

    /// Inclusive on both ends.
    pub fn contains_frame(&self, frame: f32) -> bool {
        frame >= self.begin_frame && frame <= self.end_frame
    }

    pub fn is_active(&self, frame: f32) -> bool {
        self.enabled && self.contains_frame(frame)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
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

    pub fn insert_attribute(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.attributes
            .insert(attribute.name().to_string(), attribute)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let removed = self.attributes.shift_remove(name);
        if let (Some(attr), Some(id)) = (&removed, self.opacity_attribute) {
            if attr.id() == id {
                self.opacity_attribute = None;
            }
        }
        removed
    }

    /// Resolve every composition attribute at `frame`, preferring driver pin values.
    pub fn evaluate_attributes(
        &self,
        frame: f32,
        accumulator: &HashMap<PinId, Value>,
    ) -> IndexMap<String, Value> {
        self.attributes
            .iter()
            .map(|(name, attr)| {
                let driven = attr
                    .driver_pin()
                    .and_then(|pin| accumulator.get(&PinId(pin)));
                (name.clone(), attr.resolve(frame, driven))
            })
            .collect()
    }

    /// Opacity at `frame`: the opacity attribute's value when one is bound, else the
    /// static opacity.
    pub fn opacity_at(&self, resolved: &IndexMap<String, Value>) -> f32 {
        self.opacity_attribute
            .and_then(|id| self.attributes.values().find(|a| a.id() == id))
            .and_then(|attr| resolved.get(attr.name()))
            .and_then(|value| value.get::<f32>().ok())
            .unwrap_or(self.opacity)
    }

    pub(crate) fn clear_driver_pin(&mut self, pin: PinId) {
        for attr in self.attributes.values_mut() {
            if attr.driver_pin() == Some(pin.0) {
                attr.set_driver_pin(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_range_is_inclusive() {
        let mut comp = Composition::new(CompositionId(0), "Main");
        comp.begin_frame = 10.0;
        comp.end_frame = 20.0;
        assert!(!comp.contains_frame(9.9));
        assert!(comp.contains_frame(10.0));
        assert!(comp.contains_frame(20.0));
        assert!(!comp.contains_frame(20.1));
        comp.enabled = false;
        assert!(!comp.is_active(15.0));
    }

    #[test]
    fn opacity_follows_bound_attribute() {
        let mut comp = Composition::new(CompositionId(0), "Main");
        comp.opacity = 0.8;
        let mut fade = Attribute::new(AttributeId(5), "Fade", 1.0f32);
        fade.add_keyframe(0.0, 0.0f32).unwrap();
        fade.add_keyframe(10.0, 1.0f32).unwrap();
        comp.insert_attribute(fade);

        let resolved = comp.evaluate_attributes(5.0, &HashMap::new());
        assert_eq!(comp.opacity_at(&resolved), 0.8);

        comp.opacity_attribute = Some(AttributeId(5));
        assert_eq!(comp.opacity_at(&resolved), 0.5);

        comp.remove_attribute("Fade");
        assert_eq!(comp.opacity_attribute, None);
    }

    #[test]
    fn driver_pins_override_composition_attributes() {
        let mut comp = Composition::new(CompositionId(0), "Main");
        let mut attr = Attribute::new(AttributeId(1), "Scale", 1.0f32);
        attr.set_driver_pin(Some(7));
        comp.insert_attribute(attr);

        let mut acc = HashMap::new();
        acc.insert(PinId(7), Value::Float(3.0));
        let resolved = comp.evaluate_attributes(0.0, &acc);
        assert_eq!(resolved.get("Scale"), Some(&Value::Float(3.0)));

        comp.clear_driver_pin(PinId(7));
        let resolved = comp.evaluate_attributes(0.0, &acc);
        assert_eq!(resolved.get("Scale"), Some(&Value::Float(1.0)));
    }
}
