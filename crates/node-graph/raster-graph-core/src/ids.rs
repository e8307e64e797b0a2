//! Identifiers and the registry-wide allocator.
//!
//! Node, pin, link and composition ids are unique across the whole workspace. The
//! allocator is owned by the workspace; loading a document bumps it past every id it saw.

use std::fmt;

use raster_animation_core::AttributeId;
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($($name:ident => $label:literal),* $(,)?) => {
        $(
            #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub u32);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!($label, "#{}"), self.0)
                }
            }
        )*
    };
}

id_type! {
    NodeId => "node",
    PinId => "pin",
    LinkId => "link",
    CompositionId => "composition",
}

/// Monotonic allocator for every id kind in a workspace.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_node: u32,
    next_pin: u32,
    next_link: u32,
    next_composition: u32,
    next_attribute: u32,
}

#[inline]
fn bump(next: &mut u32) -> u32 {
    let id = *next;
    *next = next.wrapping_add(1);
    id
}

#[inline]
fn observe(next: &mut u32, seen: u32) {
    if seen >= *next {
        *next = seen.wrapping_add(1);
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_node(&mut self) -> NodeId {
        NodeId(bump(&mut self.next_node))
    }

    #[inline]
    pub fn alloc_pin(&mut self) -> PinId {
        PinId(bump(&mut self.next_pin))
    }

    #[inline]
    pub fn alloc_link(&mut self) -> LinkId {
        LinkId(bump(&mut self.next_link))
    }

    #[inline]
    pub fn alloc_composition(&mut self) -> CompositionId {
        CompositionId(bump(&mut self.next_composition))
    }

    #[inline]
    pub fn alloc_attribute(&mut self) -> AttributeId {
        AttributeId(bump(&mut self.next_attribute))
    }

    pub fn observe_node(&mut self, id: NodeId) {
        observe(&mut self.next_node, id.0);
    }

    pub fn observe_pin(&mut self, id: PinId) {
        observe(&mut self.next_pin, id.0);
    }

    pub fn observe_link(&mut self, id: LinkId) {
        observe(&mut self.next_link, id.0);
    }

    pub fn observe_composition(&mut self, id: CompositionId) {
        observe(&mut self.next_composition, id.0);
    }

    pub fn observe_attribute(&mut self, id: AttributeId) {
        observe(&mut self.next_attribute, id.0);
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
