//! Identifiers for attributes and keyframes.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(pub u32);

/// Keyframe ids are unique within their attribute only.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyframeId(pub u32);

impl AttributeId {
    /// Id of an attribute loaded from a document that carried none. The owner assigns
    /// a real one.
    pub const UNASSIGNED: AttributeId = AttributeId(u32::MAX);

    pub fn unassigned() -> Self {
        Self::UNASSIGNED
    }

    pub fn is_unassigned(&self) -> bool {
        *self == Self::UNASSIGNED
    }
}

impl KeyframeId {
    /// Id of a keyframe loaded without one; replaced when the attribute is built.
    pub const UNASSIGNED: KeyframeId = KeyframeId(u32::MAX);

    pub fn unassigned() -> Self {
        Self::UNASSIGNED
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attribute#{}", self.0)
    }
}

impl fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "keyframe#{}", self.0)
    }
}

/// Monotonic keyframe id counter owned by each attribute.
#[derive(Default, Debug, Clone)]
pub(crate) struct KeyframeIds {
    next: u32,
}

impl KeyframeIds {
    #[inline]
    pub(crate) fn alloc(&mut self) -> KeyframeId {
        let id = KeyframeId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Make sure ids handed out later never collide with `seen`.
    #[inline]
    pub(crate) fn observe(&mut self, seen: KeyframeId) {
        if seen.0 >= self.next {
            self.next = seen.0.wrapping_add(1);
        }
    }
}

// Counters never take part in attribute equality.
impl PartialEq for KeyframeIds {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut ids = KeyframeIds::default();
        assert_eq!(ids.alloc(), KeyframeId(0));
        assert_eq!(ids.alloc(), KeyframeId(1));
        ids.observe(KeyframeId(10));
        assert_eq!(ids.alloc(), KeyframeId(11));
        ids.observe(KeyframeId(3));
        assert_eq!(ids.alloc(), KeyframeId(12));
    }
}
