//! Named, typed, time-varying properties.
//!
//! An [`Attribute`] owns a default value and an ordered keyframe list. Every keyframe
//! holds a value of the default's kind, so evaluation never has to reconcile kinds.

use log::debug;
use raster_api_core::{Value, ValueKind};
use serde::{Deserialize, Serialize};

use crate::error::AttributeError;
use crate::ids::{AttributeId, KeyframeId, KeyframeIds};
use crate::interp::Easing;
use crate::keyframe::Keyframe;
use crate::sampling::sample_keyframes;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AttributeDocument", into = "AttributeDocument")]
pub struct Attribute {
    id: AttributeId,
    name: String,
    default: Value,
    keyframes: Vec<Keyframe>,
    driver_pin: Option<u32>,
    ids: KeyframeIds,
}

impl Attribute {
    pub fn new(id: AttributeId, name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            id,
            name: name.into(),
            default: default.into(),
            keyframes: Vec::new(),
            driver_pin: None,
            ids: KeyframeIds::default(),
        }
    }

    /// Same attribute under a different id, used when copying nodes.
    pub fn with_id(mut self, id: AttributeId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> AttributeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Declared kind: the kind of the default value.
    pub fn kind(&self) -> ValueKind {
        self.default.kind()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn keyframe(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| k.id == id)
    }

    pub fn is_animated(&self) -> bool {
        !self.keyframes.is_empty()
    }

    /// Pin whose resolved value overrides this attribute, if any.
    pub fn driver_pin(&self) -> Option<u32> {
        self.driver_pin
    }

    pub fn set_driver_pin(&mut self, pin: Option<u32>) {
        self.driver_pin = pin;
    }

    pub fn set_default(&mut self, value: impl Into<Value>) -> Result<(), AttributeError> {
        let value = value.into();
        self.check_kind(&value)?;
        self.default = value;
        Ok(())
    }

    /// Insert a keyframe, keeping the list ordered. A keyframe already sitting at `frame`
    /// keeps its id and takes the new value.
    pub fn add_keyframe(
        &mut self,
        frame: f32,
        value: impl Into<Value>,
    ) -> Result<KeyframeId, AttributeError> {
        let value = value.into();
        if !frame.is_finite() {
            return Err(AttributeError::InvalidFrame(frame));
        }
        self.check_kind(&value)?;

        if let Some(existing) = self.keyframes.iter_mut().find(|k| k.frame == frame) {
            debug!(
                "attribute '{}': replacing {} at frame {frame}",
                self.name, existing.id
            );
            existing.value = value;
            return Ok(existing.id);
        }

        let id = self.ids.alloc();
        let at = self.keyframes.partition_point(|k| k.frame < frame);
        self.keyframes.insert(at, Keyframe::new(id, frame, value));
        Ok(id)
    }

    pub fn remove_keyframe(&mut self, id: KeyframeId) -> Result<Keyframe, AttributeError> {
        let index = self.index_of(id)?;
        Ok(self.keyframes.remove(index))
    }

    pub fn set_keyframe_value(
        &mut self,
        id: KeyframeId,
        value: impl Into<Value>,
    ) -> Result<(), AttributeError> {
        let value = value.into();
        self.check_kind(&value)?;
        let index = self.index_of(id)?;
        self.keyframes[index].value = value;
        Ok(())
    }

    pub fn set_keyframe_easing(
        &mut self,
        id: KeyframeId,
        easing: Easing,
    ) -> Result<(), AttributeError> {
        let index = self.index_of(id)?;
        self.keyframes[index].easing = easing;
        Ok(())
    }

    /// Move a keyframe in time. Any other keyframe already at `frame` is dropped.
    pub fn move_keyframe(&mut self, id: KeyframeId, frame: f32) -> Result<(), AttributeError> {
        if !frame.is_finite() {
            return Err(AttributeError::InvalidFrame(frame));
        }
        let index = self.index_of(id)?;
        let mut moved = self.keyframes.remove(index);
        moved.frame = frame;
        self.keyframes.retain(|k| k.frame != frame);
        let at = self.keyframes.partition_point(|k| k.frame < frame);
        self.keyframes.insert(at, moved);
        Ok(())
    }

    pub fn clear_keyframes(&mut self) {
        self.keyframes.clear();
    }

    /// Value at `frame`: the default without keyframes, otherwise the sampled keyframes
    /// clamped at both ends.
    pub fn evaluate(&self, frame: f32) -> Value {
        sample_keyframes(&self.keyframes, frame).unwrap_or_else(|| self.default.clone())
    }

    /// Like [`evaluate`](Self::evaluate), but a driver value of the right kind wins.
    pub fn resolve(&self, frame: f32, driven: Option<&Value>) -> Value {
        match driven {
            Some(value) if value.kind() == self.kind() => value.clone(),
            _ => self.evaluate(frame),
        }
    }

    fn index_of(&self, id: KeyframeId) -> Result<usize, AttributeError> {
        self.keyframes
            .iter()
            .position(|k| k.id == id)
            .ok_or(AttributeError::UnknownKeyframe(id))
    }

    fn check_kind(&self, value: &Value) -> Result<(), AttributeError> {
        if value.kind() == self.kind() {
            Ok(())
        } else {
            Err(AttributeError::KindMismatch {
                attribute: self.name.clone(),
                expected: self.kind(),
                found: value.kind(),
            })
        }
    }
}

/// Persisted form of an [`Attribute`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDocument {
    #[serde(
        rename = "ID",
        default = "AttributeId::unassigned",
        skip_serializing_if = "AttributeId::is_unassigned"
    )]
    pub id: AttributeId,
    pub name: String,
    #[serde(deserialize_with = "raster_api_core::json::deserialize_value")]
    pub default: Value,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    #[serde(
        default,
        rename = "DriverPinID",
        skip_serializing_if = "Option::is_none"
    )]
    pub driver_pin: Option<u32>,
}

impl TryFrom<AttributeDocument> for Attribute {
    type Error = AttributeError;

    fn try_from(doc: AttributeDocument) -> Result<Self, Self::Error> {
        let mut attribute = Attribute::new(doc.id, doc.name, doc.default);
        attribute.driver_pin = doc.driver_pin;

        let mut keyframes = doc.keyframes;
        keyframes.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        for key in keyframes.iter().filter(|k| k.id != KeyframeId::UNASSIGNED) {
            attribute.ids.observe(key.id);
        }
        for key in keyframes.iter_mut().filter(|k| k.id == KeyframeId::UNASSIGNED) {
            key.id = attribute.ids.alloc();
        }
        for key in &keyframes {
            if !key.frame.is_finite() {
                return Err(AttributeError::InvalidFrame(key.frame));
            }
            attribute.check_kind(&key.value)?;
            if attribute.keyframes.iter().any(|k| k.id == key.id) {
                return Err(AttributeError::DuplicateKeyframe(key.id));
            }
            attribute.ids.observe(key.id);
            // later entries at the same frame win, matching add_keyframe
            if let Some(last) = attribute.keyframes.last_mut() {
                if last.frame == key.frame {
                    *last = key.clone();
                    continue;
                }
            }
            attribute.keyframes.push(key.clone());
        }
        Ok(attribute)
    }
}

impl From<Attribute> for AttributeDocument {
    fn from(attribute: Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name,
            default: attribute.default,
            keyframes: attribute.keyframes,
            driver_pin: attribute.driver_pin,
        }
    }
}

/// Parse a single attribute document.
pub fn parse_attribute_json(s: &str) -> Result<Attribute, AttributeError> {
    serde_json::from_str(s).map_err(|e| AttributeError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_value_at_existing_frame() {
        let mut attr = Attribute::new(AttributeId(0), "Opacity", 1.0f32);
        let a = attr.add_keyframe(5.0, 0.0f32).unwrap();
        let b = attr.add_keyframe(5.0, 0.5f32).unwrap();
        assert_eq!(a, b);
        assert_eq!(attr.keyframes().len(), 1);
        assert_eq!(attr.evaluate(5.0), Value::Float(0.5));
    }

    #[test]
    fn rejects_other_kinds() {
        let mut attr = Attribute::new(AttributeId(0), "Opacity", 1.0f32);
        let err = attr.add_keyframe(0.0, Value::Int(1)).unwrap_err();
        assert!(matches!(err, AttributeError::KindMismatch { .. }));
        assert!(attr.set_default([1.0f32, 2.0]).is_err());
    }

    #[test]
    fn non_finite_frames_are_rejected() {
        let mut attr = Attribute::new(AttributeId(0), "X", 0.0f32);
        assert!(matches!(
            attr.add_keyframe(f32::NAN, 1.0f32),
            Err(AttributeError::InvalidFrame(_))
        ));
        assert!(matches!(
            attr.add_keyframe(f32::INFINITY, 1.0f32),
            Err(AttributeError::InvalidFrame(_))
        ));
    }

    #[test]
    fn driver_value_wins_when_kind_matches() {
        let mut attr = Attribute::new(AttributeId(0), "X", 1.0f32);
        attr.set_driver_pin(Some(9));
        assert_eq!(attr.resolve(0.0, Some(&Value::Float(4.0))), Value::Float(4.0));
        assert_eq!(attr.resolve(0.0, Some(&Value::Int(4))), Value::Float(1.0));
        assert_eq!(attr.resolve(0.0, None), Value::Float(1.0));
    }

    #[test]
    fn move_keyframe_keeps_order() {
        let mut attr = Attribute::new(AttributeId(0), "X", 0.0f32);
        let a = attr.add_keyframe(0.0, 0.0f32).unwrap();
        attr.add_keyframe(10.0, 10.0f32).unwrap();
        attr.move_keyframe(a, 20.0).unwrap();
        let frames: Vec<f32> = attr.keyframes().iter().map(|k| k.frame).collect();
        assert_eq!(frames, vec![10.0, 20.0]);
    }

    #[test]
    fn documents_without_ids_get_fresh_ones() {
        let attr = parse_attribute_json(
            r#"{
                "Name": "Scale",
                "Default": 1.0,
                "Keyframes": [
                    { "Frame": 0, "Value": 0.0 },
                    { "ID": 4, "Frame": 5, "Value": 0.5 },
                    { "Frame": 10, "Value": 1.0 }
                ]
            }"#,
        )
        .unwrap();
        assert!(attr.id().is_unassigned());
        let ids: Vec<KeyframeId> = attr.keyframes().iter().map(|k| k.id).collect();
        assert_eq!(ids, vec![KeyframeId(5), KeyframeId(4), KeyframeId(6)]);
        assert_eq!(attr.evaluate(5.0), Value::Float(0.5));

        let json = serde_json::to_value(&attr).unwrap();
        assert!(json.get("ID").is_none());
    }
}
