//! Value: the dynamic payload carried by attributes, pins and documents.
//!
//! `Value` is a closed sum type over every payload the core understands. Callers never cast
//! blindly; they go through [`Value::get`], which reports a [`TypeMismatch`] when the stored
//! payload does not match the requested type. A mismatch is expected while a graph edit is in
//! flight, so consumers treat it as "no value this frame".

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::ResourceHandle;
use crate::sampler::SamplerSettings;
use crate::shape::SdfShape;
use crate::transform::Transform2D;
use crate::upload::UploadTicket;

/// Runtime type identity of a [`Value`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    Text,
    Transform2D,
    Shape,
    Sampler,
    Resource,
    Pending,
}

impl ValueKind {
    /// Whether values of this kind blend continuously between keyframes.
    /// Everything else holds the left keyframe until the right one is reached.
    pub fn is_interpolable(self) -> bool {
        matches!(
            self,
            ValueKind::Float
                | ValueKind::Int
                | ValueKind::Vec2
                | ValueKind::Vec3
                | ValueKind::Vec4
                | ValueKind::Transform2D
                | ValueKind::Shape
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// Signed integer (counts, indices)
    Int(i32),

    /// Boolean (step)
    Bool(bool),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector
    Vec3([f32; 3]),

    /// 4D vector, also used for RGBA colors
    Vec4([f32; 4]),

    /// Text / string; step-only for interpolation
    Text(String),

    /// Decomposed 2D transform with optional parent
    Transform2D(Transform2D),

    /// Signed-distance shape descriptor
    Shape(SdfShape),

    /// Texture sampling settings
    Sampler(SamplerSettings),

    /// Opaque handle owned by the rendering backend
    Resource(ResourceHandle),

    /// Resource still being uploaded by the async worker. Never persisted.
    #[serde(skip)]
    Pending(UploadTicket),
}

impl Default for Value {
    fn default() -> Self {
        Value::Float(0.0)
    }
}

/// The stored payload does not have the requested type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("type mismatch: expected {expected:?}, found {found:?}")]
pub struct TypeMismatch {
    pub expected: ValueKind,
    pub found: ValueKind,
}

/// Types that can be read out of a [`Value`] without coercion.
pub trait FromValue: Sized {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(inner: $ty) -> Self {
                    Value::$variant(inner)
                }
            }
        )*
    };
}

value_conversions! {
    f32 => Float,
    i32 => Int,
    bool => Bool,
    [f32; 2] => Vec2,
    [f32; 3] => Vec3,
    [f32; 4] => Vec4,
    String => Text,
    Transform2D => Transform2D,
    SdfShape => Shape,
    SamplerSettings => Sampler,
    ResourceHandle => Resource,
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl Value {
    /// Return the runtime kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Text(_) => ValueKind::Text,
            Value::Transform2D(_) => ValueKind::Transform2D,
            Value::Shape(_) => ValueKind::Shape,
            Value::Sampler(_) => ValueKind::Sampler,
            Value::Resource(_) => ValueKind::Resource,
            Value::Pending(_) => ValueKind::Pending,
        }
    }

    /// Read the payload as `T`, failing when the stored kind differs.
    pub fn get<T: FromValue>(&self) -> Result<T, TypeMismatch> {
        T::from_value(self).ok_or(TypeMismatch {
            expected: T::KIND,
            found: self.kind(),
        })
    }

    /// Replace the stored payload. The kind may change.
    pub fn set(&mut self, value: impl Into<Value>) {
        *self = value.into();
    }

    /// Compiled-in neutral value for a kind, used when nothing else is known.
    pub fn zero_of(kind: ValueKind) -> Option<Value> {
        Some(match kind {
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Int => Value::Int(0),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Vec2 => Value::Vec2([0.0; 2]),
            ValueKind::Vec3 => Value::Vec3([0.0; 3]),
            ValueKind::Vec4 => Value::Vec4([0.0; 4]),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Transform2D => Value::Transform2D(Transform2D::default()),
            ValueKind::Shape => Value::Shape(SdfShape::default()),
            ValueKind::Sampler => Value::Sampler(SamplerSettings::default()),
            ValueKind::Resource | ValueKind::Pending => return None,
        })
    }

    /// Swap a finished upload for its resource handle. Uploads that are still in flight
    /// resolve to `None` so callers treat them as absent instead of blocking.
    pub fn resolve_pending(self) -> Option<Value> {
        match self {
            Value::Pending(ticket) => ticket.handle().map(Value::Resource),
            other => Some(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_matching_payload() {
        let value = Value::Vec2([1.0, 2.0]);
        assert_eq!(value.get::<[f32; 2]>(), Ok([1.0, 2.0]));
    }

    #[test]
    fn get_reports_mismatch_without_coercion() {
        let value = Value::Int(3);
        let err = value.get::<f32>().unwrap_err();
        assert_eq!(err.expected, ValueKind::Float);
        assert_eq!(err.found, ValueKind::Int);
    }

    #[test]
    fn set_replaces_payload_and_kind() {
        let mut value = Value::Float(1.0);
        value.set("hello");
        assert_eq!(value.kind(), ValueKind::Text);
        assert_eq!(value.get::<String>().unwrap(), "hello");
    }

    #[test]
    fn tagged_json_shape() {
        let json = serde_json::to_value(Value::Float(0.5)).unwrap();
        assert_eq!(json["type"], "float");
        assert_eq!(json["data"], 0.5);
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, Value::Float(0.5));
    }

    #[test]
    fn pending_resolves_only_when_ready() {
        let ticket = UploadTicket::new();
        assert_eq!(Value::Pending(ticket.clone()).resolve_pending(), None);
        let handle = ResourceHandle::new(crate::ResourceKind::Texture, 7);
        assert!(ticket.fulfil(handle.clone()));
        assert_eq!(
            Value::Pending(ticket).resolve_pending(),
            Some(Value::Resource(handle))
        );
    }
}
