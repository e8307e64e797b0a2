//! Signed-distance shape descriptors produced by shape nodes and consumed by renderers.

use serde::{Deserialize, Serialize};

use crate::Value;

/// A single uniform the distance function expects, e.g. `float uSDFRoundedRectRadius`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShapeUniform {
    /// GLSL type name.
    #[serde(rename = "Type")]
    pub ty: String,
    pub name: String,
    pub value: Value,
}

impl ShapeUniform {
    pub fn new(ty: &str, name: &str, value: Value) -> Self {
        Self {
            ty: ty.to_string(),
            name: name.to_string(),
            value,
        }
    }
}

/// Shape descriptor. An empty descriptor (no distance function) means "fill the whole quad".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SdfShape {
    pub distance_function_name: String,
    pub uniforms: Vec<ShapeUniform>,
}

impl SdfShape {
    pub fn new(distance_function_name: &str, uniforms: Vec<ShapeUniform>) -> Self {
        Self {
            distance_function_name: distance_function_name.to_string(),
            uniforms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.distance_function_name.is_empty()
    }

    /// Two shapes share a layout when they use the same function and uniform signature,
    /// which is what allows their uniform values to be blended.
    pub fn same_layout(&self, other: &SdfShape) -> bool {
        self.distance_function_name == other.distance_function_name
            && self.uniforms.len() == other.uniforms.len()
            && self
                .uniforms
                .iter()
                .zip(&other.uniforms)
                .all(|(a, b)| a.name == b.name && a.ty == b.ty)
    }

    pub fn uniform(&self, name: &str) -> Option<&Value> {
        self.uniforms
            .iter()
            .find(|u| u.name == name)
            .map(|u| &u.value)
    }
}
