//! Blending utilities for Value types.
//! - f32 linear interpolation for floats and vector components
//! - integers lerp then round
//! - transforms blend component-wise (position/size/anchor/angle) and recurse into parents
//! - shapes blend uniform values when both sides share a layout
//! - everything else steps: left value until t reaches 1

use crate::shape::{SdfShape, ShapeUniform};
use crate::transform::Transform2D;
use crate::Value;

/// Linear interpolation for f32
#[inline]
pub fn lerp_f(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Lerp for fixed-size arrays
fn lerp_array<const N: usize>(a: &[f32; N], b: &[f32; N], t: f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = lerp_f(a[i], b[i], t);
    }
    out
}

fn blend_transform(a: &Transform2D, b: &Transform2D, t: f32) -> Transform2D {
    let parent = match (&a.parent, &b.parent) {
        (Some(pa), Some(pb)) => Some(Box::new(blend_transform(pa, pb, t))),
        _ => step(&a.parent, &b.parent, t).clone(),
    };
    Transform2D {
        position: lerp_array(&a.position, &b.position, t),
        size: lerp_array(&a.size, &b.size, t),
        anchor: lerp_array(&a.anchor, &b.anchor, t),
        angle: lerp_f(a.angle, b.angle, t),
        parent,
    }
}

fn blend_shape(a: &SdfShape, b: &SdfShape, t: f32) -> SdfShape {
    if !a.same_layout(b) {
        return step(a, b, t).clone();
    }
    let uniforms = a
        .uniforms
        .iter()
        .zip(&b.uniforms)
        .map(|(ua, ub)| {
            let value = blend_values(&ua.value, &ub.value, t)
                .unwrap_or_else(|| step(&ua.value, &ub.value, t).clone());
            ShapeUniform {
                ty: ua.ty.clone(),
                name: ua.name.clone(),
                value,
            }
        })
        .collect();
    SdfShape {
        distance_function_name: a.distance_function_name.clone(),
        uniforms,
    }
}

#[inline]
fn step<'a, T>(a: &'a T, b: &'a T, t: f32) -> &'a T {
    if t < 1.0 {
        a
    } else {
        b
    }
}

/// Blend two Values of the same kind. Returns `None` when the kinds differ; callers
/// decide what a mismatch means (attributes reject such keyframes up front).
///
/// `t` is clamped to `[0, 1]` and the endpoints return the inputs unchanged.
pub fn blend_values(a: &Value, b: &Value, t: f32) -> Option<Value> {
    if a.kind() != b.kind() {
        return None;
    }
    let t = t.clamp(0.0, 1.0);
    if t <= 0.0 {
        return Some(a.clone());
    }
    if t >= 1.0 {
        return Some(b.clone());
    }
    let out = match (a, b) {
        (Value::Float(af), Value::Float(bf)) => Value::Float(lerp_f(*af, *bf, t)),
        (Value::Int(ai), Value::Int(bi)) => {
            Value::Int(lerp_f(*ai as f32, *bi as f32, t).round() as i32)
        }
        (Value::Vec2(aa), Value::Vec2(bb)) => Value::Vec2(lerp_array(aa, bb, t)),
        (Value::Vec3(aa), Value::Vec3(bb)) => Value::Vec3(lerp_array(aa, bb, t)),
        (Value::Vec4(aa), Value::Vec4(bb)) => Value::Vec4(lerp_array(aa, bb, t)),
        (Value::Transform2D(at), Value::Transform2D(bt)) => {
            Value::Transform2D(blend_transform(at, bt, t))
        }
        (Value::Shape(ashape), Value::Shape(bshape)) => {
            Value::Shape(blend_shape(ashape, bshape, t))
        }
        _ => step_blend(a, b, t),
    };
    Some(out)
}

/// Step blending for step-only types: hold `a` until `t` reaches 1.
pub fn step_blend(a: &Value, b: &Value, t: f32) -> Value {
    step(a, b, t).clone()
}
