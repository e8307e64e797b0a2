//! Keyframe sampling.
//!
//! Model:
//! - Keyframes are ordered by frame.
//! - The segment [k(i) -> k(i+1)] uses the easing stored on k(i).
//! - Before the first keyframe and after the last the value is clamped.
//! - A frame equal to a keyframe's frame yields that keyframe's value exactly.

use raster_api_core::Value;

use crate::interp::functions::interpolate_value;
use crate::keyframe::Keyframe;

/// Locate the keyframes bracketing `frame`.
///
/// Returns `(i, j, local_t)`:
/// - `i == j` when `frame` is at or outside an end, or hits a keyframe exactly.
/// - otherwise `keyframes[i].frame < frame < keyframes[j].frame` and `local_t` is in (0, 1).
pub fn find_segment(keyframes: &[Keyframe], frame: f32) -> (usize, usize, f32) {
    let n = keyframes.len();
    if n <= 1 || frame.is_nan() || frame <= keyframes[0].frame {
        return (0, 0, 0.0);
    }
    if frame >= keyframes[n - 1].frame {
        return (n - 1, n - 1, 0.0);
    }
    // first keyframe strictly after `frame`; n-1 at most given the clamps above
    let j = keyframes.partition_point(|k| k.frame <= frame);
    let i = j - 1;
    if keyframes[i].frame == frame {
        return (i, i, 0.0);
    }
    let f0 = keyframes[i].frame;
    let f1 = keyframes[j].frame;
    let t = if f1 > f0 { (frame - f0) / (f1 - f0) } else { 1.0 };
    (i, j, t.clamp(0.0, 1.0))
}

/// Sample ordered keyframes at `frame`. `None` when there are no keyframes or the
/// bracketing values cannot be blended.
pub fn sample_keyframes(keyframes: &[Keyframe], frame: f32) -> Option<Value> {
    if keyframes.is_empty() {
        return None;
    }
    let (i, j, t) = find_segment(keyframes, frame);
    if i == j {
        return Some(keyframes[i].value.clone());
    }
    let left = &keyframes[i];
    let right = &keyframes[j];
    interpolate_value(&left.value, &right.value, left.easing.apply(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::KeyframeId;
    use crate::interp::Easing;

    fn key(id: u32, frame: f32, v: f32) -> Keyframe {
        Keyframe::new(KeyframeId(id), frame, Value::Float(v))
    }

    #[test]
    fn segment_lookup() {
        let keys = [key(0, 0.0, 0.0), key(1, 10.0, 1.0), key(2, 20.0, 2.0)];
        assert_eq!(find_segment(&keys, -5.0), (0, 0, 0.0));
        assert_eq!(find_segment(&keys, 10.0), (1, 1, 0.0));
        assert_eq!(find_segment(&keys, 15.0), (1, 2, 0.5));
        assert_eq!(find_segment(&keys, 25.0), (2, 2, 0.0));
    }

    #[test]
    fn hold_easing_steps_floats() {
        let mut a = key(0, 0.0, 1.0);
        a.easing = Easing::Hold;
        let keys = [a, key(1, 10.0, 5.0)];
        assert_eq!(sample_keyframes(&keys, 9.9), Some(Value::Float(1.0)));
        assert_eq!(sample_keyframes(&keys, 10.0), Some(Value::Float(5.0)));
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(sample_keyframes(&[], 3.0), None);
    }
}
