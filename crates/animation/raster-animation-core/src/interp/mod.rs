//! Easing curves applied to the outgoing segment of a keyframe.

pub mod functions;

use serde::{Deserialize, Serialize};

use functions::bezier_ease_t;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    /// Hold the left keyframe's value until the next keyframe.
    Hold,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Cubic-bezier timing `[x1, y1, x2, y2]`.
    Bezier([f32; 4]),
}

impl Easing {
    pub const EASE_IN: [f32; 4] = [0.42, 0.0, 1.0, 1.0];
    pub const EASE_OUT: [f32; 4] = [0.0, 0.0, 0.58, 1.0];
    pub const EASE_IN_OUT: [f32; 4] = [0.42, 0.0, 0.58, 1.0];

    /// Map segment-local time `t` in `[0, 1]` to eased time.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Hold => {
                if t < 1.0 {
                    0.0
                } else {
                    1.0
                }
            }
            Easing::EaseIn => bezier(Self::EASE_IN, t),
            Easing::EaseOut => bezier(Self::EASE_OUT, t),
            Easing::EaseInOut => bezier(Self::EASE_IN_OUT, t),
            Easing::Bezier(ctrl) => bezier(ctrl, t),
        }
    }
}

#[inline]
fn bezier(ctrl: [f32; 4], t: f32) -> f32 {
    bezier_ease_t(t, ctrl[0], ctrl[1], ctrl[2], ctrl[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_waits_for_the_end() {
        assert_eq!(Easing::Hold.apply(0.0), 0.0);
        assert_eq!(Easing::Hold.apply(0.999), 0.0);
        assert_eq!(Easing::Hold.apply(1.0), 1.0);
    }

    #[test]
    fn ease_in_starts_slow_and_ease_out_starts_fast() {
        assert!(Easing::EaseIn.apply(0.2) < 0.2);
        assert!(Easing::EaseOut.apply(0.2) > 0.2);
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&Easing::EaseInOut).unwrap();
        assert_eq!(json, "\"EaseInOut\"");
        let bez: Easing = serde_json::from_str(r#"{"Bezier":[0.1,0.2,0.3,0.4]}"#).unwrap();
        assert_eq!(bez, Easing::Bezier([0.1, 0.2, 0.3, 0.4]));
    }
}
