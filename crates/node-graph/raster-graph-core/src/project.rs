//! Project-level settings and playback clock.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub framerate: f32,
    pub current_frame: f32,
    pub preferred_resolution: [u32; 2],
    pub background_color: [f32; 4],
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: "Empty Project".into(),
            description: "Empty Project".into(),
            framerate: 60.0,
            current_frame: 0.0,
            preferred_resolution: [1080, 1080],
            background_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Project {
    /// `MM:SS` for `frame` at the project framerate.
    pub fn format_frame_to_time(&self, frame: f32) -> String {
        let seconds = if self.framerate > 0.0 {
            (frame.max(0.0) / self.framerate) as u64
        } else {
            0
        };
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }

    /// Move the playhead by `dt` seconds. Past `length` it wraps to 0 when looping and
    /// clamps otherwise.
    pub fn advance(&mut self, dt: f32, length: f32, looping: bool) {
        let next = self.current_frame + self.framerate * dt;
        self.current_frame = if next > length {
            if looping {
                0.0
            } else {
                length
            }
        } else {
            next.max(0.0)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_format() {
        let project = Project::default();
        assert_eq!(project.format_frame_to_time(0.0), "00:00");
        assert_eq!(project.format_frame_to_time(90.0), "00:01");
        assert_eq!(project.format_frame_to_time(60.0 * 75.0), "01:15");
    }

    #[test]
    fn advance_wraps_or_clamps() {
        let mut project = Project::default();
        project.advance(0.5, 100.0, false);
        assert_eq!(project.current_frame, 30.0);
        project.advance(2.0, 100.0, false);
        assert_eq!(project.current_frame, 100.0);
        project.advance(0.1, 100.0, true);
        assert_eq!(project.current_frame, 0.0);
    }

    #[test]
    fn missing_keys_keep_defaults() {
        let project: Project = serde_json::from_str(r#"{ "Name": "Intro", "Framerate": 30 }"#).unwrap();
        assert_eq!(project.name, "Intro");
        assert_eq!(project.framerate, 30.0);
        assert_eq!(project.preferred_resolution, [1080, 1080]);
    }
}
