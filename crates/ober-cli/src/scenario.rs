//! Scenario files for `simulate`

use ober_core::{ClickTarget, MediaEvent, Platform, PlayerOptions, TrackSnapshot};
use serde::Deserialize;

/// A setup plus a list of steps to replay
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub options: PlayerOptions,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default = "default_width")]
    pub width: f64,
    /// Tracks the engine reports
    #[serde(default)]
    pub tracks: TrackSnapshot,
    #[serde(default)]
    pub live: bool,
    /// Raw JSON of the host element's data attribute
    pub data_options: Option<serde_json::Value>,
    pub steps: Vec<Step>,
}

fn default_width() -> f64 {
    640.0
}

/// One viewer, page or media action
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Step {
    /// Native media element event, e.g. `{"type": "playing"}`
    Media { event: MediaEvent },
    /// Duration the media element reports from now on
    Duration { seconds: f64 },
    /// Playback advanced on its own
    Position { seconds: f64 },
    Click { target: ClickTarget },
    DoubleClick { target: ClickTarget },
    /// DOM `KeyboardEvent.key`
    Key { key: String },
    /// Let time pass, then fire due timers
    Wait { ms: u64 },
    Play,
    Pause,
    Seek { seconds: f64 },
    Volume { volume: f64 },
    Resize { width: f64 },
    VideoTrack { id: String },
    PostRoll { pending: bool },
    StartAd,
    LoadAd { url: String },
    EndAd,
    Next,
    Previous,
    AcceptAge,
    DeclineAge,
}

impl Step {
    /// Short label for the step table
    pub fn label(&self) -> String {
        match self {
            Step::Media { event } => format!("media {}", event),
            Step::Duration { seconds } => format!("duration {}", seconds),
            Step::Position { seconds } => format!("position {}", seconds),
            Step::Click { target } => format!("click {:?}", target),
            Step::DoubleClick { target } => format!("dblclick {:?}", target),
            Step::Key { key } => format!("key {}", key),
            Step::Wait { ms } => format!("wait {}ms", ms),
            Step::Play => "play".to_string(),
            Step::Pause => "pause".to_string(),
            Step::Seek { seconds } => format!("seek {}", seconds),
            Step::Volume { volume } => format!("volume {}", volume),
            Step::Resize { width } => format!("resize {}", width),
            Step::VideoTrack { id } => format!("video track {}", id),
            Step::PostRoll { pending } => format!("post-roll {}", pending),
            Step::StartAd => "start ad".to_string(),
            Step::LoadAd { url } => format!("load ad {}", url),
            Step::EndAd => "end ad".to_string(),
            Step::Next => "next".to_string(),
            Step::Previous => "previous".to_string(),
            Step::AcceptAge => "accept age".to_string(),
            Step::DeclineAge => "decline age".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let json = r#"{
            "options": { "playlist": [{ "videoUrl": "a.mp4", "autoplay": false }] },
            "steps": [
                { "step": "click", "target": "clickCatcher" },
                { "step": "wait", "ms": 300 },
                { "step": "media", "event": { "type": "playing" } },
                { "step": "key", "key": "ArrowRight" }
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.width, 640.0);
        assert_eq!(scenario.options.playlist.len(), 1);
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(scenario.steps[1].label(), "wait 300ms");
        assert!(matches!(
            scenario.steps[2],
            Step::Media {
                event: MediaEvent::Playing
            }
        ));
    }
}
