//! Native media element events and their translation into player events

use crate::engine::MediaElement;
use crate::events::PlayerEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Events raised by the native media element and its container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaEvent {
    Abort,
    CanPlay,
    CanPlayThrough,
    DurationChange,
    Emptied,
    Ended,
    Error,
    LoadedData,
    LoadedMetadata,
    LoadStart,
    Pause,
    Play,
    Playing,
    Progress,
    RateChange,
    Seeked,
    Seeking,
    Stalled,
    Suspend,
    TimeUpdate,
    VolumeChange,
    Waiting,
    /// AirPlay target availability changed
    #[serde(rename = "webkitplaybacktargetavailabilitychanged")]
    PlaybackTargetAvailabilityChanged { available: bool },
    /// The widget container entered or left fullscreen
    #[serde(rename = "fullscreenchange", rename_all = "camelCase")]
    FullscreenChange { is_full_screen: bool },
}

impl MediaEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MediaEvent::Abort => "abort",
            MediaEvent::CanPlay => "canplay",
            MediaEvent::CanPlayThrough => "canplaythrough",
            MediaEvent::DurationChange => "durationchange",
            MediaEvent::Emptied => "emptied",
            MediaEvent::Ended => "ended",
            MediaEvent::Error => "error",
            MediaEvent::LoadedData => "loadeddata",
            MediaEvent::LoadedMetadata => "loadedmetadata",
            MediaEvent::LoadStart => "loadstart",
            MediaEvent::Pause => "pause",
            MediaEvent::Play => "play",
            MediaEvent::Playing => "playing",
            MediaEvent::Progress => "progress",
            MediaEvent::RateChange => "ratechange",
            MediaEvent::Seeked => "seeked",
            MediaEvent::Seeking => "seeking",
            MediaEvent::Stalled => "stalled",
            MediaEvent::Suspend => "suspend",
            MediaEvent::TimeUpdate => "timeupdate",
            MediaEvent::VolumeChange => "volumechange",
            MediaEvent::Waiting => "waiting",
            MediaEvent::PlaybackTargetAvailabilityChanged { .. } => "webkitplaybacktargetavailabilitychanged",
            MediaEvent::FullscreenChange { .. } => "fullscreenchange",
        }
    }
}

impl fmt::Display for MediaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn round_volume(volume: f64) -> f64 {
    (volume * 100.0).round() / 100.0
}

/// Stateful translation of native events.
///
/// Remembers the previous native event to drop spurious `seeking` right after
/// `loadedmetadata` and `time` right after `emptied` or `seeking`.
#[derive(Debug, Default)]
pub struct MediaEventMapper {
    video_url: String,
    last_event: Option<&'static str>,
    first_play_sent: HashSet<String>,
    metadata_on_time_sent: bool,
}

impl MediaEventMapper {
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            ..Default::default()
        }
    }

    /// Start a new load cycle
    pub fn reset(&mut self, video_url: impl Into<String>) {
        self.video_url = video_url.into();
        self.first_play_sent.clear();
        self.last_event = None;
    }

    /// Name of the last native event seen
    pub fn last_event(&self) -> Option<&'static str> {
        self.last_event
    }

    /// True while the media element is actually rendering frames
    pub fn was_playing(&self) -> bool {
        matches!(self.last_event, Some("playing") | Some("timeupdate"))
    }

    /// Translate one native event, reading live values from the element
    pub fn translate(&mut self, event: &MediaEvent, media: &dyn MediaElement) -> Vec<PlayerEvent> {
        let previous = self.last_event;
        let mut out = Vec::new();

        match event {
            MediaEvent::PlaybackTargetAvailabilityChanged { available } => {
                out.push(PlayerEvent::Airplay { available: *available });
            }
            MediaEvent::FullscreenChange { is_full_screen } => {
                out.push(PlayerEvent::Fullscreen {
                    is_full_screen: *is_full_screen,
                });
            }
            MediaEvent::VolumeChange => {
                out.push(PlayerEvent::Mute { muted: media.muted() });
                out.push(PlayerEvent::Volume {
                    volume: round_volume(media.volume()),
                });
            }
            MediaEvent::Pause => out.push(PlayerEvent::Pause),
            MediaEvent::Seeking => {
                if previous != Some("loadedmetadata") {
                    out.push(PlayerEvent::Seeking {
                        current_time: media.current_time(),
                        duration: media.duration(),
                    });
                }
            }
            MediaEvent::Seeked => out.push(PlayerEvent::Seeked {
                current_time: media.current_time(),
                duration: media.duration(),
            }),
            MediaEvent::Ended => {
                out.push(PlayerEvent::BeforeEnded);
                out.push(PlayerEvent::Ended);
            }
            MediaEvent::Waiting => out.push(PlayerEvent::Buffering),
            MediaEvent::CanPlayThrough => out.push(PlayerEvent::CanPlay),
            MediaEvent::Play => out.push(PlayerEvent::TryingToPlay),
            MediaEvent::Playing => {
                out.push(PlayerEvent::Play);
                if self.first_play_sent.insert(self.video_url.clone()) {
                    out.push(PlayerEvent::FirstPlay {
                        video_url: self.video_url.clone(),
                    });
                }
            }
            MediaEvent::TimeUpdate => {
                let duration = media.duration();
                if !self.metadata_on_time_sent && !duration.is_nan() {
                    self.metadata_on_time_sent = true;
                    out.push(PlayerEvent::Metadata { duration });
                }
                if !matches!(previous, Some("emptied") | Some("seeking")) {
                    out.push(PlayerEvent::Time {
                        current_time: media.current_time(),
                        duration,
                    });
                }
            }
            MediaEvent::LoadedMetadata => {
                out.extend(Self::snapshot(media));
            }
            _ => {}
        }

        self.last_event = Some(event.name());
        out
    }

    /// `mute`, `volume` and `metadata` as read from the element right now
    pub fn snapshot(media: &dyn MediaElement) -> Vec<PlayerEvent> {
        vec![
            PlayerEvent::Mute { muted: media.muted() },
            PlayerEvent::Volume { volume: media.volume() },
            PlayerEvent::Metadata {
                duration: media.duration(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMedia;

    #[test]
    fn test_seeking_after_loadedmetadata_is_dropped() {
        let media = MockMedia::new();
        let mut mapper = MediaEventMapper::new("a.mp4");

        let events = mapper.translate(&MediaEvent::LoadedMetadata, &media);
        assert_eq!(events.len(), 3);
        assert!(mapper.translate(&MediaEvent::Seeking, &media).is_empty());

        let events = mapper.translate(&MediaEvent::Seeking, &media);
        assert!(matches!(events[..], [PlayerEvent::Seeking { .. }]));
    }

    #[test]
    fn test_time_after_seeking_is_dropped() {
        let media = MockMedia::new();
        media.set_duration(60.0);
        let mut mapper = MediaEventMapper::new("a.mp4");

        mapper.translate(&MediaEvent::Play, &media);
        mapper.translate(&MediaEvent::Seeking, &media);
        let events = mapper.translate(&MediaEvent::TimeUpdate, &media);
        assert_eq!(events, vec![PlayerEvent::Metadata { duration: 60.0 }]);

        let events = mapper.translate(&MediaEvent::TimeUpdate, &media);
        assert!(matches!(events[..], [PlayerEvent::Time { duration, .. }] if duration == 60.0));
    }

    #[test]
    fn test_first_play_once_per_url() {
        let media = MockMedia::new();
        let mut mapper = MediaEventMapper::new("a.mp4");

        assert_eq!(mapper.translate(&MediaEvent::Playing, &media).len(), 2);
        assert_eq!(mapper.translate(&MediaEvent::Playing, &media).len(), 1);

        mapper.reset("a.mp4");
        assert_eq!(
            mapper.translate(&MediaEvent::Playing, &media),
            vec![
                PlayerEvent::Play,
                PlayerEvent::FirstPlay {
                    video_url: "a.mp4".to_string()
                }
            ]
        );
    }

    #[test]
    fn test_volume_is_rounded() {
        let media = MockMedia::new();
        media.set_volume(0.123456);
        let mut mapper = MediaEventMapper::new("a.mp4");

        let events = mapper.translate(&MediaEvent::VolumeChange, &media);
        assert_eq!(events[1], PlayerEvent::Volume { volume: 0.12 });
    }

    #[test]
    fn test_ended_emits_beforeended_first() {
        let media = MockMedia::new();
        let mut mapper = MediaEventMapper::new("a.mp4");

        assert_eq!(
            mapper.translate(&MediaEvent::Ended, &media),
            vec![PlayerEvent::BeforeEnded, PlayerEvent::Ended]
        );
    }

    #[test]
    fn test_was_playing_tracks_last_event() {
        let media = MockMedia::new();
        let mut mapper = MediaEventMapper::new("a.mp4");

        mapper.translate(&MediaEvent::Playing, &media);
        assert!(mapper.was_playing());
        mapper.translate(&MediaEvent::Pause, &media);
        assert!(!mapper.was_playing());
    }

    #[test]
    fn test_media_event_json_names() {
        let event: MediaEvent = serde_json::from_str(r#"{"type":"canplaythrough"}"#).unwrap();
        assert_eq!(event, MediaEvent::CanPlayThrough);

        let event: MediaEvent =
            serde_json::from_str(r#"{"type":"fullscreenchange","isFullScreen":true}"#).unwrap();
        assert_eq!(event.name(), "fullscreenchange");
    }
}
