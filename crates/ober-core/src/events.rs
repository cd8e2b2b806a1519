//! Player events
//!
//! Every state change travels over the [`EventBus`](crate::bus::EventBus) as a
//! [`BusEvent`]: a typed [`PlayerEvent`] plus the [`EventSource`] that produced
//! it. Ad content and main content share event types and are told apart by the
//! source, which also gives the public event name its `ad` prefix
//! (`play` / `adplay`).

use crate::engine::EngineError;
use crate::tracks::{AudioTrack, QualityFlags, TextTrack, VideoTrack};
use crate::types::PlaylistEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which content an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    #[default]
    Main,
    Ad,
}

impl EventSource {
    pub fn is_ad(&self) -> bool {
        matches!(self, EventSource::Ad)
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Main => write!(f, "main"),
            EventSource::Ad => write!(f, "ad"),
        }
    }
}

/// Event payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase", rename_all_fields = "camelCase")]
#[non_exhaustive]
pub enum PlayerEvent {
    /// Media element started playing
    Play,
    /// First `play` for a video url in a load cycle
    FirstPlay { video_url: String },
    /// Playback was requested
    TryingToPlay,
    CanPlay,
    Pause,
    Airplay { available: bool },
    Cast { active: bool },
    Fullscreen { is_full_screen: bool },
    Volume { volume: f64 },
    Mute { muted: bool },
    Seeking { current_time: f64, duration: f64 },
    Seeked { current_time: f64, duration: f64 },
    Ended,
    BeforeEnded,
    Buffering,
    Time { current_time: f64, duration: f64 },
    Metadata { duration: f64 },
    AudioTracks { audio_tracks: Vec<AudioTrack> },
    AudioTrackAsked { language: String, role: Option<String> },
    TextTracks { text_tracks: Vec<TextTrack> },
    /// Language and roles are absent for forced tracks
    TextTrackAsked { language: Option<String>, roles: Option<Vec<String>> },
    VideoTracks { video_tracks: Vec<VideoTrack> },
    VideoTrackChanged { hd: bool, uhd: bool, hdr: bool },
    VideoTrackAsked {
        abr: bool,
        width: Option<u32>,
        height: Option<u32>,
        bandwidth: Option<u64>,
    },
    VideoType { is_live: bool },
    Ready,
    Next { coming_from_click: bool },
    Previous { coming_from_click: bool },
    Load { playlist_item: Box<PlaylistEntry> },
    Setup,
    ClickCtaVast { url: Option<String> },
    Error { error: EngineError },
    AdStart,
    ReadyForPreroll,
    ReadyForPostroll,
}

impl PlayerEvent {
    pub fn video_track_changed(flags: QualityFlags) -> Self {
        PlayerEvent::VideoTrackChanged {
            hd: flags.hd,
            uhd: flags.uhd,
            hdr: flags.hdr,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            PlayerEvent::Play => EventKind::Play,
            PlayerEvent::FirstPlay { .. } => EventKind::FirstPlay,
            PlayerEvent::TryingToPlay => EventKind::TryingToPlay,
            PlayerEvent::CanPlay => EventKind::CanPlay,
            PlayerEvent::Pause => EventKind::Pause,
            PlayerEvent::Airplay { .. } => EventKind::Airplay,
            PlayerEvent::Cast { .. } => EventKind::Cast,
            PlayerEvent::Fullscreen { .. } => EventKind::Fullscreen,
            PlayerEvent::Volume { .. } => EventKind::Volume,
            PlayerEvent::Mute { .. } => EventKind::Mute,
            PlayerEvent::Seeking { .. } => EventKind::Seeking,
            PlayerEvent::Seeked { .. } => EventKind::Seeked,
            PlayerEvent::Ended => EventKind::Ended,
            PlayerEvent::BeforeEnded => EventKind::BeforeEnded,
            PlayerEvent::Buffering => EventKind::Buffering,
            PlayerEvent::Time { .. } => EventKind::Time,
            PlayerEvent::Metadata { .. } => EventKind::Metadata,
            PlayerEvent::AudioTracks { .. } => EventKind::AudioTracks,
            PlayerEvent::AudioTrackAsked { .. } => EventKind::AudioTrackAsked,
            PlayerEvent::TextTracks { .. } => EventKind::TextTracks,
            PlayerEvent::TextTrackAsked { .. } => EventKind::TextTrackAsked,
            PlayerEvent::VideoTracks { .. } => EventKind::VideoTracks,
            PlayerEvent::VideoTrackChanged { .. } => EventKind::VideoTrackChanged,
            PlayerEvent::VideoTrackAsked { .. } => EventKind::VideoTrackAsked,
            PlayerEvent::VideoType { .. } => EventKind::VideoType,
            PlayerEvent::Ready => EventKind::Ready,
            PlayerEvent::Next { .. } => EventKind::Next,
            PlayerEvent::Previous { .. } => EventKind::Previous,
            PlayerEvent::Load { .. } => EventKind::Load,
            PlayerEvent::Setup => EventKind::Setup,
            PlayerEvent::ClickCtaVast { .. } => EventKind::ClickCtaVast,
            PlayerEvent::Error { .. } => EventKind::Error,
            PlayerEvent::AdStart => EventKind::AdStart,
            PlayerEvent::ReadyForPreroll => EventKind::ReadyForPreroll,
            PlayerEvent::ReadyForPostroll => EventKind::ReadyForPostroll,
        }
    }
}

/// Event type without payload, used for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Play,
    FirstPlay,
    TryingToPlay,
    CanPlay,
    Pause,
    Airplay,
    Cast,
    Fullscreen,
    Volume,
    Mute,
    Seeking,
    Seeked,
    Ended,
    BeforeEnded,
    Buffering,
    Time,
    Metadata,
    AudioTracks,
    AudioTrackAsked,
    TextTracks,
    TextTrackAsked,
    VideoTracks,
    VideoTrackChanged,
    VideoTrackAsked,
    VideoType,
    Ready,
    Next,
    Previous,
    Load,
    Setup,
    ClickCtaVast,
    Error,
    AdStart,
    ReadyForPreroll,
    ReadyForPostroll,
}

impl EventKind {
    pub const ALL: [EventKind; 35] = [
        EventKind::Play,
        EventKind::FirstPlay,
        EventKind::TryingToPlay,
        EventKind::CanPlay,
        EventKind::Pause,
        EventKind::Airplay,
        EventKind::Cast,
        EventKind::Fullscreen,
        EventKind::Volume,
        EventKind::Mute,
        EventKind::Seeking,
        EventKind::Seeked,
        EventKind::Ended,
        EventKind::BeforeEnded,
        EventKind::Buffering,
        EventKind::Time,
        EventKind::Metadata,
        EventKind::AudioTracks,
        EventKind::AudioTrackAsked,
        EventKind::TextTracks,
        EventKind::TextTrackAsked,
        EventKind::VideoTracks,
        EventKind::VideoTrackChanged,
        EventKind::VideoTrackAsked,
        EventKind::VideoType,
        EventKind::Ready,
        EventKind::Next,
        EventKind::Previous,
        EventKind::Load,
        EventKind::Setup,
        EventKind::ClickCtaVast,
        EventKind::Error,
        EventKind::AdStart,
        EventKind::ReadyForPreroll,
        EventKind::ReadyForPostroll,
    ];

    /// Public event name
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Play => "play",
            EventKind::FirstPlay => "firstplay",
            EventKind::TryingToPlay => "tryingtoplay",
            EventKind::CanPlay => "canplay",
            EventKind::Pause => "pause",
            EventKind::Airplay => "airplay",
            EventKind::Cast => "cast",
            EventKind::Fullscreen => "fullscreen",
            EventKind::Volume => "volume",
            EventKind::Mute => "mute",
            EventKind::Seeking => "seeking",
            EventKind::Seeked => "seeked",
            EventKind::Ended => "ended",
            EventKind::BeforeEnded => "beforeended",
            EventKind::Buffering => "buffering",
            EventKind::Time => "time",
            EventKind::Metadata => "metadata",
            EventKind::AudioTracks => "audiotracks",
            EventKind::AudioTrackAsked => "audiotrackasked",
            EventKind::TextTracks => "texttracks",
            EventKind::TextTrackAsked => "texttrackasked",
            EventKind::VideoTracks => "videotracks",
            EventKind::VideoTrackChanged => "videotrackchanged",
            EventKind::VideoTrackAsked => "videotrackasked",
            EventKind::VideoType => "videotype",
            EventKind::Ready => "ready",
            EventKind::Next => "next",
            EventKind::Previous => "previous",
            EventKind::Load => "load",
            EventKind::Setup => "setup",
            EventKind::ClickCtaVast => "clickctavast",
            EventKind::Error => "error",
            EventKind::AdStart => "adstart",
            EventKind::ReadyForPreroll => "readyforpreroll",
            EventKind::ReadyForPostroll => "readyforpostroll",
        }
    }

    /// Name on the given channel: `pause` or `adpause`
    pub fn channel_name(&self, source: EventSource) -> String {
        match source {
            EventSource::Main => self.name().to_string(),
            EventSource::Ad => format!("ad{}", self.name()),
        }
    }

    /// Resolve a channel name back to a kind and source
    pub fn parse_channel(name: &str) -> Option<(EventKind, EventSource)> {
        let lookup = |name: &str| EventKind::ALL.into_iter().find(|kind| kind.name() == name);

        if let Some(kind) = lookup(name) {
            return Some((kind, EventSource::Main));
        }
        name.strip_prefix("ad")
            .and_then(lookup)
            .map(|kind| (kind, EventSource::Ad))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event as dispatched on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    pub source: EventSource,
    pub event: PlayerEvent,
}

impl BusEvent {
    pub fn new(source: EventSource, event: PlayerEvent) -> Self {
        Self { source, event }
    }

    pub fn main(event: PlayerEvent) -> Self {
        Self::new(EventSource::Main, event)
    }

    pub fn ad(event: PlayerEvent) -> Self {
        Self::new(EventSource::Ad, event)
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    pub fn is_ad(&self) -> bool {
        self.source.is_ad()
    }

    /// Channel name, `ad`-prefixed for ad content
    pub fn name(&self) -> String {
        self.kind().channel_name(self.source)
    }

    /// Payload as delivered on the wildcard channel: the event detail with its channel name
    pub fn to_detail(&self) -> serde_json::Value {
        let mut detail = serde_json::to_value(&self.event).unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(map) = &mut detail {
            map.insert("name".to_string(), serde_json::Value::String(self.name()));
        }
        detail
    }
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(BusEvent::main(PlayerEvent::Pause).name(), "pause");
        assert_eq!(BusEvent::ad(PlayerEvent::Pause).name(), "adpause");
        assert_eq!(BusEvent::ad(PlayerEvent::Volume { volume: 0.2 }).name(), "advolume");
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(EventKind::parse_channel("adplay"), Some((EventKind::Play, EventSource::Ad)));
        assert_eq!(EventKind::parse_channel("adstart"), Some((EventKind::AdStart, EventSource::Main)));
        assert_eq!(EventKind::parse_channel("beforeended"), Some((EventKind::BeforeEnded, EventSource::Main)));
        assert_eq!(EventKind::parse_channel("nope"), None);
    }

    #[test]
    fn test_kind_names_match_serde_tags() {
        for kind in EventKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.name().to_string()));
        }
    }

    #[test]
    fn test_wildcard_detail() {
        let event = BusEvent::ad(PlayerEvent::Time {
            current_time: 3.5,
            duration: 30.0,
        });
        let detail = event.to_detail();

        assert_eq!(detail["name"], "adtime");
        assert_eq!(detail["currentTime"], 3.5);
        assert_eq!(detail["duration"], 30.0);
    }

    #[test]
    fn test_event_json_roundtrip_keeps_payload() {
        let json = r#"{"name":"next","comingFromClick":true}"#;
        let event: PlayerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, PlayerEvent::Next { coming_from_click: true });
    }
}
