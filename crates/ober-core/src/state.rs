//! Playback and UI state
//!
//! [`PlaybackState`] is written by the player only. Everything the UI shell
//! renders is derived from it: the [`Phase`] and the container class list.

use crate::tracks::{AudioTrack, QualityFlags, TextTrack, VideoTrack};
use crate::types::{Aspect, GoToButton};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse playback phase shown by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Metadata loaded, nothing played yet
    Ready,
    WaitingForClick,
    Playing,
    Paused,
    Seeking,
    Buffering,
    Complete,
    AdPlaying,
    /// A notice covers the video
    MessageBlocking,
    /// A critical error notice covers the video
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Ready => write!(f, "ready"),
            Phase::WaitingForClick => write!(f, "waiting-for-click"),
            Phase::Playing => write!(f, "playing"),
            Phase::Paused => write!(f, "paused"),
            Phase::Seeking => write!(f, "seeking"),
            Phase::Buffering => write!(f, "buffering"),
            Phase::Complete => write!(f, "complete"),
            Phase::AdPlaying => write!(f, "ad-playing"),
            Phase::MessageBlocking => write!(f, "message-blocking"),
            Phase::Error => write!(f, "error"),
        }
    }
}

/// State reported by `getState()`, following the media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiState {
    #[default]
    Paused,
    Playing,
    Buffering,
    Ended,
}

impl fmt::Display for ApiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiState::Paused => write!(f, "paused"),
            ApiState::Playing => write!(f, "playing"),
            ApiState::Buffering => write!(f, "buffering"),
            ApiState::Ended => write!(f, "ended"),
        }
    }
}

/// Icon of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageIcon {
    Error,
    Lock,
    Clock,
}

/// Notice shown over the video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub icon: Option<MessageIcon>,
    pub text: String,
}

impl Message {
    pub fn new(icon: Option<MessageIcon>, text: impl Into<String>) -> Self {
        Self {
            icon,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Some(MessageIcon::Error), text)
    }

    pub fn is_error(&self) -> bool {
        self.icon == Some(MessageIcon::Error)
    }
}

/// Player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub is_ad_player: bool,
    pub is_paused: bool,
    pub is_waiting_for_click: bool,
    /// Metadata arrived
    pub is_ready: bool,
    pub is_full_screen: bool,
    pub is_playing: bool,
    pub is_seeking: bool,
    pub is_buffering: bool,
    pub is_complete: bool,
    pub is_live: bool,
    pub is_chromecasting: bool,
    pub is_dragging: bool,
    pub is_settings_open: bool,
    pub is_controls_visible: bool,
    /// Compact layout
    pub is_small: bool,
    pub is_hovered: bool,
    pub is_stylesheet_loaded: bool,
    pub is_muted: bool,
    pub is_airplay_available: bool,
    /// The notice sits under the click catcher and does not stop clicks
    pub is_message_under_click_catcher: bool,
    pub volume: f64,
    /// Main content duration in seconds, 0 while unknown
    pub duration: f64,
    /// Main content position; frozen during ad breaks
    pub current_time: f64,
    pub ad_duration: f64,
    pub ad_current_time: f64,
    /// Autoplay in effect for the next load
    pub autoplay: bool,
    /// Main content position to seek back to after an ad break
    pub resume_position: Option<f64>,
    pub message: Option<Message>,
    pub go_to_button: Option<GoToButton>,
    pub api_state: ApiState,
    pub quality: QualityFlags,
    pub video_tracks: Vec<VideoTrack>,
    pub audio_tracks: Vec<AudioTrack>,
    pub text_tracks: Vec<TextTrack>,
    pub active_video_variant: Option<VideoTrack>,
    pub active_audio_track: Option<AudioTrack>,
    pub active_text_track: Option<TextTrack>,
}

impl PlaybackState {
    /// Initial state for an entry
    pub fn new(autoplay: bool, muted: bool, volume: f64) -> Self {
        Self {
            is_ad_player: false,
            is_paused: true,
            is_waiting_for_click: !autoplay,
            is_ready: false,
            is_full_screen: false,
            is_playing: false,
            is_seeking: false,
            is_buffering: autoplay,
            is_complete: false,
            is_live: false,
            is_chromecasting: false,
            is_dragging: false,
            is_settings_open: false,
            is_controls_visible: false,
            is_small: false,
            is_hovered: false,
            is_stylesheet_loaded: false,
            is_muted: muted,
            is_airplay_available: false,
            is_message_under_click_catcher: false,
            volume,
            duration: 0.0,
            current_time: 0.0,
            ad_duration: 0.0,
            ad_current_time: 0.0,
            autoplay,
            resume_position: None,
            message: None,
            go_to_button: None,
            api_state: ApiState::Paused,
            quality: QualityFlags::default(),
            video_tracks: Vec::new(),
            audio_tracks: Vec::new(),
            text_tracks: Vec::new(),
            active_video_variant: None,
            active_audio_track: None,
            active_text_track: None,
        }
    }

    pub fn is_message(&self) -> bool {
        self.message.is_some()
    }

    /// Derive the phase. The first matching rule wins.
    pub fn phase(&self) -> Phase {
        match &self.message {
            Some(message) if message.is_error() => return Phase::Error,
            Some(_) => return Phase::MessageBlocking,
            None => {}
        }

        if self.is_ad_player {
            Phase::AdPlaying
        } else if self.is_seeking {
            Phase::Seeking
        } else if self.is_buffering && !self.is_waiting_for_click {
            Phase::Buffering
        } else if self.is_complete {
            Phase::Complete
        } else if self.is_waiting_for_click {
            Phase::WaitingForClick
        } else if self.is_playing {
            Phase::Playing
        } else if self.is_ready && self.current_time <= 0.0 {
            Phase::Ready
        } else {
            Phase::Paused
        }
    }

    /// Container classes, e.g. `is--playing`
    pub fn class_list(&self, aspect: Aspect, is_touch_device: bool) -> Vec<String> {
        let flags = [
            (aspect != Aspect::Player, "chromeless"),
            (self.is_ad_player, "adplayer"),
            (is_touch_device, "touchdevice"),
            (self.is_stylesheet_loaded, "stylesheetloaded"),
            (self.is_small, "small"),
            (self.is_waiting_for_click, "waitingforclick"),
            (self.is_ready, "ready"),
            (self.is_paused, "paused"),
            (self.is_full_screen, "fullscreen"),
            (self.is_playing, "playing"),
            (self.is_seeking, "seeking"),
            (self.is_buffering, "buffering"),
            (self.is_complete, "complete"),
            (self.is_live, "live"),
            (self.is_controls_visible, "controlsvisible"),
            (self.is_dragging, "dragging"),
            (self.is_chromecasting, "chromecasting"),
            (self.is_message(), "message"),
            (self.is_message_under_click_catcher, "messageunderclickcatcher"),
        ];

        let mut classes: Vec<String> = flags
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| format!("is--{}", name))
            .collect();
        classes.push(format!("v{}", crate::VERSION.replace('.', "_")));
        classes
    }

    /// Refresh the active tracks from the current lists
    pub(crate) fn sync_active_tracks(&mut self) {
        self.active_video_variant = self.video_tracks.iter().find(|t| t.selected).cloned();
        self.active_audio_track = self.audio_tracks.iter().find(|t| t.selected).cloned();
        self.active_text_track = self.text_tracks.iter().find(|t| t.selected).cloned();
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(false, false, 0.5)
    }
}
