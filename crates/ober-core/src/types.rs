//! Core types for Ober

use crate::drm::DrmConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Layout of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aspect {
    /// Full controls
    #[default]
    Player,
    /// Fills the browser viewport
    Browser,
    /// Video only, no chrome
    Chromeless,
}

impl std::fmt::Display for Aspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aspect::Player => write!(f, "player"),
            Aspect::Browser => write!(f, "browser"),
            Aspect::Chromeless => write!(f, "chromeless"),
        }
    }
}

/// VAST/VMAP ad tags attached to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Vast {
    pub vast_url: Option<String>,
    pub vmap_url: Option<String>,
}

/// Viewer location required to play an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geolocation {
    pub country: String,
    pub region: String,
}

/// Hours of the day during which an entry may be watched, `HH:MM` local time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: String,
    pub to: String,
}

/// Viewing restrictions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Restrictions {
    /// Minimum viewer age, confirmed by the viewer
    pub age: Option<u8>,
    pub time: Option<TimeWindow>,
}

impl Restrictions {
    pub fn is_empty(&self) -> bool {
        self.age.is_none() && self.time.is_none()
    }
}

/// Availability window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Rights {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Title card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub image_url: String,
}

/// Jump button shown while the playhead is inside its window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoToButton {
    pub title: String,
    pub visible_from: f64,
    pub visible_until: f64,
    pub target_time: f64,
}

impl GoToButton {
    /// Inside `[visible_from, visible_until)`
    pub fn is_visible_at(&self, current_time: f64) -> bool {
        current_time >= self.visible_from && current_time < self.visible_until
    }
}

/// Button to show at `current_time`. On overlap the last listed button wins.
pub fn active_go_to_button(buttons: &[GoToButton], current_time: f64) -> Option<&GoToButton> {
    if !current_time.is_finite() {
        return None;
    }
    buttons.iter().rev().find(|button| button.is_visible_at(current_time))
}

/// One item of a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub video_url: String,
    /// Passed through to the engine configuration
    pub video_provider_options: Option<serde_json::Value>,
    pub autoplay: Option<bool>,
    pub volume: Option<f64>,
    pub muted: Option<bool>,
    pub aspect: Option<Aspect>,
    pub aspect_ratio: Option<String>,
    pub vast: Option<Vast>,
    pub rights: Option<Rights>,
    pub restrictions: Option<Restrictions>,
    pub geolocation: Option<Geolocation>,
    pub drm: Option<DrmConfig>,
    #[serde(default)]
    pub go_to_buttons: Vec<GoToButton>,
    pub thumbnails_vtt_url: Option<String>,
    pub chapters_vtt_url: Option<String>,
    pub metadata: Option<Metadata>,
}

impl PlaylistEntry {
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            ..Default::default()
        }
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = Some(autoplay);
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = Some(muted);
        self
    }

    pub fn with_drm(mut self, drm: DrmConfig) -> Self {
        self.drm = Some(drm);
        self
    }

    /// True when switching from `previous` to this entry needs a fresh load
    pub fn needs_reload_from(&self, previous: &PlaylistEntry) -> bool {
        self.video_url != previous.video_url
            || self.restrictions != previous.restrictions
            || self.geolocation != previous.geolocation
            || self.rights != previous.rights
            || self.autoplay != previous.autoplay
            || self.muted != previous.muted
    }
}
