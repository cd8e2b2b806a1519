//! Setup options, widget defaults and interaction timings

use crate::error::{Error, Result};
use crate::i18n::Locale;
use crate::types::{Aspect, PlaylistEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Where the stylesheet is fetched from when the host does not say otherwise
pub const DEFAULT_CDN_BASE_URL: &str = "https://cdn.oberplayer.com";

/// Options passed to `setup`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerOptions {
    #[serde(default)]
    pub playlist: Vec<PlaylistEntry>,
    pub lang: Option<String>,
    /// Phrase overrides, keyed like the built-in catalog
    pub phrases: Option<HashMap<String, String>>,
    #[serde(default)]
    pub debug: bool,
    pub token: Option<String>,
    /// Accent color of the controls
    pub color: Option<String>,
    #[serde(rename = "chromecast_receiver_id")]
    pub chromecast_receiver_id: Option<String>,
    pub cdn_base_url: Option<String>,
}

impl PlayerOptions {
    pub fn new(playlist: Vec<PlaylistEntry>) -> Self {
        Self {
            playlist,
            ..Default::default()
        }
    }

    /// Merge options found in the host element's data attribute with the ones
    /// passed to `setup`. Top-level keys given to `setup` win.
    pub fn merged(data_attribute: Option<&str>, options: &PlayerOptions) -> Result<PlayerOptions> {
        let Some(raw) = data_attribute.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(options.clone());
        };

        let mut base = match serde_json::from_str::<serde_json::Value>(raw)? {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(Error::config(format!(
                    "data attribute options must be a JSON object, got {}",
                    other
                )))
            }
        };

        if let serde_json::Value::Object(overrides) = serde_json::to_value(options)? {
            for (key, value) in overrides {
                let empty = value.is_null()
                    || (key == "playlist" && value.as_array().is_some_and(Vec::is_empty))
                    || (key == "debug" && value == serde_json::Value::Bool(false));
                if !empty {
                    base.insert(key, value);
                }
            }
        }

        Ok(serde_json::from_value(serde_json::Value::Object(base))?)
    }

    /// Interface language, English when missing or unsupported
    pub fn locale(&self) -> Locale {
        self.lang.as_deref().map(Locale::from_lang).unwrap_or_default()
    }

    pub fn stylesheet_url(&self) -> String {
        let base = self.cdn_base_url.as_deref().unwrap_or(DEFAULT_CDN_BASE_URL);
        format!("{}/oberplayer.css", base.trim_end_matches('/'))
    }
}

/// Widget defaults applied when an entry leaves a field out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDefaults {
    pub autoplay: bool,
    pub volume: f64,
    pub muted: bool,
    pub aspect: Aspect,
    pub aspect_ratio: String,
    pub lang: Locale,
}

impl Default for PlayerDefaults {
    fn default() -> Self {
        Self {
            autoplay: false,
            volume: 0.5,
            muted: false,
            aspect: Aspect::Player,
            aspect_ratio: "16:9".to_string(),
            lang: Locale::En,
        }
    }
}

/// Playback settings of one entry with defaults filled in
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySettings {
    pub autoplay: bool,
    pub volume: f64,
    pub muted: bool,
    pub aspect: Aspect,
    pub aspect_ratio: String,
}

impl EntrySettings {
    pub fn resolve(entry: &PlaylistEntry, defaults: &PlayerDefaults) -> Self {
        Self {
            autoplay: entry.autoplay.unwrap_or(defaults.autoplay),
            volume: entry.volume.unwrap_or(defaults.volume).clamp(0.0, 1.0),
            muted: entry.muted.unwrap_or(defaults.muted),
            aspect: entry.aspect.unwrap_or(defaults.aspect),
            aspect_ratio: entry
                .aspect_ratio
                .clone()
                .unwrap_or_else(|| defaults.aspect_ratio.clone()),
        }
    }
}

/// Debounce delays and interaction constants
#[derive(Debug, Clone, PartialEq)]
pub struct Timings {
    /// Wait before a `buffering` signal is shown
    pub buffering_grace: Duration,
    /// Delay between a click and the play/pause toggle, to leave room for a double click
    pub click_debounce: Duration,
    /// Same delay on touch devices
    pub touch_click_debounce: Duration,
    /// Pointer inactivity before controls hide
    pub controls_auto_hide: Duration,
    /// Delay after a touch start before taps are accepted
    pub touch_click_rearm: Duration,
    pub stylesheet_timeout: Duration,
    /// Widths below this switch to the compact layout
    pub compact_width: f64,
    /// Seconds moved by ArrowLeft/ArrowRight
    pub seek_step: f64,
    /// Volume moved by ArrowUp/ArrowDown
    pub volume_step: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            buffering_grace: Duration::from_millis(500),
            click_debounce: Duration::from_millis(300),
            touch_click_debounce: Duration::ZERO,
            controls_auto_hide: Duration::from_millis(2000),
            touch_click_rearm: Duration::from_millis(300),
            stylesheet_timeout: Duration::from_secs(5),
            compact_width: 520.0,
            seek_step: 10.0,
            volume_step: 0.1,
        }
    }
}
