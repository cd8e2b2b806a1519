//! Interaction layer boundary
//!
//! The UI shell reports what the viewer did in these terms; the player decides
//! what it means.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element a click or tap landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClickTarget {
    /// Transparent layer over the video
    ClickCatcher,
    /// Big play/pause icon
    PlayIcon,
    /// Replay icon shown at the end
    CompleteIcon,
    /// Timeline rail
    Rail,
    /// Slider knob and track
    RangeSlider,
    /// Control bar buttons
    ControlButtons,
    /// Ad skip affordance
    Skip,
    Other,
}

impl ClickTarget {
    /// Targets that still act on touch devices without the first tap revealing controls
    pub fn accepts_touch(&self) -> bool {
        matches!(self, ClickTarget::PlayIcon | ClickTarget::CompleteIcon | ClickTarget::Rail)
    }

    pub fn is_timeline(&self) -> bool {
        matches!(self, ClickTarget::Rail | ClickTarget::RangeSlider)
    }
}

/// What a click turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClickOutcome {
    Ignored,
    /// Release of a drag that started paused
    DragReleaseConsumed,
    /// Release of a drag that started playing
    ForcedPlay,
    SettingsClosed,
    /// Play/pause toggle pending until the debounce expires
    ToggleScheduled,
}

/// Keyboard keys the player reacts to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Mute,
    Fullscreen,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "m" => Key::Mute,
            "f" => Key::Fullscreen,
            " " | "Spacebar" => Key::Space,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            other => Key::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Mute => write!(f, "m"),
            Key::Fullscreen => write!(f, "f"),
            Key::Space => write!(f, "Space"),
            Key::ArrowUp => write!(f, "ArrowUp"),
            Key::ArrowDown => write!(f, "ArrowDown"),
            Key::ArrowLeft => write!(f, "ArrowLeft"),
            Key::ArrowRight => write!(f, "ArrowRight"),
            Key::Other(key) => f.write_str(key),
        }
    }
}

/// Focus at the time of a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFocus {
    /// Focus is inside the widget
    pub within_widget: bool,
    /// The focused element is a button, which handles Space itself
    pub on_button: bool,
}

impl KeyFocus {
    pub fn widget() -> Self {
        Self {
            within_widget: true,
            on_button: false,
        }
    }
}
