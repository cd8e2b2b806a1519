//! Streaming engine and media element boundary
//!
//! The adaptive-streaming engine (manifest parsing, ABR, DRM) and the native
//! media element are external collaborators. This module defines the traits
//! the provider adapter drives them through, and the tagged error the engine
//! reports at that boundary.

use crate::drm::RequestFilter;
use crate::tracks::{RawAudioTrack, RawTextTrack, TrackSnapshot, Variant};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Engine code for a load interrupted by another load. Never shown to viewers.
pub const LOAD_INTERRUPTED: u32 = 7000;

/// Severity reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineErrorKind {
    Recoverable,
    Critical,
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineErrorKind::Recoverable => write!(f, "recoverable"),
            EngineErrorKind::Critical => write!(f, "critical"),
        }
    }
}

/// Error reported by the streaming engine, translated at the adapter boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message} (code {code}, {kind})")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    /// Engine error category (network, text, media, manifest, drm, ...)
    #[serde(default)]
    pub category: u32,
    pub code: u32,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, category: u32, code: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            category,
            code,
            message: message.into(),
        }
    }

    /// Only critical errors other than an interrupted load reach the viewer.
    pub fn is_user_visible(&self) -> bool {
        self.kind == EngineErrorKind::Critical && self.code != LOAD_INTERRUPTED
    }
}

/// Signals raised by the engine outside of the media element's own events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineEvent {
    /// ABR switched variant
    Adaptation,
    /// A variant was selected manually
    VariantChanged,
}

/// Playback request refused by the media element (autoplay policy, no source)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("play() rejected: {reason}")]
pub struct PlayRejected {
    pub reason: String,
}

impl PlayRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Native media element handle.
///
/// Methods take `&self`: the element is a shared host object and the adapter,
/// the player and the host all hold a handle to it.
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Start playback; resolves once the element accepted the request
    async fn play(&self) -> std::result::Result<(), PlayRejected>;

    fn pause(&self);

    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    /// Duration in seconds, NaN while unknown, infinite for live streams
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    fn muted(&self) -> bool;

    fn set_muted(&self, muted: bool);

    fn set_playback_rate(&self, rate: f64);

    /// Open the AirPlay target picker, when the platform has one
    fn show_playback_target_picker(&self) {}
}

/// Adaptive-streaming engine bound to one media element
#[async_trait]
pub trait StreamingEngine: Send {
    fn is_browser_supported(&self) -> bool {
        true
    }

    /// Merge a configuration tree into the engine configuration
    fn configure(&mut self, config: serde_json::Value);

    fn reset_configuration(&mut self);

    fn register_request_filter(&mut self, filter: RequestFilter);

    fn clear_request_filters(&mut self);

    async fn load(&mut self, url: &str) -> std::result::Result<(), EngineError>;

    /// Release the current source, keep the engine
    async fn detach(&mut self) -> std::result::Result<(), EngineError>;

    async fn unload(&mut self) -> std::result::Result<(), EngineError>;

    async fn destroy(&mut self) -> std::result::Result<(), EngineError>;

    fn is_live(&self) -> bool;

    fn abr_enabled(&self) -> bool;

    fn variant_tracks(&self) -> Vec<Variant>;

    fn text_tracks(&self) -> Vec<RawTextTrack>;

    /// Distinct language/role pairs of the audio streams
    fn audio_languages_and_roles(&self) -> Vec<RawAudioTrack>;

    fn select_variant_track(&mut self, variant: &Variant, clear_buffer: bool);

    fn select_audio_language(&mut self, language: &str, role: Option<&str>);

    fn select_text_language(&mut self, language: &str, role: Option<&str>, forced: bool);

    fn set_text_track_visibility(&mut self, visible: bool);

    /// Symbolic name of an error code, e.g. `HTTP_ERROR`
    fn error_code_name(&self, _code: u32) -> Option<String> {
        None
    }

    /// Everything the normalizer needs, read in one go
    fn track_snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            variants: self.variant_tracks(),
            audio: self.audio_languages_and_roles(),
            text: self.text_tracks(),
            abr_enabled: self.abr_enabled(),
        }
    }
}

/// Builds an engine for a media element
pub trait EngineFactory: Send + Sync {
    fn create_engine(&self, media: Arc<dyn MediaElement>) -> Box<dyn StreamingEngine>;
}
