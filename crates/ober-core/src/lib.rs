//! Ober Core - Playback orchestration for an embeddable video widget
//!
//! This crate provides the logic between a page's media element, a streaming
//! engine and the widget UI:
//! - Typed event bus with main and ad channels
//! - Streaming engine adapter (DRM, tracks, autoplay with muted fallback)
//! - Track and quality normalization for the settings menu
//! - Player state machine and control API
//! - Interaction handling (click debounce, keys, drag, auto-hiding controls)
//! - Linear ad breaks and playlist navigation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Ober Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │   Playlist   │  │   Ad-Break   │  │ Interaction  │          │
//! │  │  Controller  │  │  Controller  │  │    Layer     │          │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘          │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Player    │                              │
//! │                    │   Session   │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐           │
//! │  │    Track     │  │    Event    │  │   Provider   │           │
//! │  │  Normalizer  │  │     Bus     │  │   Adapter    │           │
//! │  └──────────────┘  └─────────────┘  └──────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The streaming engine, the media element and the page collaborators are
//! traits in [`engine`] and [`host`]; [`mock`] has in-memory versions.

pub mod error;
pub mod types;
pub mod config;
pub mod i18n;
pub mod events;
pub mod bus;
pub mod tracks;
pub mod drm;
pub mod engine;
pub mod media;
pub mod provider;
pub mod timers;
pub mod input;
pub mod timeline;
pub mod checks;
pub mod host;
pub mod state;
pub mod player;
pub mod ads;
pub mod playlist;
pub mod session;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{Error, Result};
pub use types::*;
pub use config::{EntrySettings, PlayerDefaults, PlayerOptions, Timings};
pub use i18n::{Catalog, Locale, Translator};
pub use events::{BusEvent, EventKind, EventSource, PlayerEvent};
pub use bus::{EventBus, EventFilter, Inbox, Subscription};
pub use tracks::{normalize, AudioTrack, NormalizedTracks, QualityFlags, TextTrack, TrackSnapshot, Variant, VideoTrack};
pub use drm::{DrmConfig, KeySystem};
pub use engine::{EngineError, EngineErrorKind, EngineEvent, EngineFactory, MediaElement, StreamingEngine};
pub use media::MediaEvent;
pub use provider::{AutoplayOutcome, ProviderAdapter};
pub use input::{ClickOutcome, ClickTarget, Key, KeyFocus};
pub use host::{Fullscreen, Host, Platform, StylesheetLoader};
pub use state::{ApiState, Message, MessageIcon, Phase, PlaybackState};
pub use player::Player;
pub use ads::AdBreakController;
pub use playlist::{Advance, PlaylistController};
pub use session::{PlayerSession, SessionContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "Ober Core initialized");
}
