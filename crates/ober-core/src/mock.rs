//! In-memory collaborators
//!
//! A scriptable streaming engine, media element, fullscreen API and
//! stylesheet loader. Used by the tests, the benchmarks and the CLI replay
//! driver. Every mock keeps its state behind a shared handle so callers can
//! inspect what the player did after handing the mock over.

use crate::drm::RequestFilter;
use crate::engine::{EngineError, EngineFactory, MediaElement, PlayRejected, StreamingEngine};
use crate::error::{Error, Result};
use crate::host::{Fullscreen, FullscreenTarget, StylesheetLoader};
use crate::tracks::{RawAudioTrack, RawTextTrack, TrackSnapshot, Variant};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How the mock element answers `play()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayPolicy {
    #[default]
    Allow,
    /// Autoplay policy: only muted playback may start
    RequireMuted,
    Reject,
}

#[derive(Debug)]
struct MediaInner {
    current_time: f64,
    duration: f64,
    volume: f64,
    muted: bool,
    paused: bool,
    rate: f64,
    policy: PlayPolicy,
    play_calls: usize,
    seeks: Vec<f64>,
    picker_shown: usize,
}

/// Media element that only records what it is told
#[derive(Debug, Clone)]
pub struct MockMedia {
    inner: Arc<Mutex<MediaInner>>,
}

impl MockMedia {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MediaInner {
                current_time: 0.0,
                duration: f64::NAN,
                volume: 1.0,
                muted: false,
                paused: true,
                rate: 1.0,
                policy: PlayPolicy::Allow,
                play_calls: 0,
                seeks: Vec::new(),
                picker_shown: 0,
            })),
        }
    }

    pub fn with_policy(self, policy: PlayPolicy) -> Self {
        lock(&self.inner).policy = policy;
        self
    }

    pub fn set_policy(&self, policy: PlayPolicy) {
        lock(&self.inner).policy = policy;
    }

    pub fn set_duration(&self, duration: f64) {
        lock(&self.inner).duration = duration;
    }

    /// Move the playhead without recording a seek, as playback would
    pub fn advance_to(&self, seconds: f64) {
        lock(&self.inner).current_time = seconds;
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.inner).paused
    }

    pub fn play_calls(&self) -> usize {
        lock(&self.inner).play_calls
    }

    /// Every position written through `set_current_time`
    pub fn seeks(&self) -> Vec<f64> {
        lock(&self.inner).seeks.clone()
    }

    pub fn playback_rate(&self) -> f64 {
        lock(&self.inner).rate
    }

    pub fn picker_shown(&self) -> usize {
        lock(&self.inner).picker_shown
    }
}

impl Default for MockMedia {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaElement for MockMedia {
    async fn play(&self) -> std::result::Result<(), PlayRejected> {
        let mut inner = lock(&self.inner);
        inner.play_calls += 1;
        let allowed = match inner.policy {
            PlayPolicy::Allow => true,
            PlayPolicy::RequireMuted => inner.muted,
            PlayPolicy::Reject => false,
        };
        if allowed {
            inner.paused = false;
            Ok(())
        } else {
            Err(PlayRejected::new("NotAllowedError"))
        }
    }

    fn pause(&self) {
        lock(&self.inner).paused = true;
    }

    fn current_time(&self) -> f64 {
        lock(&self.inner).current_time
    }

    fn set_current_time(&self, seconds: f64) {
        let mut inner = lock(&self.inner);
        inner.current_time = seconds;
        inner.seeks.push(seconds);
    }

    fn duration(&self) -> f64 {
        lock(&self.inner).duration
    }

    fn volume(&self) -> f64 {
        lock(&self.inner).volume
    }

    fn set_volume(&self, volume: f64) {
        lock(&self.inner).volume = volume;
    }

    fn muted(&self) -> bool {
        lock(&self.inner).muted
    }

    fn set_muted(&self, muted: bool) {
        lock(&self.inner).muted = muted;
    }

    fn set_playback_rate(&self, rate: f64) {
        lock(&self.inner).rate = rate;
    }

    fn show_playback_target_picker(&self) {
        lock(&self.inner).picker_shown += 1;
    }
}

/// Script and journal shared by every engine a [`MockEngineFactory`] builds
#[derive(Debug, Default)]
pub struct EngineScript {
    pub unsupported: bool,
    pub tracks: TrackSnapshot,
    pub live: bool,
    /// Load failures keyed by URL
    pub load_errors: HashMap<String, EngineError>,
    pub code_names: HashMap<u32, String>,

    pub engines_created: usize,
    pub loads: Vec<String>,
    pub configs: Vec<serde_json::Value>,
    pub config_resets: usize,
    pub request_filters: usize,
    pub selected_variant: Option<Variant>,
    pub selected_audio: Option<(String, Option<String>)>,
    pub selected_text: Option<(String, Option<String>, bool)>,
    pub text_visible: bool,
    pub detaches: usize,
    pub unloads: usize,
    pub destroys: usize,
}

/// Engine answering from an [`EngineScript`]
pub struct MockEngine {
    script: Arc<Mutex<EngineScript>>,
    filters: Vec<RequestFilter>,
}

impl MockEngine {
    fn script(&self) -> MutexGuard<'_, EngineScript> {
        lock(&self.script)
    }
}

#[async_trait]
impl StreamingEngine for MockEngine {
    fn is_browser_supported(&self) -> bool {
        !self.script().unsupported
    }

    fn configure(&mut self, config: serde_json::Value) {
        let mut script = self.script();
        if let Some(enabled) = config.pointer("/abr/enabled").and_then(serde_json::Value::as_bool) {
            script.tracks.abr_enabled = enabled;
        }
        script.configs.push(config);
    }

    fn reset_configuration(&mut self) {
        self.script().config_resets += 1;
    }

    fn register_request_filter(&mut self, filter: RequestFilter) {
        self.filters.push(filter);
        self.script().request_filters = self.filters.len();
    }

    fn clear_request_filters(&mut self) {
        self.filters.clear();
        self.script().request_filters = 0;
    }

    async fn load(&mut self, url: &str) -> std::result::Result<(), EngineError> {
        let mut script = self.script();
        script.loads.push(url.to_string());
        match script.load_errors.get(url) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn detach(&mut self) -> std::result::Result<(), EngineError> {
        self.script().detaches += 1;
        Ok(())
    }

    async fn unload(&mut self) -> std::result::Result<(), EngineError> {
        self.script().unloads += 1;
        Ok(())
    }

    async fn destroy(&mut self) -> std::result::Result<(), EngineError> {
        self.script().destroys += 1;
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.script().live
    }

    fn abr_enabled(&self) -> bool {
        self.script().tracks.abr_enabled
    }

    fn variant_tracks(&self) -> Vec<Variant> {
        self.script().tracks.variants.clone()
    }

    fn text_tracks(&self) -> Vec<RawTextTrack> {
        self.script().tracks.text.clone()
    }

    fn audio_languages_and_roles(&self) -> Vec<RawAudioTrack> {
        self.script().tracks.audio.clone()
    }

    fn select_variant_track(&mut self, variant: &Variant, _clear_buffer: bool) {
        let mut script = self.script();
        for candidate in &mut script.tracks.variants {
            candidate.active = candidate.id == variant.id;
        }
        script.selected_variant = Some(variant.clone());
    }

    fn select_audio_language(&mut self, language: &str, role: Option<&str>) {
        self.script().selected_audio = Some((language.to_string(), role.map(str::to_string)));
    }

    fn select_text_language(&mut self, language: &str, role: Option<&str>, forced: bool) {
        let mut script = self.script();
        for track in &mut script.tracks.text {
            track.active = track.language == language
                && track.forced == forced
                && role.map_or(true, |role| track.roles.iter().any(|r| r == role));
        }
        script.selected_text = Some((language.to_string(), role.map(str::to_string), forced));
    }

    fn set_text_track_visibility(&mut self, visible: bool) {
        self.script().text_visible = visible;
    }

    fn error_code_name(&self, code: u32) -> Option<String> {
        self.script().code_names.get(&code).cloned()
    }
}

/// Builds [`MockEngine`]s sharing one script
#[derive(Debug, Clone, Default)]
pub struct MockEngineFactory {
    script: Arc<Mutex<EngineScript>>,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(self, tracks: TrackSnapshot) -> Self {
        lock(&self.script).tracks = tracks;
        self
    }

    pub fn with_live(self, live: bool) -> Self {
        lock(&self.script).live = live;
        self
    }

    pub fn unsupported(self) -> Self {
        lock(&self.script).unsupported = true;
        self
    }

    /// Make every load of `url` fail with `error`
    pub fn fail_load(self, url: &str, error: EngineError, code_name: Option<&str>) -> Self {
        {
            let mut script = lock(&self.script);
            if let Some(name) = code_name {
                script.code_names.insert(error.code, name.to_string());
            }
            script.load_errors.insert(url.to_string(), error);
        }
        self
    }

    /// Shared script, for inspection or to change it mid-test
    pub fn script(&self) -> MutexGuard<'_, EngineScript> {
        lock(&self.script)
    }
}

impl EngineFactory for MockEngineFactory {
    fn create_engine(&self, _media: Arc<dyn MediaElement>) -> Box<dyn StreamingEngine> {
        lock(&self.script).engines_created += 1;
        Box::new(MockEngine {
            script: Arc::clone(&self.script),
            filters: Vec::new(),
        })
    }
}

/// Fullscreen API recording every request
#[derive(Debug, Clone, Default)]
pub struct MockFullscreen {
    inner: Arc<Mutex<(bool, Vec<FullscreenTarget>)>>,
}

impl MockFullscreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<FullscreenTarget> {
        lock(&self.inner).1.clone()
    }
}

impl Fullscreen for MockFullscreen {
    fn is_fullscreen(&self) -> bool {
        lock(&self.inner).0
    }

    fn request(&self, target: FullscreenTarget, _force: bool) {
        let mut inner = lock(&self.inner);
        inner.0 = true;
        inner.1.push(target);
    }

    fn exit(&self) {
        lock(&self.inner).0 = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StylesheetBehavior {
    Present,
    Loads,
    Hangs,
    Fails,
}

/// Stylesheet loader with a fixed outcome
#[derive(Debug, Clone)]
pub struct MockStylesheet {
    behavior: StylesheetBehavior,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockStylesheet {
    fn with(behavior: StylesheetBehavior) -> Self {
        Self {
            behavior,
            requested: Arc::default(),
        }
    }

    pub fn already_loaded() -> Self {
        Self::with(StylesheetBehavior::Present)
    }

    pub fn loads() -> Self {
        Self::with(StylesheetBehavior::Loads)
    }

    /// Never settles; only the timeout ends the wait
    pub fn never_loads() -> Self {
        Self::with(StylesheetBehavior::Hangs)
    }

    pub fn fails() -> Self {
        Self::with(StylesheetBehavior::Fails)
    }

    pub fn requested(&self) -> Vec<String> {
        lock(&self.requested).clone()
    }
}

#[async_trait]
impl StylesheetLoader for MockStylesheet {
    fn is_loaded(&self) -> bool {
        self.behavior == StylesheetBehavior::Present
    }

    async fn load(&self, href: &str) -> Result<()> {
        lock(&self.requested).push(href.to_string());
        match self.behavior {
            StylesheetBehavior::Present | StylesheetBehavior::Loads => Ok(()),
            StylesheetBehavior::Hangs => std::future::pending().await,
            StylesheetBehavior::Fails => Err(Error::Stylesheet { url: href.to_string() }),
        }
    }
}
