//! Player state machine
//!
//! Owns [`PlaybackState`] and is its only writer. Bus events queue up in the
//! player's inbox and are applied by [`Player::process_pending`]; timers are
//! applied by [`Player::fire_due_timers`]. The control API and the
//! interaction handlers act on the media element and the provider adapter,
//! whose reports come back through the bus.
//!
//! Lifecycle: [`Player::initialize`] for the first entry,
//! [`Player::reconfigure`] when the playlist moves, [`Player::teardown`] on destroy.

use crate::bus::{EventBus, Inbox};
use crate::checks::blocking_checks;
use crate::config::{EntrySettings, PlayerDefaults, Timings};
use crate::engine::{EngineError, EngineEvent, EngineFactory, MediaElement};
use crate::error::{Error, Result};
use crate::events::{BusEvent, PlayerEvent};
use crate::host::{self, Fullscreen, Host, Platform, StylesheetLoader};
use crate::input::{ClickOutcome, ClickTarget, Key, KeyFocus};
use crate::media::MediaEvent;
use crate::provider::{AutoplayOutcome, LoadSettings, ProviderAdapter};
use crate::session::SessionContext;
use crate::state::{ApiState, Message, MessageIcon, Phase, PlaybackState};
use crate::timeline::{self, Chapter};
use crate::timers::{TimerKind, Timers};
use crate::tracks::{TextTrack, Variant, NONE_TRACK_ID};
use crate::types::{active_go_to_button, PlaylistEntry, SessionId};
use chrono::{Local, Utc};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

fn round_volume(volume: f64) -> f64 {
    (volume * 100.0).round() / 100.0
}

/// Playback state machine and control API of one widget
pub struct Player {
    id: SessionId,
    ctx: SessionContext,
    bus: EventBus,
    inbox: Inbox,
    media: Arc<dyn MediaElement>,
    engines: Arc<dyn EngineFactory>,
    fullscreen: Option<Arc<dyn Fullscreen>>,
    stylesheet: Option<Arc<dyn StylesheetLoader>>,
    platform: Platform,
    timings: Timings,
    defaults: PlayerDefaults,
    /// At most one adapter per media element
    provider: Option<ProviderAdapter>,
    entry: PlaylistEntry,
    settings: EntrySettings,
    state: PlaybackState,
    timers: Timers,
    /// Set while a slider drag is being released: play again or stay paused
    should_play_on_release: Option<bool>,
    /// On touch devices the first tap only reveals the controls
    click_enabled_on_touch: bool,
    chapters: Vec<Chapter>,
    preroll_pending: bool,
    postroll_pending: bool,
}

impl Player {
    pub fn new(host: &Host, bus: EventBus, ctx: SessionContext, entry: PlaylistEntry) -> Self {
        Self::with_timings(host, bus, ctx, entry, Timings::default())
    }

    pub fn with_timings(host: &Host, bus: EventBus, ctx: SessionContext, entry: PlaylistEntry, timings: Timings) -> Self {
        let defaults = PlayerDefaults {
            lang: ctx.locale,
            ..PlayerDefaults::default()
        };
        let settings = EntrySettings::resolve(&entry, &defaults);
        let state = PlaybackState::new(settings.autoplay, settings.muted, settings.volume);

        Self {
            id: SessionId::new(),
            inbox: Inbox::attach(&bus),
            bus,
            ctx,
            media: Arc::clone(&host.media),
            engines: Arc::clone(&host.engines),
            fullscreen: host.fullscreen.clone(),
            stylesheet: host.stylesheet.clone(),
            platform: host.platform,
            timings,
            defaults,
            provider: None,
            entry,
            settings,
            state,
            timers: Timers::new(),
            should_play_on_release: None,
            click_enabled_on_touch: false,
            chapters: Vec::new(),
            preroll_pending: true,
            postroll_pending: true,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn playback_state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn entry(&self) -> &PlaylistEntry {
        &self.entry
    }

    pub fn settings(&self) -> &EntrySettings {
        &self.settings
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Container classes for the current state
    pub fn class_list(&self) -> Vec<String> {
        self.state
            .class_list(self.settings.aspect, self.platform.is_touch_device)
    }

    pub fn is_timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    /// Earliest armed timer, for drivers that sleep until the next deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// First load: stylesheet, `ready`, checks, then the source
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn initialize(&mut self, width: f64) -> Result<()> {
        self.resize(width);

        if let Some(loader) = self.stylesheet.clone() {
            let href = self.ctx.stylesheet_url.clone();
            if let Err(e) = host::load_stylesheet(loader.as_ref(), &href, self.timings.stylesheet_timeout).await {
                warn!(error = %e, "Stylesheet unavailable");
                let text = self.ctx.translator.t("message.stylesheet", &[("url", &href)]);
                self.display_message(Message::error(text));
                return Ok(());
            }
        }
        self.state.is_stylesheet_loaded = true;

        self.bus.emit(PlayerEvent::Ready);
        self.make_checks_and_load().await?;
        self.process_pending();
        Ok(())
    }

    /// Switch to another entry on the same media element
    #[instrument(skip(self, entry), fields(session_id = %self.id, url = %entry.video_url))]
    pub async fn reconfigure(&mut self, entry: PlaylistEntry) -> Result<()> {
        self.timers.cancel_all();
        self.inbox.clear();

        let settings = EntrySettings::resolve(&entry, &self.defaults);
        let mut state = PlaybackState::new(settings.autoplay, settings.muted, settings.volume);
        state.is_full_screen = self.state.is_full_screen;
        state.is_small = self.state.is_small;
        state.is_stylesheet_loaded = self.state.is_stylesheet_loaded;
        state.is_airplay_available = self.state.is_airplay_available;
        state.is_chromecasting = self.state.is_chromecasting;
        self.state = state;
        self.settings = settings;
        self.should_play_on_release = None;
        self.chapters.clear();
        self.preroll_pending = true;
        self.postroll_pending = true;

        if let Some(provider) = self.provider.as_mut() {
            if entry.video_url.is_empty() {
                if let Err(e) = provider.destroy().await {
                    warn!(error = %e, "Provider destroy failed");
                }
                self.provider = None;
            } else {
                if let Err(e) = provider.detach().await {
                    warn!(error = %e, "Provider detach failed");
                }
                provider.rebind(entry.video_url.clone());
            }
        }

        self.entry = entry;
        self.make_checks_and_load().await?;
        self.process_pending();
        Ok(())
    }

    /// Stop everything and release the engine
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn teardown(&mut self) -> Result<()> {
        self.timers.cancel_all();

        if let Some(mut provider) = self.provider.take() {
            if provider.was_playing() {
                self.bus.emit_from(provider.source(), PlayerEvent::Pause);
            }
            provider.destroy().await?;
        }

        self.process_pending();
        self.inbox.detach();
        info!("Player torn down");
        Ok(())
    }

    async fn make_checks_and_load(&mut self) -> Result<()> {
        let blockers = blocking_checks(
            self.entry.restrictions.as_ref(),
            self.entry.rights.as_ref(),
            Utc::now(),
            Local::now().time(),
        )?;
        if let Some(blocker) = blockers.first() {
            debug!(?blocker, "Entry blocked");
            let message = blocker.message(self.ctx.translator.as_ref());
            self.display_message(message);
            return Ok(());
        }

        if self.entry.video_url.is_empty() {
            debug!("Entry has no video");
            return Ok(());
        }
        self.load_main_content().await
    }

    async fn load_main_content(&mut self) -> Result<()> {
        if self.provider.is_none() {
            match ProviderAdapter::new(
                self.engines.as_ref(),
                Arc::clone(&self.media),
                self.bus.clone(),
                Arc::clone(&self.ctx.translator),
                self.entry.video_url.clone(),
            ) {
                Ok(provider) => self.provider = Some(provider),
                Err(Error::BrowserNotSupported) => {
                    let text = self.ctx.translator.t("message.browserNotSupported", &[]);
                    self.display_message(Message::error(text));
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        let settings = LoadSettings {
            autoplay: self.state.autoplay,
            volume: self.settings.volume,
            muted: self.settings.muted,
        };
        let Some(provider) = self.provider.as_mut() else {
            return Err(Error::NoProvider);
        };
        let result = provider
            .load(
                &self.entry.video_url,
                self.entry.drm.as_ref(),
                self.entry.video_provider_options.as_ref(),
                settings,
            )
            .await;

        match result {
            Ok(outcome) => {
                if self.ctx.debug {
                    info!(?outcome, "Main content loaded");
                }
                self.apply_autoplay_outcome(outcome);
                Ok(())
            }
            Err(Error::Engine(e)) => {
                // the error event carries the message
                warn!(code = e.code, "Main content failed to load");
                self.state.is_buffering = false;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn apply_autoplay_outcome(&mut self, outcome: AutoplayOutcome) {
        match outcome {
            AutoplayOutcome::Playing => {}
            AutoplayOutcome::PlayingMuted => self.state.is_muted = true,
            AutoplayOutcome::NotRequested | AutoplayOutcome::Rejected => {
                if !self.state.is_ad_player {
                    self.state.is_waiting_for_click = true;
                    self.state.is_buffering = false;
                    self.state.is_playing = false;
                }
            }
        }
    }

    /// Show a notice over the video until the next load
    pub fn display_message(&mut self, message: Message) {
        self.state.message = Some(message);
        self.state.is_waiting_for_click = true;
        self.state.is_buffering = false;
    }

    pub fn clear_message(&mut self) {
        self.state.message = None;
    }

    // ------------------------------------------------------------------
    // Rights and restrictions
    // ------------------------------------------------------------------

    /// Viewer confirmed their age: load the entry
    pub async fn accept_age_restriction(&mut self) -> Result<()> {
        if let Some(restrictions) = self.entry.restrictions.as_mut() {
            restrictions.age = None;
        }
        self.clear_message();
        self.state.is_waiting_for_click = !self.state.autoplay;
        self.make_checks_and_load().await?;
        self.process_pending();
        Ok(())
    }

    pub fn decline_age_restriction(&mut self) {
        let text = self.ctx.translator.t("message.restrictions.ageDeclined", &[]);
        self.display_message(Message::new(Some(MessageIcon::Lock), text));
    }

    /// The rights window was re-validated by the host: load the entry
    pub async fn clear_rights_window(&mut self) -> Result<()> {
        self.entry.rights = None;
        self.clear_message();
        self.make_checks_and_load().await?;
        self.process_pending();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ads
    // ------------------------------------------------------------------

    pub(crate) fn enter_ad_mode(&mut self) {
        self.timers.cancel(TimerKind::SingleClick);
        self.state.is_ad_player = true;
        self.state.is_live = false;
        self.state.autoplay = true;
        self.state.ad_current_time = 0.0;
        self.state.ad_duration = 0.0;
    }

    pub(crate) fn leave_ad_mode(&mut self, resume_position: Option<f64>) {
        self.state.is_ad_player = false;
        match resume_position {
            Some(position) => {
                self.state.autoplay = true;
                self.state.resume_position = Some(position);
            }
            None => {
                self.state.autoplay = false;
                self.state.resume_position = None;
                self.state.is_waiting_for_click = true;
                self.state.is_playing = false;
            }
        }
        self.state.is_buffering = true;
    }

    /// Play an ad creative on the shared media element
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn load_ad_video(&mut self, url: &str) -> Result<AutoplayOutcome> {
        let settings = LoadSettings {
            autoplay: true,
            volume: self.media.volume(),
            muted: self.media.muted(),
        };
        let provider = self.provider.as_mut().ok_or(Error::NoProvider)?;
        provider.load(url, None, None, settings).await
    }

    /// Load the entry's content again, with the autoplay currently in effect
    pub async fn reload_main_content(&mut self) -> Result<()> {
        if self.entry.video_url.is_empty() {
            return Ok(());
        }
        let result = self.load_main_content().await;
        self.process_pending();
        result
    }

    // ------------------------------------------------------------------
    // Event processing
    // ------------------------------------------------------------------

    /// Feed a native media event through the adapter, then apply the results
    pub fn handle_media_event(&mut self, event: &MediaEvent) {
        match self.provider.as_mut() {
            Some(provider) => provider.handle_media_event(event),
            None => debug!(event = %event, "Media event without provider"),
        }
        self.process_pending();
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if let Some(provider) = &self.provider {
            provider.handle_engine_event(event);
        }
        self.process_pending();
    }

    /// Apply every queued bus event, oldest first
    pub fn process_pending(&mut self) {
        while let Some(event) = self.inbox.pop() {
            if self.ctx.debug {
                debug!(event = %event, "Applying event");
            }
            self.apply(event);
        }
    }

    fn apply(&mut self, bus_event: BusEvent) {
        let is_ad = bus_event.is_ad();

        match bus_event.event {
            PlayerEvent::Play => {
                self.state.is_complete = false;
                self.state.is_waiting_for_click = false;
                self.state.is_buffering = false;
                self.state.is_seeking = false;
                self.state.is_paused = false;
                self.state.is_playing = true;
                self.state.api_state = ApiState::Playing;
                self.timers.cancel(TimerKind::BufferingGrace);
                if !is_ad {
                    self.state.is_controls_visible = true;
                    self.timers
                        .arm(TimerKind::ControlsAutoHide, self.timings.controls_auto_hide);
                }
            }
            PlayerEvent::Pause => {
                if !is_ad && self.state.is_playing {
                    self.state.is_controls_visible = true;
                    self.timers.cancel(TimerKind::ControlsAutoHide);
                }
                self.state.is_paused = true;
                self.state.is_playing = false;
                self.state.api_state = ApiState::Paused;
            }
            PlayerEvent::Seeking { .. } if !is_ad => self.state.is_seeking = true,
            PlayerEvent::Seeked { current_time, .. } => {
                self.state.is_seeking = false;
                self.state.is_buffering = false;
                if !is_ad && current_time.is_finite() {
                    self.state.current_time = current_time;
                }
            }
            PlayerEvent::Ended if !is_ad => {
                self.state.is_complete = true;
                self.state.is_paused = true;
                self.state.is_playing = false;
                self.state.is_buffering = false;
                self.state.is_controls_visible = true;
                self.state.api_state = ApiState::Ended;
            }
            PlayerEvent::BeforeEnded if !is_ad => {
                if self.postroll_pending && !self.state.is_ad_player {
                    self.postroll_pending = false;
                    self.bus.emit(PlayerEvent::ReadyForPostroll);
                }
            }
            PlayerEvent::TryingToPlay if !is_ad => {
                if self.preroll_pending && !self.state.is_ad_player {
                    self.preroll_pending = false;
                    self.bus.emit(PlayerEvent::ReadyForPreroll);
                }
            }
            PlayerEvent::Buffering => {
                self.timers
                    .arm(TimerKind::BufferingGrace, self.timings.buffering_grace);
                self.state.is_complete = false;
                self.state.api_state = ApiState::Buffering;
            }
            PlayerEvent::CanPlay => {
                self.timers.cancel(TimerKind::BufferingGrace);
            }
            PlayerEvent::VideoType { is_live } if !is_ad => {
                self.state.is_live = is_live;
                if let Some(resume) = self.state.resume_position.take() {
                    if !is_live && self.state.autoplay {
                        info!(resume, "Resuming main content after ad break");
                        self.seek(resume);
                    }
                }
            }
            PlayerEvent::Metadata { duration } => {
                self.state.is_ready = true;
                if duration.is_finite() && duration >= 0.0 {
                    if is_ad {
                        self.state.ad_duration = duration;
                    } else {
                        self.state.duration = duration;
                    }
                }
            }
            PlayerEvent::Time { current_time, duration } => {
                if is_ad {
                    self.state.ad_current_time = current_time;
                    if duration.is_finite() {
                        self.state.ad_duration = duration;
                    }
                } else if !self.state.is_ad_player {
                    self.state.current_time = current_time;
                    if duration.is_finite() && duration > 0.0 {
                        self.state.duration = duration;
                    }
                    self.state.go_to_button =
                        active_go_to_button(&self.entry.go_to_buttons, current_time).cloned();
                }
            }
            PlayerEvent::Mute { muted } => self.state.is_muted = muted,
            PlayerEvent::Volume { volume } => self.state.volume = volume,
            PlayerEvent::Fullscreen { is_full_screen } => self.state.is_full_screen = is_full_screen,
            PlayerEvent::Cast { active } => self.state.is_chromecasting = active,
            PlayerEvent::Airplay { available } => self.state.is_airplay_available = available,
            PlayerEvent::VideoTracks { video_tracks } if !is_ad => {
                self.state.video_tracks = video_tracks;
                self.state.sync_active_tracks();
            }
            PlayerEvent::AudioTracks { audio_tracks } if !is_ad => {
                self.state.audio_tracks = audio_tracks;
                self.state.sync_active_tracks();
            }
            PlayerEvent::TextTracks { text_tracks } if !is_ad => {
                self.state.text_tracks = text_tracks;
                self.state.sync_active_tracks();
            }
            PlayerEvent::VideoTrackAsked {
                abr, height, bandwidth, ..
            } => {
                for track in &mut self.state.video_tracks {
                    track.selected = if abr {
                        track.is_auto()
                    } else {
                        track.bandwidth == bandwidth && track.height == height
                    };
                }
                self.state.sync_active_tracks();
            }
            PlayerEvent::AudioTrackAsked { language, role } => {
                for track in &mut self.state.audio_tracks {
                    track.selected = track.language == language && track.role == role;
                }
                self.state.sync_active_tracks();
            }
            PlayerEvent::TextTrackAsked { language, roles } => {
                for track in &mut self.state.text_tracks {
                    track.selected = match (&language, &roles) {
                        (Some(language), Some(roles)) => track.language == *language && track.roles == *roles,
                        (Some(language), None) => track.language == *language,
                        _ => track.id == NONE_TRACK_ID,
                    };
                }
                self.state.sync_active_tracks();
            }
            PlayerEvent::VideoTrackChanged { hd, uhd, hdr } if !is_ad => {
                self.state.quality = crate::tracks::QualityFlags { hd, uhd, hdr };
            }
            PlayerEvent::Error { error } if !is_ad => self.on_engine_error(&error),
            PlayerEvent::Error { error } => {
                warn!(code = error.code, "Ad playback error");
            }
            _ => {}
        }
    }

    fn on_engine_error(&mut self, error: &EngineError) {
        if !error.is_user_visible() {
            return;
        }
        let name = self
            .provider
            .as_ref()
            .and_then(|provider| provider.error_code_name(error.code))
            .unwrap_or_else(|| error.code.to_string());
        self.display_message(Message::error(format!("{}: {}", error.message, name)));
        self.state.is_playing = false;
    }

    /// Run every timer whose deadline has passed
    pub async fn fire_due_timers(&mut self) {
        for kind in self.timers.take_due(Instant::now()) {
            debug!(?kind, "Timer fired");
            match kind {
                TimerKind::SingleClick => {
                    if let Err(e) = self.toggle_play().await {
                        debug!(error = %e, "Toggle from click failed");
                    }
                }
                TimerKind::BufferingGrace => {
                    if self.state.api_state == ApiState::Buffering {
                        self.state.is_buffering = true;
                    }
                }
                TimerKind::ControlsAutoHide => {
                    if !self.state.is_settings_open && !self.state.is_paused && !self.state.is_dragging {
                        self.state.is_controls_visible = false;
                    }
                    self.click_enabled_on_touch = false;
                }
                TimerKind::TouchClickRearm => self.click_enabled_on_touch = true,
            }
        }
        self.process_pending();
    }

    // ------------------------------------------------------------------
    // Control API
    // ------------------------------------------------------------------

    pub async fn play(&mut self) -> Result<()> {
        if self.state.message.is_some() {
            debug!("Play ignored while a message is shown");
            return Ok(());
        }
        match self.media.play().await {
            Ok(()) => Ok(()),
            Err(rejected) => {
                warn!(reason = %rejected.reason, "Play rejected");
                self.state.is_waiting_for_click = true;
                self.state.is_buffering = false;
                Err(Error::PlayRejected)
            }
        }
    }

    pub fn pause(&mut self) {
        self.media.pause();
    }

    /// Pause only while playing; buffering, paused and ended all ask to play
    pub async fn toggle_play(&mut self) -> Result<()> {
        if self.state.api_state == ApiState::Playing {
            self.pause();
            return Ok(());
        }
        self.play().await
    }

    /// Seek main content, clamped to [0, duration]. Ignored during ads.
    pub fn seek(&mut self, time: f64) {
        if self.state.is_ad_player || !time.is_finite() {
            return;
        }
        let duration = self.duration();
        let target = if duration > 0.0 {
            time.clamp(0.0, duration)
        } else {
            time.max(0.0)
        };
        self.media.set_current_time(target);
        self.state.current_time = target;
    }

    /// Main content position; frozen while an ad plays
    pub fn position(&self) -> f64 {
        if self.state.is_ad_player {
            return self.state.current_time;
        }
        let current = self.media.current_time();
        if current.is_finite() {
            current
        } else {
            self.state.current_time
        }
    }

    pub fn volume(&self) -> f64 {
        round_volume(self.media.volume())
    }

    /// Values outside [0, 1] are ignored
    pub fn set_volume(&mut self, volume: f64) {
        if !(0.0..=1.0).contains(&volume) {
            return;
        }
        self.media.set_volume(volume);
        self.state.volume = volume;
    }

    pub fn duration(&self) -> f64 {
        self.state.duration
    }

    pub fn mute(&self) -> bool {
        self.media.muted()
    }

    pub fn set_mute(&mut self, muted: bool) {
        self.media.set_muted(muted);
        self.state.is_muted = muted;
    }

    pub fn toggle_mute(&mut self) {
        let muted = !self.mute();
        self.set_mute(muted);
    }

    pub fn toggle_fullscreen(&self) {
        match &self.fullscreen {
            Some(fullscreen) => host::toggle_fullscreen(fullscreen.as_ref(), &self.platform),
            None => debug!("No fullscreen support"),
        }
    }

    /// `getState()`
    pub fn state(&self) -> ApiState {
        self.state.api_state
    }

    pub fn set_playback_rate(&self, rate: f64) {
        self.media.set_playback_rate(rate);
    }

    pub fn set_video_track(&mut self, id: &str) {
        if let Some(provider) = self.provider.as_mut() {
            provider.set_video_track(id);
        }
        self.process_pending();
    }

    pub fn set_audio_track(&mut self, language: &str, role: Option<&str>) {
        if let Some(provider) = self.provider.as_mut() {
            provider.set_audio_track(language, role);
        }
        self.process_pending();
    }

    pub fn set_text_track(&mut self, language: &str, roles: &[String]) {
        if let Some(provider) = self.provider.as_mut() {
            provider.set_text_track(language, roles, false);
        }
        self.process_pending();
    }

    pub fn set_forced_text_track(&mut self) -> bool {
        let found = self
            .provider
            .as_mut()
            .is_some_and(|provider| provider.set_forced_text_track());
        self.process_pending();
        found
    }

    pub fn hide_text_tracks(&mut self) {
        if let Some(provider) = self.provider.as_mut() {
            provider.hide_text_tracks();
        }
        self.process_pending();
    }

    pub fn active_text_track(&self) -> Option<TextTrack> {
        self.state.active_text_track.clone()
    }

    pub fn active_variant(&self) -> Option<Variant> {
        self.provider.as_ref().and_then(ProviderAdapter::active_variant)
    }

    pub fn play_on_airplay(&self) {
        self.media.show_playback_target_picker();
    }

    /// Jump to the target of the visible go-to button
    pub fn click_go_to_button(&mut self) {
        if let Some(target) = self.state.go_to_button.as_ref().map(|button| button.target_time) {
            self.seek(target);
        }
    }

    // ------------------------------------------------------------------
    // Interaction layer
    // ------------------------------------------------------------------

    /// A click or tap landed on `target`
    pub async fn handle_click(&mut self, target: ClickTarget) -> ClickOutcome {
        if self.should_play_on_release == Some(false) {
            self.should_play_on_release = None;
            return ClickOutcome::DragReleaseConsumed;
        }

        if self.platform.is_touch_device && !self.click_enabled_on_touch && !target.accepts_touch() {
            return ClickOutcome::Ignored;
        }

        if matches!(target, ClickTarget::Skip | ClickTarget::ControlButtons) {
            return ClickOutcome::Ignored;
        }

        if self.should_play_on_release == Some(true) {
            self.should_play_on_release = None;
            if let Err(e) = self.play().await {
                debug!(error = %e, "Play after drag failed");
            }
            return ClickOutcome::ForcedPlay;
        }

        if self.state.is_settings_open {
            self.state.is_settings_open = false;
            if !target.is_timeline() {
                return ClickOutcome::SettingsClosed;
            }
        }

        let delay = if self.platform.is_touch_device {
            self.timings.touch_click_debounce
        } else {
            self.timings.click_debounce
        };
        self.timers.arm(TimerKind::SingleClick, delay);
        ClickOutcome::ToggleScheduled
    }

    /// Returns true when the double click was taken as a fullscreen toggle
    pub fn handle_double_click(&mut self, target: ClickTarget) -> bool {
        if target != ClickTarget::ClickCatcher {
            return false;
        }
        self.timers.cancel(TimerKind::SingleClick);
        if self.platform.is_touch_device {
            return false;
        }
        self.toggle_fullscreen();
        true
    }

    pub fn pointer_move(&mut self) {
        if self.platform.is_touch_device {
            return;
        }
        self.state.is_hovered = true;
        self.state.is_controls_visible = true;
        self.timers
            .arm(TimerKind::ControlsAutoHide, self.timings.controls_auto_hide);
    }

    pub fn pointer_leave(&mut self) {
        self.state.is_hovered = false;
        if !self.state.is_dragging && !self.state.is_settings_open && !self.state.is_paused {
            self.state.is_controls_visible = false;
            self.timers.cancel(TimerKind::ControlsAutoHide);
        }
    }

    /// Each touch toggles the controls; taps act once the rearm delay passed
    pub fn touch_start(&mut self) {
        self.state.is_hovered = true;
        self.state.is_controls_visible = !self.state.is_controls_visible;
        self.timers
            .arm(TimerKind::TouchClickRearm, self.timings.touch_click_rearm);
        self.timers
            .arm(TimerKind::ControlsAutoHide, self.timings.controls_auto_hide);
    }

    /// A click anywhere on the page
    pub fn global_click(&mut self, inside_widget: bool) {
        if inside_widget || self.platform.is_touch_device {
            return;
        }
        self.state.is_settings_open = false;
        self.state.is_controls_visible = false;
        self.timers.cancel(TimerKind::ControlsAutoHide);
    }

    /// Pointer down on the timeline slider
    pub fn begin_drag(&mut self) {
        if self.state.is_ad_player {
            return;
        }
        self.state.is_dragging = true;
        self.should_play_on_release = Some(self.state.api_state == ApiState::Playing);
    }

    /// Slider moved to `ratio` of its width
    pub fn drag_to(&mut self, ratio: f64) {
        if self.state.is_ad_player || !self.state.is_dragging {
            return;
        }
        self.pause();
        let duration = self.duration();
        let time = timeline::time_at_ratio(ratio, duration);
        self.seek(time);
        self.state.is_complete = false;
        self.bus.emit(PlayerEvent::Time {
            current_time: time,
            duration,
        });
        self.process_pending();
    }

    pub fn end_drag(&mut self) {
        self.state.is_dragging = false;
    }

    /// Returns true when the key was handled
    pub async fn handle_key(&mut self, key: &Key, focus: KeyFocus) -> bool {
        if !focus.within_widget {
            return false;
        }

        let step = (self.timings.volume_step * 100.0).round();
        match key {
            Key::Mute => self.toggle_mute(),
            Key::ArrowUp => {
                let volume = self.media.volume();
                if volume < 1.0 {
                    self.set_volume(((volume * 100.0 + step).round() / 100.0).min(1.0));
                }
            }
            Key::ArrowDown => {
                let volume = self.media.volume();
                if volume > 0.0 {
                    self.set_volume(((volume * 100.0 - step).round() / 100.0).max(0.0));
                }
            }
            Key::ArrowLeft | Key::ArrowRight => {
                let delta = if *key == Key::ArrowLeft {
                    -self.timings.seek_step
                } else {
                    self.timings.seek_step
                };
                self.state.is_complete = false;
                let position = self.position();
                self.seek(position + delta);
            }
            Key::Fullscreen => self.toggle_fullscreen(),
            Key::Space => {
                if focus.on_button {
                    return false;
                }
                if let Err(e) = self.toggle_play().await {
                    debug!(error = %e, "Toggle from keyboard failed");
                }
            }
            Key::Other(_) => return false,
        }
        true
    }

    /// Widget resized to `width` CSS pixels
    pub fn resize(&mut self, width: f64) {
        self.state.is_small = width < self.timings.compact_width;
    }

    pub fn toggle_settings(&mut self) {
        self.state.is_settings_open = !self.state.is_settings_open;
        if self.state.is_settings_open {
            self.state.is_controls_visible = true;
            self.timers.cancel(TimerKind::ControlsAutoHide);
        }
    }

    pub fn close_settings(&mut self) {
        self.state.is_settings_open = false;
    }

    /// Parse the entry's chapters track
    pub fn set_chapters(&mut self, vtt: &str) -> Result<()> {
        self.chapters = timeline::parse_chapters(vtt)?;
        Ok(())
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Slider hover label at `ratio` of the timeline
    pub fn hover_text(&self, ratio: f64) -> String {
        timeline::hover_text(timeline::time_at_ratio(ratio, self.duration()), &self.chapters)
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("url", &self.entry.video_url)
            .field("phase", &self.state.phase())
            .field("provider", &self.provider)
            .finish()
    }
}
