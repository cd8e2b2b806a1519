//! Provider adapter
//!
//! Wraps one streaming engine bound to the media element:
//!
//! ```text
//!   MediaEvent ──► MediaEventMapper ──┐
//!                                     ├──► EventBus (main or ad channel)
//!   EngineEvent ──► quality flags  ───┘
//!
//!   load / detach / destroy / track selection ──► StreamingEngine
//! ```
//!
//! The adapter never touches [`PlaybackState`](crate::state::PlaybackState).
//! It reports through the bus and through the results of its async calls.

use crate::bus::EventBus;
use crate::drm::DrmConfig;
use crate::engine::{EngineEvent, EngineFactory, MediaElement, StreamingEngine};
use crate::error::{Error, Result};
use crate::events::{EventSource, PlayerEvent};
use crate::i18n::Translator;
use crate::media::{MediaEvent, MediaEventMapper};
use crate::tracks::{normalize, NormalizedTracks, Variant, AUTO_TRACK_ID};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Volume, mute and autoplay to apply once the source is loaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSettings {
    pub autoplay: bool,
    pub volume: f64,
    pub muted: bool,
}

/// How an autoplay attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayOutcome {
    NotRequested,
    Playing,
    /// Unmuted playback was refused, muted playback went through
    PlayingMuted,
    /// Both attempts were refused; a click is needed
    Rejected,
}

impl AutoplayOutcome {
    pub fn is_playing(&self) -> bool {
        matches!(self, AutoplayOutcome::Playing | AutoplayOutcome::PlayingMuted)
    }
}

/// Engine wrapper translating engine and media signals onto the bus
pub struct ProviderAdapter {
    engine: Box<dyn StreamingEngine>,
    media: Arc<dyn MediaElement>,
    bus: EventBus,
    translator: Arc<dyn Translator>,
    /// URL of the main content; any other loaded URL is ad content
    main_url: String,
    current_url: Option<String>,
    mapper: MediaEventMapper,
    /// Track lists are sent on the first `canplaythrough` of each main load
    can_play_pending: bool,
    destroyed: bool,
}

impl ProviderAdapter {
    /// Build the adapter and its engine. Fails when the engine does not run in this browser.
    pub fn new(
        factory: &dyn EngineFactory,
        media: Arc<dyn MediaElement>,
        bus: EventBus,
        translator: Arc<dyn Translator>,
        main_url: impl Into<String>,
    ) -> Result<Self> {
        let engine = factory.create_engine(Arc::clone(&media));
        if !engine.is_browser_supported() {
            warn!("Streaming engine does not support this browser");
            return Err(Error::BrowserNotSupported);
        }

        let main_url = main_url.into();
        Ok(Self {
            engine,
            media,
            bus,
            translator,
            mapper: MediaEventMapper::new(main_url.clone()),
            main_url,
            current_url: None,
            can_play_pending: false,
            destroyed: false,
        })
    }

    /// Channel the current source reports on
    pub fn source(&self) -> EventSource {
        match &self.current_url {
            Some(url) if *url != self.main_url => EventSource::Ad,
            _ => EventSource::Main,
        }
    }

    pub fn main_url(&self) -> &str {
        &self.main_url
    }

    pub fn video_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// True while the element renders frames
    pub fn was_playing(&self) -> bool {
        self.mapper.was_playing()
    }

    /// Point the adapter at a new main content URL, keeping the engine
    pub fn rebind(&mut self, main_url: impl Into<String>) {
        self.main_url = main_url.into();
        self.current_url = None;
    }

    /// Configure DRM and engine options, load `url`, then try to autoplay
    #[instrument(skip(self, drm, engine_options, settings))]
    pub async fn load(
        &mut self,
        url: &str,
        drm: Option<&DrmConfig>,
        engine_options: Option<&serde_json::Value>,
        settings: LoadSettings,
    ) -> Result<AutoplayOutcome> {
        if self.destroyed {
            return Err(Error::ProviderDestroyed);
        }

        self.current_url = Some(url.to_string());
        let source = self.source();
        self.mapper.reset(url);
        self.can_play_pending = !source.is_ad();

        self.engine.reset_configuration();
        self.engine.clear_request_filters();
        if let Some(options) = engine_options {
            self.engine.configure(options.clone());
        }
        if let Some(drm) = drm {
            for config in drm.engine_configuration()? {
                self.engine.configure(config);
            }
            self.engine.register_request_filter(drm.request_filter());
            debug!(key_system = %drm.key_system, "DRM configured");
        }

        if let Err(error) = self.engine.load(url).await {
            if error.is_user_visible() {
                warn!(code = error.code, category = error.category, message = %error.message, "Engine load failed");
                self.bus.emit_from(source, PlayerEvent::Error { error: error.clone() });
                return Err(Error::Engine(error));
            }
            debug!(code = error.code, kind = %error.kind, "Engine error ignored");
        }
        info!(%source, "Source loaded");

        self.media.set_volume(settings.volume);
        self.media.set_muted(settings.muted);

        if !settings.autoplay {
            return Ok(AutoplayOutcome::NotRequested);
        }
        self.autoplay().await
    }

    async fn autoplay(&mut self) -> Result<AutoplayOutcome> {
        match self.media.play().await {
            Ok(()) => Ok(AutoplayOutcome::Playing),
            Err(rejected) => {
                debug!(reason = %rejected.reason, "Autoplay refused, retrying muted");
                self.media.set_muted(true);
                match self.media.play().await {
                    Ok(()) => Ok(AutoplayOutcome::PlayingMuted),
                    Err(rejected) => {
                        warn!(reason = %rejected.reason, "Muted autoplay refused");
                        Ok(AutoplayOutcome::Rejected)
                    }
                }
            }
        }
    }

    /// Translate a native media event onto the bus
    pub fn handle_media_event(&mut self, event: &MediaEvent) {
        let source = self.source();
        for translated in self.mapper.translate(event, self.media.as_ref()) {
            let ended = matches!(translated, PlayerEvent::Ended);
            self.bus.emit_from(source, translated);
            if ended && !source.is_ad() {
                self.bus.emit(PlayerEvent::Next {
                    coming_from_click: false,
                });
            }
        }

        if *event == MediaEvent::CanPlayThrough && self.can_play_pending {
            self.can_play_pending = false;
            self.on_can_play();
        }
    }

    fn on_can_play(&self) {
        self.bus.emit(PlayerEvent::VideoType {
            is_live: self.engine.is_live(),
        });

        let NormalizedTracks { video, audio, text } = self.tracks();
        if !text.is_empty() {
            self.bus.emit(PlayerEvent::TextTracks { text_tracks: text });
        }
        if !audio.is_empty() {
            self.bus.emit(PlayerEvent::AudioTracks { audio_tracks: audio });
        }
        if !video.is_empty() {
            self.bus.emit(PlayerEvent::VideoTracks { video_tracks: video });
        }
    }

    /// Normalized track lists of the current source
    pub fn tracks(&self) -> NormalizedTracks {
        normalize(&self.engine.track_snapshot(), self.translator.as_ref())
    }

    /// Report the quality of the active variant after a switch
    pub fn handle_engine_event(&self, event: EngineEvent) {
        if let Some(variant) = self.active_variant() {
            debug!(?event, bandwidth = variant.bandwidth, "Variant changed");
            self.bus
                .emit_from(self.source(), PlayerEvent::video_track_changed(variant.quality()));
        }
    }

    pub fn active_variant(&self) -> Option<Variant> {
        self.engine.variant_tracks().into_iter().find(|variant| variant.active)
    }

    /// `auto` re-enables ABR; any other id pins the quality with that bandwidth
    pub fn set_video_track(&mut self, id: &str) {
        if id == AUTO_TRACK_ID {
            self.engine.configure(serde_json::json!({ "abr": { "enabled": true } }));
            self.bus.emit(PlayerEvent::VideoTrackAsked {
                abr: true,
                width: None,
                height: None,
                bandwidth: None,
            });
            return;
        }

        let Ok(bandwidth) = id.parse::<u64>() else {
            warn!(id, "Unknown video track id");
            return;
        };

        // only variants sharing the active variant's label are candidates
        let Some(active) = self.active_variant() else {
            warn!(bandwidth, "No active variant to pin from");
            return;
        };
        let Some(variant) = self
            .engine
            .variant_tracks()
            .into_iter()
            .find(|variant| variant.quality_bandwidth() == bandwidth && variant.label == active.label)
        else {
            warn!(bandwidth, label = ?active.label, "No variant with this bandwidth and label");
            return;
        };

        self.engine.configure(serde_json::json!({ "abr": { "enabled": false } }));
        self.engine.select_variant_track(&variant, true);
        self.bus.emit(PlayerEvent::VideoTrackAsked {
            abr: false,
            width: variant.width,
            height: variant.height,
            bandwidth: Some(bandwidth),
        });
    }

    pub fn set_audio_track(&mut self, language: &str, role: Option<&str>) {
        let role = role.filter(|role| !role.is_empty());
        self.engine.select_audio_language(language, role);
        self.bus.emit(PlayerEvent::AudioTrackAsked {
            language: language.to_string(),
            role: role.map(str::to_string),
        });
    }

    /// Show subtitles in `language`. With several roles the last one is used.
    pub fn set_text_track(&mut self, language: &str, roles: &[String], forced: bool) {
        self.engine
            .select_text_language(language, roles.last().map(String::as_str), forced);
        self.engine.set_text_track_visibility(true);

        let asked = if forced {
            PlayerEvent::TextTrackAsked {
                language: None,
                roles: None,
            }
        } else {
            PlayerEvent::TextTrackAsked {
                language: Some(language.to_string()),
                roles: Some(roles.to_vec()),
            }
        };
        self.bus.emit(asked);
    }

    /// Activate the first forced track, if the source has one
    pub fn set_forced_text_track(&mut self) -> bool {
        let forced = self.engine.text_tracks().into_iter().find(|track| track.forced);
        match forced {
            Some(track) => {
                self.set_text_track(&track.language, &track.roles, true);
                true
            }
            None => false,
        }
    }

    pub fn hide_text_tracks(&mut self) {
        self.engine.set_text_track_visibility(false);
        self.bus.emit(PlayerEvent::TextTrackAsked {
            language: None,
            roles: None,
        });
    }

    pub fn error_code_name(&self, code: u32) -> Option<String> {
        self.engine.error_code_name(code)
    }

    /// Release the source, keep the engine for the next load
    #[instrument(skip(self))]
    pub async fn detach(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(Error::ProviderDestroyed);
        }
        self.empty_video_data();
        self.engine.detach().await?;
        self.current_url = None;
        Ok(())
    }

    /// Tear the engine down. The adapter cannot be used afterwards.
    #[instrument(skip(self))]
    pub async fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.empty_video_data();
        self.engine.reset_configuration();
        self.engine.clear_request_filters();
        self.engine.unload().await?;
        self.engine.destroy().await?;
        self.current_url = None;
        info!("Provider destroyed");
        Ok(())
    }

    /// Tell listeners that no track is available any more
    fn empty_video_data(&self) {
        self.bus.emit(PlayerEvent::VideoTracks { video_tracks: Vec::new() });
        self.bus.emit(PlayerEvent::AudioTracks { audio_tracks: Vec::new() });
        self.bus.emit(PlayerEvent::TextTracks { text_tracks: Vec::new() });
    }
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("main_url", &self.main_url)
            .field("current_url", &self.current_url)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Inbox;
    use crate::engine::{EngineError, EngineErrorKind};
    use crate::events::{BusEvent, EventKind};
    use crate::i18n::Catalog;
    use crate::mock::{MockEngineFactory, MockMedia, PlayPolicy};
    use crate::tracks::{RawAudioTrack, RawTextTrack, TrackSnapshot};

    fn variant(id: u64, bandwidth: u64, width: u32, height: u32, active: bool) -> Variant {
        Variant {
            id,
            active,
            bandwidth,
            width: Some(width),
            height: Some(height),
            language: "en".to_string(),
            ..Default::default()
        }
    }

    fn snapshot() -> TrackSnapshot {
        TrackSnapshot {
            variants: vec![
                variant(1, 800_000, 640, 360, false),
                variant(2, 2_500_000, 1280, 720, false),
                variant(3, 6_000_000, 1920, 1080, true),
            ],
            audio: vec![
                RawAudioTrack {
                    language: "en".to_string(),
                    ..Default::default()
                },
                RawAudioTrack {
                    language: "fr".to_string(),
                    ..Default::default()
                },
            ],
            text: vec![RawTextTrack {
                id: 1,
                language: "fr".to_string(),
                ..Default::default()
            }],
            abr_enabled: true,
        }
    }

    fn settings(autoplay: bool) -> LoadSettings {
        LoadSettings {
            autoplay,
            volume: 0.5,
            muted: false,
        }
    }

    fn adapter(factory: &MockEngineFactory, media: &MockMedia, bus: &EventBus) -> ProviderAdapter {
        ProviderAdapter::new(
            factory,
            Arc::new(media.clone()),
            bus.clone(),
            Arc::new(Catalog::default()),
            "main.m3u8",
        )
        .unwrap()
    }

    fn drain(inbox: &Inbox) -> Vec<BusEvent> {
        std::iter::from_fn(|| inbox.pop()).collect()
    }

    #[test]
    fn test_unsupported_browser() {
        let factory = MockEngineFactory::new().unsupported();
        let result = ProviderAdapter::new(
            &factory,
            Arc::new(MockMedia::new()),
            EventBus::new(),
            Arc::new(Catalog::default()),
            "main.m3u8",
        );
        assert!(matches!(result, Err(Error::BrowserNotSupported)));
    }

    #[tokio::test]
    async fn test_autoplay_falls_back_to_muted() {
        let factory = MockEngineFactory::new();
        let media = MockMedia::new().with_policy(PlayPolicy::RequireMuted);
        let bus = EventBus::new();
        let mut provider = adapter(&factory, &media, &bus);

        let outcome = provider.load("main.m3u8", None, None, settings(true)).await.unwrap();
        assert_eq!(outcome, AutoplayOutcome::PlayingMuted);
        assert!(media.muted());
        assert_eq!(media.play_calls(), 2);
    }

    #[tokio::test]
    async fn test_autoplay_rejected() {
        let factory = MockEngineFactory::new();
        let media = MockMedia::new().with_policy(PlayPolicy::Reject);
        let bus = EventBus::new();
        let mut provider = adapter(&factory, &media, &bus);

        let outcome = provider.load("main.m3u8", None, None, settings(true)).await.unwrap();
        assert_eq!(outcome, AutoplayOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_critical_error_is_emitted() {
        let error = EngineError::new(EngineErrorKind::Critical, 1, 1001, "Bad HTTP status");
        let factory = MockEngineFactory::new().fail_load("main.m3u8", error.clone(), Some("BAD_HTTP_STATUS"));
        let media = MockMedia::new();
        let bus = EventBus::new();
        let inbox = Inbox::attach(&bus);
        let mut provider = adapter(&factory, &media, &bus);

        let result = provider.load("main.m3u8", None, None, settings(true)).await;
        assert!(matches!(result, Err(Error::Engine(ref e)) if e.code == 1001));
        assert_eq!(media.play_calls(), 0);
        assert_eq!(drain(&inbox), vec![BusEvent::main(PlayerEvent::Error { error })]);
        assert_eq!(provider.error_code_name(1001).as_deref(), Some("BAD_HTTP_STATUS"));
    }

    #[tokio::test]
    async fn test_interrupted_load_is_swallowed() {
        let error = EngineError::new(EngineErrorKind::Critical, 7, crate::engine::LOAD_INTERRUPTED, "Interrupted");
        let factory = MockEngineFactory::new().fail_load("main.m3u8", error, None);
        let media = MockMedia::new();
        let bus = EventBus::new();
        let inbox = Inbox::attach(&bus);
        let mut provider = adapter(&factory, &media, &bus);

        let outcome = provider.load("main.m3u8", None, None, settings(false)).await.unwrap();
        assert_eq!(outcome, AutoplayOutcome::NotRequested);
        assert!(inbox.is_empty());
    }

    #[tokio::test]
    async fn test_ad_source_uses_ad_channel() {
        let factory = MockEngineFactory::new();
        let media = MockMedia::new();
        let bus = EventBus::new();
        let inbox = Inbox::attach(&bus);
        let mut provider = adapter(&factory, &media, &bus);

        provider.load("ad.mp4", None, None, settings(false)).await.unwrap();
        assert_eq!(provider.source(), EventSource::Ad);

        provider.handle_media_event(&MediaEvent::Pause);
        provider.handle_media_event(&MediaEvent::Ended);
        let names: Vec<String> = drain(&inbox).iter().map(BusEvent::name).collect();
        assert_eq!(names, ["adpause", "adbeforeended", "adended"]);
    }

    #[tokio::test]
    async fn test_main_ended_requests_next() {
        let factory = MockEngineFactory::new();
        let media = MockMedia::new();
        let bus = EventBus::new();
        let inbox = Inbox::attach(&bus);
        let mut provider = adapter(&factory, &media, &bus);

        provider.load("main.m3u8", None, None, settings(false)).await.unwrap();
        provider.handle_media_event(&MediaEvent::Ended);

        let names: Vec<String> = drain(&inbox).iter().map(BusEvent::name).collect();
        assert_eq!(names, ["beforeended", "ended", "next"]);
    }

    #[tokio::test]
    async fn test_can_play_sends_tracks_once() {
        let factory = MockEngineFactory::new().with_tracks(snapshot());
        let media = MockMedia::new();
        let bus = EventBus::new();
        let inbox = Inbox::attach(&bus);
        let mut provider = adapter(&factory, &media, &bus);

        provider.load("main.m3u8", None, None, settings(false)).await.unwrap();
        provider.handle_media_event(&MediaEvent::CanPlayThrough);
        provider.handle_media_event(&MediaEvent::CanPlayThrough);

        let kinds: Vec<EventKind> = drain(&inbox).iter().map(BusEvent::kind).collect();
        assert_eq!(
            kinds,
            [
                EventKind::CanPlay,
                EventKind::VideoType,
                EventKind::TextTracks,
                EventKind::AudioTracks,
                EventKind::VideoTracks,
                EventKind::CanPlay,
            ]
        );
    }

    #[tokio::test]
    async fn test_pin_and_release_quality() {
        let factory = MockEngineFactory::new().with_tracks(snapshot());
        let media = MockMedia::new();
        let bus = EventBus::new();
        let inbox = Inbox::attach(&bus);
        let mut provider = adapter(&factory, &media, &bus);
        provider.load("main.m3u8", None, None, settings(false)).await.unwrap();
        inbox.clear();

        provider.set_video_track("2500000");
        assert!(!factory.script().tracks.abr_enabled);
        assert_eq!(factory.script().selected_variant.as_ref().map(|v| v.id), Some(2));
        assert_eq!(
            inbox.pop().map(|e| e.event),
            Some(PlayerEvent::VideoTrackAsked {
                abr: false,
                width: Some(1280),
                height: Some(720),
                bandwidth: Some(2_500_000),
            })
        );

        provider.handle_engine_event(EngineEvent::VariantChanged);
        assert_eq!(
            inbox.pop().map(|e| e.event),
            Some(PlayerEvent::VideoTrackChanged {
                hd: false,
                uhd: false,
                hdr: false
            })
        );

        provider.set_video_track(AUTO_TRACK_ID);
        assert!(factory.script().tracks.abr_enabled);
    }

    #[tokio::test]
    async fn test_pin_requires_matching_label() {
        let mut tracks = snapshot();
        for variant in &mut tracks.variants {
            variant.label = Some(if variant.id == 2 { "B" } else { "A" }.to_string());
        }
        let factory = MockEngineFactory::new().with_tracks(tracks);
        let media = MockMedia::new();
        let bus = EventBus::new();
        let inbox = Inbox::attach(&bus);
        let mut provider = adapter(&factory, &media, &bus);
        provider.load("main.m3u8", None, None, settings(false)).await.unwrap();
        inbox.clear();

        provider.set_video_track("2500000");
        assert!(factory.script().selected_variant.is_none());
        assert!(factory.script().tracks.abr_enabled);
        assert!(inbox.is_empty());

        provider.set_video_track("800000");
        assert_eq!(factory.script().selected_variant.as_ref().map(|v| v.id), Some(1));
    }

    #[tokio::test]
    async fn test_text_track_selection() {
        let factory = MockEngineFactory::new().with_tracks(snapshot());
        let media = MockMedia::new();
        let bus = EventBus::new();
        let inbox = Inbox::attach(&bus);
        let mut provider = adapter(&factory, &media, &bus);

        provider.set_text_track("fr", &["main".to_string(), "caption".to_string()], false);
        assert_eq!(
            factory.script().selected_text,
            Some(("fr".to_string(), Some("caption".to_string()), false))
        );
        assert!(factory.script().text_visible);
        assert!(matches!(
            inbox.pop().map(|e| e.event),
            Some(PlayerEvent::TextTrackAsked { language: Some(ref l), .. }) if l == "fr"
        ));

        provider.hide_text_tracks();
        assert!(!factory.script().text_visible);
        assert!(!provider.set_forced_text_track());
    }

    #[tokio::test]
    async fn test_destroy_is_terminal() {
        let factory = MockEngineFactory::new();
        let media = MockMedia::new();
        let bus = EventBus::new();
        let inbox = Inbox::attach(&bus);
        let mut provider = adapter(&factory, &media, &bus);

        provider.destroy().await.unwrap();
        let names: Vec<String> = drain(&inbox).iter().map(BusEvent::name).collect();
        assert_eq!(names, ["videotracks", "audiotracks", "texttracks"]);
        assert_eq!(factory.script().destroys, 1);

        let result = provider.load("main.m3u8", None, None, settings(false)).await;
        assert!(matches!(result, Err(Error::ProviderDestroyed)));
        assert!(provider.destroy().await.is_ok());
        assert_eq!(factory.script().destroys, 1);
    }

    #[tokio::test]
    async fn test_drm_configuration_reaches_engine() {
        let factory = MockEngineFactory::new();
        let media = MockMedia::new();
        let bus = EventBus::new();
        let mut provider = adapter(&factory, &media, &bus);
        let drm = DrmConfig::widevine(url::Url::parse("https://license.example.com/wv").unwrap())
            .with_header("X-Token", "abc");

        provider.load("main.m3u8", Some(&drm), None, settings(false)).await.unwrap();

        let script = factory.script();
        assert_eq!(script.request_filters, 1);
        assert!(script
            .configs
            .iter()
            .any(|c| c.pointer("/drm/servers/com.widevine.alpha").is_some()));
    }
}
