//! Player Session - public facade of one widget
//!
//! Coordinates:
//! - Setup options and the localization context
//! - The player state machine on the host's media element
//! - Playlist navigation (`next` / `previous`, post-roll deferral)
//! - Linear ad breaks
//! - Event subscriptions for the page

use crate::{
    ads::AdBreakController,
    bus::{EventBus, EventFilter, Inbox, Subscription},
    config::PlayerOptions,
    engine::EngineEvent,
    events::{BusEvent, EventSource, PlayerEvent},
    host::Host,
    i18n::{Catalog, Locale, Translator},
    media::MediaEvent,
    player::Player,
    playlist::{Advance, PlaylistController},
    provider::AutoplayOutcome,
    types::{PlaylistEntry, SessionId},
    Error, Result,
};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Per-session settings shared with the player
#[derive(Clone)]
pub struct SessionContext {
    pub translator: Arc<dyn Translator>,
    pub locale: Locale,
    /// Verbose lifecycle logging
    pub debug: bool,
    pub stylesheet_url: String,
}

impl SessionContext {
    pub fn from_options(options: &PlayerOptions) -> Self {
        let locale = options.locale();
        let mut catalog = Catalog::new(locale);
        if let Some(phrases) = &options.phrases {
            catalog = catalog.with_phrases(phrases);
        }
        Self {
            translator: Arc::new(catalog),
            locale,
            debug: options.debug,
            stylesheet_url: options.stylesheet_url(),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::from_options(&PlayerOptions::default())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("locale", &self.locale)
            .field("debug", &self.debug)
            .field("stylesheet_url", &self.stylesheet_url)
            .finish()
    }
}

/// One widget instance on a host element
pub struct PlayerSession {
    /// Unique session ID
    id: SessionId,
    /// Page collaborators
    host: Host,
    bus: EventBus,
    /// Routes `next` / `previous` / ad `ended`
    inbox: Inbox,
    /// Present once set up
    options: Option<PlayerOptions>,
    ctx: SessionContext,
    /// Created by the first load
    player: Option<Player>,
    playlist: PlaylistController,
    ads: AdBreakController,
}

impl PlayerSession {
    /// Create a session on a host element
    pub fn new(host: Host) -> Self {
        let bus = EventBus::new();
        Self {
            id: SessionId::new(),
            inbox: Inbox::attach(&bus),
            bus,
            host,
            options: None,
            ctx: SessionContext::default(),
            player: None,
            playlist: PlaylistController::default(),
            ads: AdBreakController::new(),
        }
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn is_setup(&self) -> bool {
        self.options.is_some()
    }

    pub fn playlist(&self) -> &PlaylistController {
        &self.playlist
    }

    pub fn ads(&self) -> &AdBreakController {
        &self.ads
    }

    /// Control API entry point; rejected before the first load
    pub fn player(&self) -> Result<&Player> {
        self.player.as_ref().ok_or(Error::NotSetup)
    }

    pub fn player_mut(&mut self) -> Result<&mut Player> {
        self.player.as_mut().ok_or(Error::NotSetup)
    }

    /// Set the widget up and load the first entry
    #[instrument(skip(self, options), fields(session_id = %self.id))]
    pub async fn setup(&mut self, options: PlayerOptions) -> Result<()> {
        if self.options.is_some() {
            return Err(Error::AlreadySetup);
        }

        let options = PlayerOptions::merged(self.host.data_options.as_deref(), &options)?;
        self.ctx = SessionContext::from_options(&options);
        self.playlist = PlaylistController::new(options.playlist.clone());
        info!(
            locale = %self.ctx.locale,
            entries = self.playlist.len(),
            "Player setup"
        );
        self.options = Some(options);

        self.bus.emit(PlayerEvent::Setup);
        if let Some(entry) = self.playlist.current().cloned() {
            self.load_entry(entry).await?;
        }
        self.process_pending().await
    }

    /// Load an entry on the existing player
    #[instrument(skip(self, entry), fields(session_id = %self.id))]
    pub async fn load(&mut self, entry: PlaylistEntry) -> Result<()> {
        self.load_entry(entry).await?;
        self.process_pending().await
    }

    /// Load the playlist entry at `index`; out of range is a no-op
    pub async fn load_index(&mut self, index: usize) -> Result<()> {
        if !self.playlist.select(index) {
            debug!(index, "Playlist index out of range");
            return Ok(());
        }
        match self.playlist.current().cloned() {
            Some(entry) => self.load(entry).await,
            None => Ok(()),
        }
    }

    async fn load_entry(&mut self, entry: PlaylistEntry) -> Result<()> {
        if self.options.is_none() {
            return Err(Error::NotSetup);
        }

        self.ads.reset();
        self.bus.emit(PlayerEvent::Load {
            playlist_item: Box::new(entry.clone()),
        });

        match self.player.as_mut() {
            Some(player) => player.reconfigure(entry).await,
            None => {
                let mut player = Player::new(&self.host, self.bus.clone(), self.ctx.clone(), entry);
                let result = player.initialize(self.host.width).await;
                self.player = Some(player);
                result
            }
        }
    }

    /// Tear the player down; the session can be set up again afterwards
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn destroy(&mut self) -> Result<()> {
        if let Some(mut player) = self.player.take() {
            player.teardown().await?;
        }
        self.playlist.reset();
        self.ads.reset();
        self.inbox.clear();
        self.options = None;
        info!("Player destroyed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Subscribe to a public channel such as `time`, `adplay` or `*`
    pub fn on<F>(&self, name: &str, handler: F) -> Result<Subscription>
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let filter = Self::filter(name)?;
        Ok(self.bus.subscribe(filter, handler))
    }

    pub fn once<F>(&self, name: &str, handler: F) -> Result<Subscription>
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let filter = Self::filter(name)?;
        Ok(self.bus.once(filter, handler))
    }

    pub fn off(&self, subscription: &Subscription) -> bool {
        subscription.unsubscribe()
    }

    /// Publish an event as if a component had emitted it
    pub fn trigger(&self, event: BusEvent) {
        self.bus.publish(event);
    }

    fn filter(name: &str) -> Result<EventFilter> {
        EventFilter::from_name(name).ok_or_else(|| Error::config(format!("unknown event '{}'", name)))
    }

    // ------------------------------------------------------------------
    // Ads
    // ------------------------------------------------------------------

    pub fn start_linear_ad_mode(&mut self) -> Result<()> {
        let player = self.player.as_mut().ok_or(Error::NotSetup)?;
        self.ads.start_linear_ad_mode(player);
        Ok(())
    }

    pub async fn end_linear_ad_mode(&mut self) -> Result<()> {
        let player = self.player.as_mut().ok_or(Error::NotSetup)?;
        self.ads.end_linear_ad_mode(player).await;
        self.process_pending().await
    }

    pub async fn load_ad_video(&mut self, url: &str) -> Result<AutoplayOutcome> {
        let player = self.player.as_mut().ok_or(Error::NotSetup)?;
        let outcome = player.load_ad_video(url).await?;
        self.process_pending().await?;
        Ok(outcome)
    }

    /// The ad plugin has a post-roll for the current entry
    pub fn schedule_post_roll(&mut self, pending: bool) {
        self.ads.schedule_post_roll(pending);
    }

    // ------------------------------------------------------------------
    // Host event pumps
    // ------------------------------------------------------------------

    pub async fn handle_media_event(&mut self, event: &MediaEvent) -> Result<()> {
        if let Some(player) = self.player.as_mut() {
            player.handle_media_event(event);
        }
        self.process_pending().await
    }

    pub async fn handle_engine_event(&mut self, event: EngineEvent) -> Result<()> {
        if let Some(player) = self.player.as_mut() {
            player.handle_engine_event(event);
        }
        self.process_pending().await
    }

    pub async fn fire_due_timers(&mut self) -> Result<()> {
        if let Some(player) = self.player.as_mut() {
            player.fire_due_timers().await;
        }
        self.process_pending().await
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.player.as_ref().and_then(Player::next_deadline)
    }

    /// Route playlist and ad signals queued on the bus
    pub async fn process_pending(&mut self) -> Result<()> {
        while let Some(event) = self.inbox.pop() {
            let advance = match (&event.source, &event.event) {
                (EventSource::Main, PlayerEvent::Next { coming_from_click }) => self
                    .playlist
                    .on_next(*coming_from_click, self.ads.post_roll_pending()),
                (EventSource::Main, PlayerEvent::Previous { .. }) => self.playlist.on_previous(),
                (EventSource::Ad, PlayerEvent::Ended) => self.playlist.on_ad_ended(),
                _ => continue,
            };

            match advance {
                Advance::Load(index) => {
                    let Some(entry) = self.playlist.get(index).cloned() else {
                        continue;
                    };
                    info!(index, url = %entry.video_url, "Playlist advance");
                    if let Err(e) = self.load_entry(entry).await {
                        warn!(error = %e, "Playlist entry failed to load");
                    }
                }
                Advance::Deferred => debug!("Advance deferred until the post-roll ends"),
                Advance::None => {}
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSession")
            .field("id", &self.id)
            .field("setup", &self.is_setup())
            .field("index", &self.playlist.index())
            .field("player", &self.player)
            .finish()
    }
}
