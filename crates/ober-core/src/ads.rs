//! Linear ad breaks
//!
//! The ad integration drives a break through [`AdBreakController`]: it takes
//! over the shared media element, remembers where main content stood, and
//! gives the element back afterwards.

use crate::events::PlayerEvent;
use crate::player::Player;
use tracing::{debug, info, instrument, warn};

/// Ad break bookkeeping for one session
#[derive(Debug, Default)]
pub struct AdBreakController {
    /// Main content position to resume at; `None` when the break came after the end
    resume_position: Option<f64>,
    in_break: bool,
    /// The break started once main content had played to its end
    after_end: bool,
    post_roll_pending: bool,
}

impl AdBreakController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_ad_break(&self) -> bool {
        self.in_break
    }

    /// A post-roll is scheduled for the current entry
    pub fn post_roll_pending(&self) -> bool {
        self.post_roll_pending
    }

    pub fn schedule_post_roll(&mut self, pending: bool) {
        self.post_roll_pending = pending;
    }

    pub fn resume_position(&self) -> Option<f64> {
        self.resume_position
    }

    /// Forget any break in progress; called when a new entry loads
    pub fn reset(&mut self) {
        self.resume_position = None;
        self.in_break = false;
        self.after_end = false;
        self.post_roll_pending = false;
    }

    /// Hand the media element over to ads
    #[instrument(skip(self, player), fields(session_id = %player.id()))]
    pub fn start_linear_ad_mode(&mut self, player: &mut Player) {
        player.bus().emit(PlayerEvent::AdStart);

        let position = player.position();
        let duration = player.duration();
        // unknown (zero or NaN) duration gives no resume point either
        self.resume_position = (position < duration).then_some(position);
        self.after_end = duration > 0.0 && duration.is_finite() && position >= duration;
        self.in_break = true;

        player.enter_ad_mode();
        player.process_pending();
        info!(resume = ?self.resume_position, "Linear ad mode started");
    }

    /// Give the media element back to main content
    #[instrument(skip(self, player), fields(session_id = %player.id()))]
    pub async fn end_linear_ad_mode(&mut self, player: &mut Player) {
        if !self.in_break {
            debug!("No ad break in progress");
            return;
        }
        self.in_break = false;

        let resume = self.resume_position.take();
        if std::mem::take(&mut self.after_end) {
            self.post_roll_pending = false;
        }
        player.leave_ad_mode(resume);
        if let Err(e) = player.reload_main_content().await {
            warn!(error = %e, "Main content reload after ad break failed");
        }
        info!(?resume, "Linear ad mode ended");
    }
}
