//! Playlist navigation

use crate::types::PlaylistEntry;
use tracing::debug;

/// What to do after a `next` or `previous` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Load the entry at this index
    Load(usize),
    /// Wait for the post-roll to end first
    Deferred,
    /// Nothing to move to
    None,
}

/// Ordered entries and the current index
#[derive(Debug, Clone, Default)]
pub struct PlaylistController {
    entries: Vec<PlaylistEntry>,
    index: usize,
    awaiting_post_roll: bool,
}

impl PlaylistController {
    pub fn new(entries: Vec<PlaylistEntry>) -> Self {
        Self {
            entries,
            index: 0,
            awaiting_post_roll: false,
        }
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&PlaylistEntry> {
        self.entries.get(self.index)
    }

    pub fn get(&self, index: usize) -> Option<&PlaylistEntry> {
        self.entries.get(index)
    }

    /// Point at `index` without loading anything
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.index = index;
        self.awaiting_post_roll = false;
        true
    }

    pub fn is_awaiting_post_roll(&self) -> bool {
        self.awaiting_post_roll
    }

    /// `next`: immediate on click or without a post-roll, otherwise after the ad
    pub fn on_next(&mut self, coming_from_click: bool, post_roll_pending: bool) -> Advance {
        if self.index + 1 >= self.entries.len() {
            debug!(index = self.index, "End of playlist");
            return Advance::None;
        }
        if post_roll_pending && !coming_from_click {
            self.awaiting_post_roll = true;
            return Advance::Deferred;
        }
        self.awaiting_post_roll = false;
        self.index += 1;
        Advance::Load(self.index)
    }

    pub fn on_previous(&mut self) -> Advance {
        if self.index == 0 {
            return Advance::None;
        }
        self.awaiting_post_roll = false;
        self.index -= 1;
        Advance::Load(self.index)
    }

    /// The post-roll ended: take the deferred step, once
    pub fn on_ad_ended(&mut self) -> Advance {
        if !self.awaiting_post_roll {
            return Advance::None;
        }
        self.awaiting_post_roll = false;
        if self.index + 1 >= self.entries.len() {
            return Advance::None;
        }
        self.index += 1;
        Advance::Load(self.index)
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.awaiting_post_roll = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(n: usize) -> PlaylistController {
        PlaylistController::new((0..n).map(|i| PlaylistEntry::new(format!("{i}.mp4"))).collect())
    }

    #[test]
    fn test_next_and_previous() {
        let mut p = playlist(3);
        assert_eq!(p.on_previous(), Advance::None);
        assert_eq!(p.on_next(false, false), Advance::Load(1));
        assert_eq!(p.on_next(true, false), Advance::Load(2));
        assert_eq!(p.on_next(false, false), Advance::None);
        assert_eq!(p.on_previous(), Advance::Load(1));
        assert_eq!(p.current().map(|e| e.video_url.as_str()), Some("1.mp4"));
    }

    #[test]
    fn test_post_roll_defers_once() {
        let mut p = playlist(2);
        assert_eq!(p.on_next(false, true), Advance::Deferred);
        assert_eq!(p.index(), 0);

        assert_eq!(p.on_ad_ended(), Advance::Load(1));
        assert_eq!(p.on_ad_ended(), Advance::None);
    }

    #[test]
    fn test_click_skips_post_roll() {
        let mut p = playlist(2);
        assert_eq!(p.on_next(true, true), Advance::Load(1));
        assert_eq!(p.on_ad_ended(), Advance::None);
    }

    #[test]
    fn test_select_out_of_range() {
        let mut p = playlist(1);
        assert!(!p.select(4));
        assert!(p.select(0));
    }
}
