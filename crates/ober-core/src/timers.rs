//! Cancellable one-shot timers
//!
//! Deadlines live on the tokio clock, so tests can drive them with a paused
//! runtime and `tokio::time::advance`. Arming a timer that is already armed
//! replaces its deadline.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Timers the player uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Pending play/pause toggle of a single click
    SingleClick,
    /// Grace period before showing the buffering spinner
    BufferingGrace,
    /// Hides the controls after pointer inactivity
    ControlsAutoHide,
    /// Accepts taps again after a touch start
    TouchClickRearm,
}

/// Registry of armed timers
#[derive(Debug, Default)]
pub struct Timers {
    deadlines: HashMap<TimerKind, Instant>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire `delay` from now
    pub fn arm(&mut self, kind: TimerKind, delay: Duration) {
        self.deadlines.insert(kind, Instant::now() + delay);
    }

    /// Returns true when the timer was armed
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.deadlines.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.deadlines.clear();
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    /// Earliest deadline, if any timer is armed
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Disarm and return every timer due at `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due: Vec<(Instant, TimerKind)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(kind, deadline)| (*deadline, *kind))
            .collect();
        due.sort_by_key(|(deadline, _)| *deadline);

        for (_, kind) in &due {
            self.deadlines.remove(kind);
        }
        due.into_iter().map(|(_, kind)| kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut timers = Timers::new();
        timers.arm(TimerKind::BufferingGrace, Duration::from_millis(500));

        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(timers.take_due(Instant::now()).is_empty());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(timers.take_due(Instant::now()), vec![TimerKind::BufferingGrace]);
        assert!(!timers.is_armed(TimerKind::BufferingGrace));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_deadline() {
        let mut timers = Timers::new();
        timers.arm(TimerKind::ControlsAutoHide, Duration::from_millis(2000));
        tokio::time::advance(Duration::from_millis(1500)).await;
        timers.arm(TimerKind::ControlsAutoHide, Duration::from_millis(2000));

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(timers.take_due(Instant::now()).is_empty());

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert_eq!(timers.take_due(Instant::now()), vec![TimerKind::ControlsAutoHide]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_in_deadline_order() {
        let mut timers = Timers::new();
        timers.arm(TimerKind::ControlsAutoHide, Duration::from_millis(300));
        timers.arm(TimerKind::SingleClick, Duration::from_millis(100));
        assert!(timers.cancel(TimerKind::SingleClick));
        timers.arm(TimerKind::SingleClick, Duration::from_millis(200));

        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(
            timers.take_due(Instant::now()),
            vec![TimerKind::SingleClick, TimerKind::ControlsAutoHide]
        );
        assert_eq!(timers.next_deadline(), None);
    }
}
