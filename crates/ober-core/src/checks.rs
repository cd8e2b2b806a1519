//! Checks run before an entry is loaded
//!
//! An entry does not reach the engine while one of these blocks it:
//! - rights: outside the availability window
//! - time restriction: outside the allowed hours of the day (local time)
//! - age restriction: until the viewer confirms their age

use crate::error::{Error, Result};
use crate::i18n::Translator;
use crate::state::{Message, MessageIcon};
use crate::types::{Restrictions, Rights, TimeWindow};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason an entry cannot be loaded right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "camelCase")]
pub enum Blocker {
    NotYetAvailable { from: DateTime<Utc> },
    Expired { to: DateTime<Utc> },
    OutsideAllowedHours { from: String, to: String },
    /// Needs an explicit accept from the viewer
    AgeConfirmation { age: u8 },
}

impl Blocker {
    /// Notice shown in place of the video
    pub fn message(&self, translator: &dyn Translator) -> Message {
        match self {
            Blocker::NotYetAvailable { from } => Message::new(
                Some(MessageIcon::Clock),
                translator.t(
                    "message.rights.notYetAvailable",
                    &[("date", &from.format("%Y-%m-%d %H:%M UTC").to_string())],
                ),
            ),
            Blocker::Expired { .. } => Message::new(
                Some(MessageIcon::Clock),
                translator.t("message.rights.expired", &[]),
            ),
            Blocker::OutsideAllowedHours { from, to } => Message::new(
                Some(MessageIcon::Clock),
                translator.t("message.restrictions.time", &[("from", from), ("to", to)]),
            ),
            Blocker::AgeConfirmation { age } => Message::new(
                Some(MessageIcon::Lock),
                translator.t("message.restrictions.age", &[("age", &age.to_string())]),
            ),
        }
    }
}

/// Run every check. Rights come first, the age confirmation last.
pub fn blocking_checks(
    restrictions: Option<&Restrictions>,
    rights: Option<&Rights>,
    now: DateTime<Utc>,
    local_time: NaiveTime,
) -> Result<Vec<Blocker>> {
    let mut blockers = Vec::new();

    if let Some(rights) = rights {
        if let Some(from) = rights.from.filter(|from| now < *from) {
            blockers.push(Blocker::NotYetAvailable { from });
        }
        if let Some(to) = rights.to.filter(|to| now >= *to) {
            blockers.push(Blocker::Expired { to });
        }
    }

    if let Some(restrictions) = restrictions {
        if let Some(window) = &restrictions.time {
            if !is_within_window(window, local_time)? {
                blockers.push(Blocker::OutsideAllowedHours {
                    from: window.from.clone(),
                    to: window.to.clone(),
                });
            }
        }
        if let Some(age) = restrictions.age {
            blockers.push(Blocker::AgeConfirmation { age });
        }
    }

    Ok(blockers)
}

/// True when `time` falls inside the window; windows may wrap past midnight
pub fn is_within_window(window: &TimeWindow, time: NaiveTime) -> Result<bool> {
    let from = parse_clock(&window.from)?;
    let to = parse_clock(&window.to)?;

    Ok(if from <= to {
        time >= from && time < to
    } else {
        time >= from || time < to
    })
}

fn parse_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M:%S"))
        .map_err(|e| Error::config(format!("invalid restriction time {:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Catalog, Locale};
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_checks() {
        assert!(blocking_checks(None, None, now(), at(12, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_rights_window() {
        let future = Rights {
            from: Some(Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()),
            to: None,
        };
        let past = Rights {
            from: None,
            to: Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()),
        };
        let open = Rights {
            from: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap()),
        };

        assert!(matches!(
            blocking_checks(None, Some(&future), now(), at(12, 0)).unwrap()[..],
            [Blocker::NotYetAvailable { .. }]
        ));
        assert!(matches!(
            blocking_checks(None, Some(&past), now(), at(12, 0)).unwrap()[..],
            [Blocker::Expired { .. }]
        ));
        assert!(blocking_checks(None, Some(&open), now(), at(12, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_time_window_wraps_midnight() {
        let night = TimeWindow {
            from: "22:30".to_string(),
            to: "05:00".to_string(),
        };

        assert!(is_within_window(&night, at(23, 0)).unwrap());
        assert!(is_within_window(&night, at(4, 59)).unwrap());
        assert!(!is_within_window(&night, at(12, 0)).unwrap());
        assert!(!is_within_window(&night, at(5, 0)).unwrap());
    }

    #[test]
    fn test_invalid_window() {
        let broken = TimeWindow {
            from: "late".to_string(),
            to: "05:00".to_string(),
        };
        assert!(matches!(is_within_window(&broken, at(1, 0)), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_age_comes_last() {
        let restrictions = Restrictions {
            age: Some(16),
            time: Some(TimeWindow {
                from: "20:00".to_string(),
                to: "23:00".to_string(),
            }),
        };

        let blockers = blocking_checks(Some(&restrictions), None, now(), at(12, 0)).unwrap();
        assert!(matches!(
            blockers[..],
            [Blocker::OutsideAllowedHours { .. }, Blocker::AgeConfirmation { age: 16 }]
        ));
    }

    #[test]
    fn test_messages() {
        let catalog = Catalog::new(Locale::En);
        let message = Blocker::AgeConfirmation { age: 18 }.message(&catalog);

        assert_eq!(message.icon, Some(MessageIcon::Lock));
        assert_eq!(message.text, "This video is not suitable for viewers under 18");
    }
}
