//! Daily activity streak.
//!
//! A streak counts consecutive calendar days with activity. It advances at
//! most once per calendar day, continues when the previous activity was on
//! the previous calendar day, and breaks once more than the break window
//! has elapsed since it last advanced.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::StreakConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub count: u32,
    /// When the streak last advanced. `None` when it has never advanced
    /// or was reset.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", content = "count", rename_all = "snake_case")]
pub enum StreakTransition {
    Started,
    Incremented(u32),
    Broken,
    NoChange,
}

/// Day boundary and break window.
#[derive(Debug, Clone, Copy)]
pub struct StreakRules {
    offset: FixedOffset,
    break_after: Duration,
}

impl StreakRules {
    pub fn new(offset: FixedOffset, break_after: Duration) -> Self {
        Self {
            offset,
            break_after,
        }
    }

    pub fn from_config(config: &StreakConfig) -> Self {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| {
                tracing::warn!(
                    minutes = config.utc_offset_minutes,
                    "invalid streak utc offset, using UTC"
                );
                Utc.fix()
            });
        Self::new(offset, Duration::hours(config.break_after_hours.into()))
    }

    /// Calendar day of a timestamp in the configured offset.
    pub fn day(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Compute the next state.
    ///
    /// `previous_activity` is the last recorded activity before `now`.
    pub fn advance(
        &self,
        state: StreakState,
        previous_activity: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> (StreakState, StreakTransition) {
        let today = self.day(now);
        if state.last_updated.is_some_and(|at| self.day(at) == today) {
            return (state, StreakTransition::NoChange);
        }

        let yesterday = today.pred_opt();
        let active_yesterday =
            previous_activity.is_some_and(|at| Some(self.day(at)) == yesterday);

        if active_yesterday || state.count == 0 {
            let count = state.count.saturating_add(1);
            let next = StreakState {
                count,
                last_updated: Some(now),
            };
            let transition = if count == 1 {
                StreakTransition::Started
            } else {
                StreakTransition::Incremented(count)
            };
            return (next, transition);
        }

        let lapsed = state
            .last_updated
            .map_or(true, |at| now.signed_duration_since(at) > self.break_after);
        if lapsed {
            (StreakState::default(), StreakTransition::Broken)
        } else {
            (state, StreakTransition::NoChange)
        }
    }
}

impl Default for StreakRules {
    fn default() -> Self {
        Self::from_config(&StreakConfig::default())
    }
}
