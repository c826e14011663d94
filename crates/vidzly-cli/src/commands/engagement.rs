use chrono::{DateTime, Utc};
use serde::Serialize;
use vidzly_core::engagement::{BadgeDefinition, ALL_BADGES};
use vidzly_core::{BadgeId, Progress};

use super::{categories, print_json, CliResult, Session};

pub async fn activate(now: DateTime<Utc>, favorite_categories: Vec<String>) -> CliResult {
    let mut session = Session::open()?;
    let favorites = categories(favorite_categories);
    let report = session.engine.activate(now, &session.catalog, &favorites).await;
    print_json(&report)
}

pub fn watch(now: DateTime<Utc>, favorite_categories: Vec<String>) -> CliResult {
    let mut session = Session::open()?;
    let awarded = session.engine.record_watch(now, &categories(favorite_categories));

    #[derive(Serialize)]
    struct WatchResult {
        progress: Progress,
        awarded: Vec<BadgeId>,
    }
    print_json(&WatchResult {
        progress: session.engine.tracker().progress(),
        awarded,
    })
}

pub fn badges() -> CliResult {
    let session = Session::open()?;
    let tracker = session.engine.tracker();

    #[derive(Serialize)]
    struct BadgeRow<'a> {
        #[serde(flatten)]
        badge: &'a BadgeDefinition,
        earned: bool,
    }
    #[derive(Serialize)]
    struct BadgeReport<'a> {
        progress: Progress,
        badges: Vec<BadgeRow<'a>>,
    }

    let badges = ALL_BADGES
        .iter()
        .map(|badge| BadgeRow {
            badge,
            earned: tracker.is_earned(badge.id),
        })
        .collect();
    print_json(&BadgeReport {
        progress: tracker.progress(),
        badges,
    })
}

pub fn streak() -> CliResult {
    let session = Session::open()?;
    let tracker = session.engine.tracker();

    #[derive(Serialize)]
    struct StreakReport {
        count: u32,
        last_updated: Option<DateTime<Utc>>,
        last_active: Option<DateTime<Utc>>,
    }
    let state = tracker.streak();
    print_json(&StreakReport {
        count: state.count,
        last_updated: state.last_updated,
        last_active: tracker.last_active(),
    })
}
