//! State survives closing and reopening the SQLite store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use vidzly_core::notifications::{lock_hub, NoopNotifier, SkipReason};
use vidzly_core::storage::SharedStore;
use vidzly_core::{
    Catalog, Config, ContentItem, Engine, OfflineGenerator, ScheduledKind, SqliteStore,
    StreakTransition,
};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, day, hour, 0, 0).unwrap()
}

fn catalog() -> Catalog {
    Catalog::new(
        (0..6)
            .map(|i| ContentItem::new(format!("v{i}"), format!("Video {i}"), 100 * (i + 1)))
            .collect(),
    )
}

fn engine(dir: &TempDir) -> Engine<OfflineGenerator> {
    let store: SharedStore = Arc::new(SqliteStore::open_at(&dir.path().join("vidzly.db")).unwrap());
    Engine::new(store, Arc::new(NoopNotifier), OfflineGenerator, &Config::default()).with_seed(9)
}

fn log_ids(engine: &Engine<OfflineGenerator>) -> Vec<String> {
    lock_hub(engine.hub())
        .center()
        .notifications()
        .iter()
        .map(|n| n.id.clone())
        .collect()
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let catalog = catalog();
    let none = HashSet::new();

    let (first_ids, first_feed) = {
        let mut engine = engine(&dir);
        let report = engine.activate(at(1, 9), &catalog, &none).await;
        assert_eq!(report.streak, StreakTransition::Started);
        assert!(report.permission_notice.is_some());
        let feed = report.feed.expect("local feed");
        (log_ids(&engine), feed)
    };
    assert!(!first_ids.is_empty());

    let mut engine = engine(&dir);
    assert_eq!(engine.tracker().streak().count, 1);
    assert_eq!(engine.tracker().last_active(), Some(at(1, 9)));
    assert_eq!(
        engine.scheduler().last_fired(ScheduledKind::DailyHighlight),
        Some(at(1, 9))
    );
    assert_eq!(log_ids(&engine), first_ids);
    assert_eq!(engine.feeds().latest().map(|f| f.id), Some(first_feed.id.clone()));

    let report = engine.activate(at(1, 18), &catalog, &none).await;
    assert_eq!(report.streak, StreakTransition::NoChange);
    assert!(report.permission_notice.is_none());
    let daily = report
        .scheduled
        .iter()
        .find(|run| run.kind == ScheduledKind::DailyHighlight)
        .unwrap();
    assert_eq!(daily.outcome.skip_reason(), Some(SkipReason::CooldownActive));
    assert_eq!(report.feed.map(|f| f.id), Some(first_feed.id));

    let ids = log_ids(&engine);
    assert!(first_ids.iter().all(|id| ids.contains(id)));
}

#[tokio::test]
async fn test_streak_advances_across_reopen() {
    let dir = TempDir::new().unwrap();
    let catalog = catalog();
    let none = HashSet::new();

    engine(&dir).activate(at(1, 9), &catalog, &none).await;
    let report = engine(&dir).activate(at(2, 10), &catalog, &none).await;
    assert_eq!(report.streak, StreakTransition::Incremented(2));

    let report = engine(&dir).activate(at(5, 10), &catalog, &none).await;
    assert_eq!(report.streak, StreakTransition::Broken);
    assert_eq!(engine(&dir).tracker().streak().count, 0);
}

#[test]
fn test_read_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let engine = engine(&dir);
        let mut hub = lock_hub(engine.hub());
        let id = hub
            .announce_permission_once(at(1, 9))
            .expect("permission notice");
        assert!(hub.center_mut().mark_read(&id));
        id
    };

    let engine = engine(&dir);
    let hub = lock_hub(engine.hub());
    assert_eq!(hub.center().get(&id).map(|n| n.read), Some(true));
    assert_eq!(hub.center().unread_count(), 0);
}
