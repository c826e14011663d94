//! Property tests for the notification log.
//!
//! Random operation sequences are applied to a real center and to a plain
//! vector model; the two must agree after every step and after a reload.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;
use vidzly_core::storage::SharedStore;
use vidzly_core::{MemoryStore, NotificationCenter, NotificationKind, NotificationRecord};

const CAPACITY: usize = 5;

#[derive(Debug, Clone)]
enum Op {
    Push,
    MarkRead(usize),
    Remove(usize),
    MarkAll,
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => Just(Op::Push),
        3 => (0usize..8).prop_map(Op::MarkRead),
        2 => (0usize..8).prop_map(Op::Remove),
        1 => Just(Op::MarkAll),
        1 => Just(Op::Clear),
    ]
}

fn snapshot(center: &NotificationCenter) -> Vec<(String, bool)> {
    center
        .notifications()
        .iter()
        .map(|n| (n.id.clone(), n.read))
        .collect()
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn log_matches_model(ops in proptest::collection::vec(op(), 0..40)) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let mut center = NotificationCenter::load(store.clone(), CAPACITY);
        let mut model: Vec<(String, bool)> = Vec::new();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        for op in ops {
            match op {
                Op::Push => {
                    let record = NotificationRecord::new(
                        NotificationKind::HumorousSurprise,
                        "Surprise!",
                        "body",
                        now,
                    );
                    let id = center.push(record);
                    model.insert(0, (id, false));
                    model.truncate(CAPACITY);
                }
                Op::MarkRead(i) => {
                    if let Some(entry) = model.get_mut(i) {
                        let changed = center.mark_read(&entry.0);
                        prop_assert_eq!(changed, !entry.1);
                        entry.1 = true;
                    } else {
                        prop_assert!(!center.mark_read("inapp_missing"));
                    }
                }
                Op::Remove(i) => {
                    if i < model.len() {
                        let (id, _) = model.remove(i);
                        prop_assert!(center.remove(&id));
                        prop_assert!(!center.remove(&id));
                    } else {
                        prop_assert!(!center.remove("inapp_missing"));
                    }
                }
                Op::MarkAll => {
                    center.mark_all_read();
                    for entry in &mut model {
                        entry.1 = true;
                    }
                }
                Op::Clear => {
                    center.clear_all();
                    model.clear();
                }
            }

            prop_assert!(center.len() <= CAPACITY);
            prop_assert_eq!(snapshot(&center), model.clone());
            let unread = model.iter().filter(|(_, read)| !read).count();
            prop_assert_eq!(center.unread_count(), unread);
        }

        let reloaded = NotificationCenter::load(store, CAPACITY);
        prop_assert_eq!(snapshot(&reloaded), model);
    }
}

#[test]
fn test_reload_with_smaller_capacity_keeps_newest() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let mut center = NotificationCenter::load(store.clone(), 10);
    let ids: Vec<String> = (0..6)
        .map(|i| {
            center.push(NotificationRecord::new(
                NotificationKind::DailyHighlight,
                format!("n{i}"),
                "body",
                now,
            ))
        })
        .collect();

    let reloaded = NotificationCenter::load(store, 3);
    let kept: Vec<&str> = reloaded
        .notifications()
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(kept, vec![ids[5].as_str(), ids[4].as_str(), ids[3].as_str()]);
}
