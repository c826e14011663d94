//! Bounded notification log.
//!
//! Newest first. Insertion is always at the head and overflow drops the
//! tail, so the retained entries are the most recently pushed ones
//! regardless of their timestamps. Every mutation writes the whole log as
//! one record and then broadcasts a [`CenterEvent`].

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::{NotificationId, NotificationPreferences, NotificationRecord};
use crate::storage::{keys, load_or_default, persist, SharedStore};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change signal for observers of the log.
///
/// Observers re-read what they need (list, unread count) on receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CenterEvent {
    Pushed { id: NotificationId },
    MarkedRead { id: NotificationId },
    AllMarkedRead,
    Removed { id: NotificationId },
    Cleared,
}

pub struct NotificationCenter {
    store: SharedStore,
    log: Vec<NotificationRecord>,
    capacity: usize,
    events: broadcast::Sender<CenterEvent>,
}

impl NotificationCenter {
    /// Load the persisted log, trimming it if the capacity shrank.
    pub fn load(store: SharedStore, capacity: usize) -> Self {
        let mut log: Vec<NotificationRecord> =
            load_or_default(store.as_ref(), keys::NOTIFICATION_LOG);
        log.truncate(capacity);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            log,
            capacity,
            events,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The log, newest first.
    pub fn notifications(&self) -> &[NotificationRecord] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.log.iter().find(|n| n.id == id)
    }

    /// Entries the user's in-app category switches allow.
    pub fn visible<'a>(
        &'a self,
        prefs: &'a NotificationPreferences,
    ) -> impl Iterator<Item = &'a NotificationRecord> + 'a {
        self.log.iter().filter(|n| prefs.shows(n.kind.category()))
    }

    /// Always recomputed from the log.
    pub fn unread_count(&self) -> usize {
        self.log.iter().filter(|n| !n.read).count()
    }

    /// Subscribe to change signals. Sending never blocks on subscribers.
    pub fn subscribe(&self) -> broadcast::Receiver<CenterEvent> {
        self.events.subscribe()
    }

    /// Prepend a record, evicting the oldest past capacity.
    pub fn push(&mut self, record: NotificationRecord) -> NotificationId {
        let id = record.id.clone();
        tracing::debug!(id = %id, kind = ?record.kind, "notification pushed");
        self.log.insert(0, record);
        self.log.truncate(self.capacity);
        self.commit(CenterEvent::Pushed { id: id.clone() });
        id
    }

    /// Returns false if the id is unknown or already read.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.log.iter_mut().find(|n| n.id == id) {
            Some(record) if !record.read => {
                record.read = true;
                self.commit(CenterEvent::MarkedRead { id: id.to_string() });
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for record in &mut self.log {
            record.read = true;
        }
        self.commit(CenterEvent::AllMarkedRead);
    }

    /// Returns false if the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.log.len();
        self.log.retain(|n| n.id != id);
        if self.log.len() == before {
            return false;
        }
        self.commit(CenterEvent::Removed { id: id.to_string() });
        true
    }

    pub fn clear_all(&mut self) {
        self.log.clear();
        self.commit(CenterEvent::Cleared);
    }

    fn commit(&self, event: CenterEvent) {
        persist(self.store.as_ref(), keys::NOTIFICATION_LOG, &self.log);
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationKind;
    use crate::storage::{read_record, KvStore, MemoryStore};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn record(kind: NotificationKind, title: &str) -> NotificationRecord {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        NotificationRecord::new(kind, title, "body", at)
    }

    fn center(capacity: usize) -> (Arc<MemoryStore>, NotificationCenter) {
        let store = Arc::new(MemoryStore::new());
        let center = NotificationCenter::load(store.clone(), capacity);
        (store, center)
    }

    #[test]
    fn push_prepends_and_evicts_oldest() {
        let (_, mut center) = center(3);
        center.push(record(NotificationKind::DailyHighlight, "daily"));
        center.push(record(NotificationKind::WeeklyRoundup, "weekly"));
        center.push(record(NotificationKind::BadgeEarned, "badge"));

        let titles: Vec<&str> = center.notifications().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["badge", "weekly", "daily"]);

        center.push(record(NotificationKind::Generic, "fourth"));
        let titles: Vec<&str> = center.notifications().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["fourth", "badge", "weekly"]);
    }

    #[test]
    fn eviction_ignores_timestamps() {
        let (_, mut center) = center(2);
        let mut future = record(NotificationKind::Generic, "future");
        future.created_at += Duration::days(30);
        center.push(future);
        center.push(record(NotificationKind::Generic, "b"));
        center.push(record(NotificationKind::Generic, "c"));
        assert!(center.notifications().iter().all(|n| n.title != "future"));
    }

    #[test]
    fn unread_count_tracks_every_mutation() {
        let (_, mut center) = center(10);
        let a = center.push(record(NotificationKind::Generic, "a"));
        let b = center.push(record(NotificationKind::Generic, "b"));
        center.push(record(NotificationKind::Generic, "c"));
        assert_eq!(center.unread_count(), 3);

        assert!(center.mark_read(&a));
        assert!(!center.mark_read(&a));
        assert_eq!(center.unread_count(), 2);

        assert!(center.remove(&b));
        assert!(!center.remove(&b));
        assert_eq!(center.unread_count(), 1);

        center.mark_all_read();
        assert_eq!(center.unread_count(), 0);

        center.push(record(NotificationKind::Generic, "d"));
        center.clear_all();
        assert_eq!(center.unread_count(), 0);
        assert!(center.is_empty());
    }

    #[test]
    fn mutations_persist_whole_log() {
        let (store, mut center) = center(5);
        let id = center.push(record(NotificationKind::Generic, "a"));
        center.mark_read(&id);

        let stored: Vec<NotificationRecord> =
            read_record(store.as_ref(), keys::NOTIFICATION_LOG).unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].read);

        let reloaded = NotificationCenter::load(store.clone(), 5);
        assert_eq!(reloaded.notifications(), center.notifications());
    }

    #[test]
    fn load_trims_to_smaller_capacity() {
        let (store, mut center) = center(5);
        for i in 0..5 {
            center.push(record(NotificationKind::Generic, &format!("n{i}")));
        }
        let reloaded = NotificationCenter::load(store, 2);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.notifications()[0].title, "n4");
    }

    #[test]
    fn store_failure_keeps_memory_authoritative() {
        let (store, mut center) = center(5);
        store.set_failing(true);
        center.push(record(NotificationKind::Generic, "a"));
        assert_eq!(center.len(), 1);
        store.set_failing(false);
        assert!(store.get(keys::NOTIFICATION_LOG).unwrap().is_none());
    }

    #[test]
    fn observers_receive_change_signals() {
        let (_, mut center) = center(5);
        let mut list_view = center.subscribe();
        let mut badge_view = center.subscribe();

        let id = center.push(record(NotificationKind::Generic, "a"));
        center.mark_all_read();

        for rx in [&mut list_view, &mut badge_view] {
            assert_eq!(rx.try_recv().unwrap(), CenterEvent::Pushed { id: id.clone() });
            assert_eq!(rx.try_recv().unwrap(), CenterEvent::AllMarkedRead);
        }
    }

    #[test]
    fn visible_filters_by_category_without_touching_log() {
        let (_, mut center) = center(5);
        center.push(record(NotificationKind::BadgeEarned, "badge"));
        center.push(record(NotificationKind::DailyHighlight, "daily"));
        let prefs = NotificationPreferences {
            in_app_show_content: false,
            ..Default::default()
        };
        let visible: Vec<&str> = center.visible(&prefs).map(|n| n.title.as_str()).collect();
        assert_eq!(visible, vec!["badge"]);
        assert_eq!(center.unread_count(), 2);
    }
}
