use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::{
    CenterEvent, NotificationCenter, NotificationId, NotificationKind, NotificationPreferences,
    NotificationRecord, Permission, PlatformAlerts, PlatformNotifier,
};
use crate::storage::{keys, load_or_default, persist, NotificationsConfig, SharedStore};

/// Result of asking for a platform alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertOutcome {
    Sent,
    /// The master switch or the per-kind switch is off.
    Disabled,
    NotPermitted,
    CooldownActive,
    Failed,
}

/// Single owner of the notification log, the user's switches and the
/// platform alert track. Every producer writes through it.
pub struct NotificationHub {
    store: SharedStore,
    center: NotificationCenter,
    preferences: NotificationPreferences,
    alerts: PlatformAlerts,
    permission_announced: bool,
}

pub type SharedHub = Arc<Mutex<NotificationHub>>;

/// Lock the hub. A panic in another holder does not leave the log unusable.
pub fn lock_hub(hub: &SharedHub) -> MutexGuard<'_, NotificationHub> {
    hub.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NotificationHub {
    pub fn load(
        store: SharedStore,
        notifier: Arc<dyn PlatformNotifier>,
        config: &NotificationsConfig,
    ) -> Self {
        let center = NotificationCenter::load(store.clone(), config.log_capacity);
        let preferences = NotificationPreferences::load(store.as_ref());
        let alerts = PlatformAlerts::load(
            store.clone(),
            notifier,
            Duration::hours(config.platform_min_interval_hours.into()),
        );
        let permission_announced = load_or_default(store.as_ref(), keys::PERMISSION_ANNOUNCED);
        Self {
            store,
            center,
            preferences,
            alerts,
            permission_announced,
        }
    }

    pub fn shared(self) -> SharedHub {
        Arc::new(Mutex::new(self))
    }

    pub fn center(&self) -> &NotificationCenter {
        &self.center
    }

    pub fn center_mut(&mut self) -> &mut NotificationCenter {
        &mut self.center
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CenterEvent> {
        self.center.subscribe()
    }

    pub fn push(&mut self, record: NotificationRecord) -> NotificationId {
        self.center.push(record)
    }

    pub fn preferences(&self) -> &NotificationPreferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: NotificationPreferences) {
        preferences.save(self.store.as_ref());
        self.preferences = preferences;
    }

    pub fn alerts(&self) -> &PlatformAlerts {
        &self.alerts
    }

    /// Dispatch a platform alert if the master switch, the caller's
    /// per-kind switch, the platform permission and the kind's platform
    /// cooldown all allow it.
    pub fn alert(
        &mut self,
        kind: NotificationKind,
        kind_enabled: bool,
        cooldown: Duration,
        title: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> AlertOutcome {
        if !self.preferences.platform_enabled || !kind_enabled {
            return AlertOutcome::Disabled;
        }
        if self.alerts.permission() != Permission::Granted {
            return AlertOutcome::NotPermitted;
        }
        if self.alerts.is_cooling_down(kind, cooldown, now) {
            return AlertOutcome::CooldownActive;
        }
        if self.alerts.send(kind, title, body, now) {
            AlertOutcome::Sent
        } else {
            AlertOutcome::Failed
        }
    }

    /// The first time the platform permission is resolved, leave an in-app
    /// note about it, plus a welcome alert when it was granted. Returns the
    /// pushed record id, if any.
    pub fn announce_permission_once(&mut self, now: DateTime<Utc>) -> Option<NotificationId> {
        if self.permission_announced {
            return None;
        }
        let (title, body) = match self.alerts.permission() {
            Permission::Undetermined => return None,
            Permission::Granted => (
                "Platform Notifications Enabled",
                "You've allowed notifications. You can manage these and other alerts in settings.",
            ),
            Permission::Denied => (
                "Platform Notifications Not Enabled",
                "You can enable notifications in your system settings if you change your mind.",
            ),
        };
        self.permission_announced = true;
        persist(self.store.as_ref(), keys::PERMISSION_ANNOUNCED, &true);

        let id = self.push(NotificationRecord::new(NotificationKind::Generic, title, body, now));
        if self.alerts.permission() == Permission::Granted {
            let outcome = self.alert(
                NotificationKind::Generic,
                true,
                Duration::zero(),
                "Vidzly: Notifications Enabled!",
                "You can manage these in settings.",
                now,
            );
            tracing::debug!(?outcome, "welcome alert");
        }
        Some(id)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingNotifier;
    use super::*;
    use crate::notifications::NoopNotifier;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;
    use std::sync::atomic::Ordering;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn hub(notifier: Arc<dyn PlatformNotifier>) -> NotificationHub {
        NotificationHub::load(
            Arc::new(MemoryStore::new()),
            notifier,
            &NotificationsConfig::default(),
        )
    }

    #[test]
    fn alert_respects_platform_cooldown() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut hub = hub(notifier.clone());
        let kind = NotificationKind::DailyHighlight;
        let cooldown = Duration::hours(43);

        assert_eq!(hub.alert(kind, true, cooldown, "t", "b", at(1, 8)), AlertOutcome::Sent);
        assert_eq!(
            hub.alert(kind, true, cooldown, "t", "b", at(2, 8)),
            AlertOutcome::CooldownActive
        );
        assert_eq!(hub.alert(kind, true, cooldown, "t", "b", at(3, 8)), AlertOutcome::Sent);
        assert_eq!(notifier.count(), 2);
    }

    #[test]
    fn alert_tracks_are_per_kind() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut hub = hub(notifier.clone());
        let cooldown = Duration::days(5);
        hub.alert(NotificationKind::DailyHighlight, true, cooldown, "a", "", at(1, 8));
        assert_eq!(
            hub.alert(NotificationKind::WeeklyRoundup, true, cooldown, "b", "", at(1, 8)),
            AlertOutcome::Sent
        );
    }

    #[test]
    fn alert_gates() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut hub = hub(notifier.clone());
        let kind = NotificationKind::StreakUpdate;
        let cooldown = Duration::hours(20);

        assert_eq!(hub.alert(kind, false, cooldown, "t", "", at(1, 8)), AlertOutcome::Disabled);

        notifier.fail.store(true, Ordering::SeqCst);
        assert_eq!(hub.alert(kind, true, cooldown, "t", "", at(1, 8)), AlertOutcome::Failed);
        assert!(hub.alerts().last_sent(kind).is_none());

        notifier.denied.store(true, Ordering::SeqCst);
        assert_eq!(hub.alert(kind, true, cooldown, "t", "", at(1, 8)), AlertOutcome::NotPermitted);

        let mut prefs = hub.preferences().clone();
        prefs.platform_enabled = false;
        hub.set_preferences(prefs);
        assert_eq!(hub.alert(kind, true, cooldown, "t", "", at(1, 8)), AlertOutcome::Disabled);
    }

    #[test]
    fn permission_announced_once() {
        let mut hub = hub(Arc::new(NoopNotifier));
        assert!(hub.announce_permission_once(at(1, 8)).is_some());
        assert!(hub.announce_permission_once(at(2, 8)).is_none());
        assert_eq!(hub.center().len(), 1);
        assert_eq!(
            hub.center().notifications()[0].title,
            "Platform Notifications Not Enabled"
        );
    }

    #[test]
    fn permission_notice_once_while_store_is_down() {
        let store = Arc::new(MemoryStore::new());
        store.set_failing(true);
        let mut hub = NotificationHub::load(
            store.clone(),
            Arc::new(NoopNotifier),
            &NotificationsConfig::default(),
        );

        assert!(hub.announce_permission_once(at(1, 8)).is_some());
        assert!(hub.announce_permission_once(at(1, 9)).is_none());
        assert!(hub.announce_permission_once(at(2, 8)).is_none());
        assert_eq!(hub.center().len(), 1);
    }

    #[test]
    fn permission_notice_not_repeated_after_reload() {
        let store = Arc::new(MemoryStore::new());
        let config = NotificationsConfig::default();
        let mut first = NotificationHub::load(store.clone(), Arc::new(NoopNotifier), &config);
        assert!(first.announce_permission_once(at(1, 8)).is_some());

        let mut reloaded = NotificationHub::load(store, Arc::new(NoopNotifier), &config);
        assert!(reloaded.announce_permission_once(at(2, 8)).is_none());
    }

    #[test]
    fn granted_permission_sends_welcome_alert() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut hub = hub(notifier.clone());

        assert!(hub.announce_permission_once(at(1, 8)).is_some());
        assert_eq!(notifier.count(), 1);
        assert_eq!(
            hub.center().notifications()[0].title,
            "Platform Notifications Enabled"
        );

        assert!(hub.announce_permission_once(at(1, 9)).is_none());
        assert_eq!(notifier.count(), 1);
    }
}
