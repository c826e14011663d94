//! Platform-level (OS / browser) alerts.
//!
//! Alerts interrupt the user, so they run on their own cooldown track per
//! kind, independent of the in-app cooldowns kept by the scheduler.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::NotificationKind;
use crate::error::CoreError;
use crate::storage::{keys, load_or_default, persist, SharedStore};

/// Platform notification permission as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// The user has not been asked yet.
    Undetermined,
    Granted,
    Denied,
}

pub trait PlatformNotifier: Send + Sync {
    fn permission(&self) -> Permission;

    /// Show one alert.
    fn show(&self, title: &str, body: &str) -> Result<(), CoreError>;
}

/// Notifier for hosts without platform alerts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl PlatformNotifier for NoopNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn show(&self, _title: &str, _body: &str) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Notifier that writes alerts to the log. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl PlatformNotifier for LogNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn show(&self, title: &str, body: &str) -> Result<(), CoreError> {
        tracing::info!(target: "vidzly::alert", title, body, "platform alert");
        Ok(())
    }
}

/// Per-kind last-dispatch times for platform alerts.
pub struct PlatformAlerts {
    store: SharedStore,
    notifier: Arc<dyn PlatformNotifier>,
    last_sent: BTreeMap<NotificationKind, DateTime<Utc>>,
    min_interval: Duration,
}

impl PlatformAlerts {
    pub fn load(store: SharedStore, notifier: Arc<dyn PlatformNotifier>, min_interval: Duration) -> Self {
        let last_sent = load_or_default(store.as_ref(), keys::PLATFORM_ALERTS);
        Self {
            store,
            notifier,
            last_sent,
            min_interval,
        }
    }

    pub fn permission(&self) -> Permission {
        self.notifier.permission()
    }

    pub fn last_sent(&self, kind: NotificationKind) -> Option<DateTime<Utc>> {
        self.last_sent.get(&kind).copied()
    }

    /// Platform cooldown for a kind whose in-app cooldown is `in_app`.
    pub fn cooldown_for(&self, in_app: Duration) -> Duration {
        in_app + self.min_interval
    }

    pub(super) fn is_cooling_down(&self, kind: NotificationKind, cooldown: Duration, now: DateTime<Utc>) -> bool {
        self.last_sent(kind)
            .is_some_and(|last| now.signed_duration_since(last) < cooldown)
    }

    /// Show an alert and record the dispatch time. Returns false if the
    /// notifier failed; the failure is logged.
    pub(super) fn send(&mut self, kind: NotificationKind, title: &str, body: &str, now: DateTime<Utc>) -> bool {
        match self.notifier.show(title, body) {
            Ok(()) => {
                self.last_sent.insert(kind, now);
                persist(self.store.as_ref(), keys::PLATFORM_ALERTS, &self.last_sent);
                true
            }
            Err(e) => {
                tracing::warn!(kind = ?kind, error = %e, "platform alert failed");
                false
            }
        }
    }
}
