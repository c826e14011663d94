//! In-app notifications and platform alerts.
//!
//! - [`NotificationCenter`]: bounded, persisted, newest-first log with read state
//! - [`NotificationHub`]: the center plus user preferences and platform alert throttling
//! - [`NotificationScheduler`]: cooldown-driven content notifications

mod center;
mod hub;
mod platform;
mod preferences;
mod scheduler;

pub use center::{CenterEvent, NotificationCenter};
pub use hub::{lock_hub, AlertOutcome, NotificationHub, SharedHub};
pub use platform::{LogNotifier, NoopNotifier, Permission, PlatformAlerts, PlatformNotifier};
pub use preferences::NotificationPreferences;
pub use scheduler::{FireContext, FireOutcome, FiredNotification, NotificationScheduler, SkipReason};

#[cfg(test)]
pub(crate) use hub::test_support;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ContentId;

pub type NotificationId = String;

/// What produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BadgeEarned,
    StreakUpdate,
    DailyHighlight,
    WeeklyRoundup,
    InactivityReminder,
    HumorousSurprise,
    FeatureAnnouncement,
    CuratedFeedNew,
    Generic,
}

/// Coarse grouping used by the in-app visibility switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    System,
    Content,
    Engagement,
}

impl NotificationKind {
    pub fn category(self) -> NotificationCategory {
        match self {
            NotificationKind::FeatureAnnouncement | NotificationKind::Generic => {
                NotificationCategory::System
            }
            NotificationKind::DailyHighlight
            | NotificationKind::WeeklyRoundup
            | NotificationKind::CuratedFeedNew
            | NotificationKind::HumorousSurprise => NotificationCategory::Content,
            NotificationKind::BadgeEarned
            | NotificationKind::StreakUpdate
            | NotificationKind::InactivityReminder => NotificationCategory::Engagement,
        }
    }
}

/// Notification kinds fired on a cooldown by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledKind {
    DailyHighlight,
    WeeklyRoundup,
    InactivityReminder,
    HumorousSurprise,
}

impl ScheduledKind {
    pub const ALL: [ScheduledKind; 4] = [
        ScheduledKind::DailyHighlight,
        ScheduledKind::WeeklyRoundup,
        ScheduledKind::InactivityReminder,
        ScheduledKind::HumorousSurprise,
    ];

    pub fn kind(self) -> NotificationKind {
        match self {
            ScheduledKind::DailyHighlight => NotificationKind::DailyHighlight,
            ScheduledKind::WeeklyRoundup => NotificationKind::WeeklyRoundup,
            ScheduledKind::InactivityReminder => NotificationKind::InactivityReminder,
            ScheduledKind::HumorousSurprise => NotificationKind::HumorousSurprise,
        }
    }
}

/// One delivered in-app notification. Only `read` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    pub kind: NotificationKind,
    /// Deep-link target inside the app (e.g. "/achievements").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<ContentId>,
}

impl NotificationRecord {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("inapp_{}", Uuid::new_v4().simple()),
            title: title.into(),
            body: body.into(),
            created_at,
            read: false,
            kind,
            link: None,
            content_id: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_content(mut self, content_id: Option<ContentId>) -> Self {
        self.content_id = content_id;
        self
    }
}
