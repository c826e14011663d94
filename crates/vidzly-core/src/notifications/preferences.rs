use serde::{Deserialize, Serialize};

use super::{NotificationCategory, ScheduledKind};
use crate::error::ConfigError;
use crate::storage::{keys, load_or_default, persist, KvStore};

/// User-facing notification switches.
///
/// Stored as one record; fields missing from an older record take their
/// default (enabled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Master switch for platform-level (user-interrupting) alerts.
    #[serde(default = "default_true")]
    pub platform_enabled: bool,
    #[serde(default = "default_true")]
    pub daily_highlight: bool,
    #[serde(default = "default_true")]
    pub weekly_roundup: bool,
    #[serde(default = "default_true")]
    pub inactivity_reengagement: bool,
    #[serde(default = "default_true")]
    pub humorous_surprise: bool,
    /// Platform alerts for streaks.
    #[serde(default = "default_true")]
    pub gamification: bool,
    #[serde(default = "default_true")]
    pub in_app_show_system: bool,
    #[serde(default = "default_true")]
    pub in_app_show_content: bool,
    #[serde(default = "default_true")]
    pub in_app_show_engagement: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            platform_enabled: true,
            daily_highlight: true,
            weekly_roundup: true,
            inactivity_reengagement: true,
            humorous_surprise: true,
            gamification: true,
            in_app_show_system: true,
            in_app_show_content: true,
            in_app_show_engagement: true,
        }
    }
}

impl NotificationPreferences {
    pub fn load(store: &dyn KvStore) -> Self {
        load_or_default(store, keys::NOTIFICATION_PREFS)
    }

    pub fn save(&self, store: &dyn KvStore) -> bool {
        persist(store, keys::NOTIFICATION_PREFS, self)
    }

    /// Whether the user wants this scheduled kind at all.
    pub fn allows(&self, kind: ScheduledKind) -> bool {
        match kind {
            ScheduledKind::DailyHighlight => self.daily_highlight,
            ScheduledKind::WeeklyRoundup => self.weekly_roundup,
            ScheduledKind::InactivityReminder => self.inactivity_reengagement,
            ScheduledKind::HumorousSurprise => self.humorous_surprise,
        }
    }

    pub fn shows(&self, category: NotificationCategory) -> bool {
        match category {
            NotificationCategory::System => self.in_app_show_system,
            NotificationCategory::Content => self.in_app_show_content,
            NotificationCategory::Engagement => self.in_app_show_engagement,
        }
    }

    /// Flip one switch by its field name.
    ///
    /// # Errors
    /// Returns an error for an unknown switch name.
    pub fn set(&mut self, name: &str, enabled: bool) -> Result<(), ConfigError> {
        let slot = match name {
            "platform_enabled" => &mut self.platform_enabled,
            "daily_highlight" => &mut self.daily_highlight,
            "weekly_roundup" => &mut self.weekly_roundup,
            "inactivity_reengagement" => &mut self.inactivity_reengagement,
            "humorous_surprise" => &mut self.humorous_surprise,
            "gamification" => &mut self.gamification,
            "in_app_show_system" => &mut self.in_app_show_system,
            "in_app_show_content" => &mut self.in_app_show_content,
            "in_app_show_engagement" => &mut self.in_app_show_engagement,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: name.to_string(),
                    message: "unknown notification preference".into(),
                })
            }
        };
        *slot = enabled;
        Ok(())
    }
}
