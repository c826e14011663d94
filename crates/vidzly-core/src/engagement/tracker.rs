//! Engagement tracker.
//!
//! Turns activity signals into persisted progress, progress into one-time
//! badge awards, and daily visits into a streak. Persistence failures are
//! logged; in-memory state stays authoritative for the session.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::badges::{BadgeDefinition, BadgeId, BadgeSignals, ALL_BADGES};
use super::streak::{StreakRules, StreakState, StreakTransition};
use crate::notifications::{lock_hub, NotificationKind, NotificationRecord, SharedHub};
use crate::storage::{keys, load_or_default, persist, SharedStore};

const ACHIEVEMENTS_LINK: &str = "/achievements";

pub type CategoryId = String;

/// Cumulative engagement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub watched: u64,
    #[serde(default)]
    pub ai_insights: u64,
}

pub struct EngagementTracker {
    store: SharedStore,
    hub: SharedHub,
    rules: StreakRules,
    /// Platform alert spacing for streak alerts.
    streak_alert_cooldown: Duration,
    progress: Progress,
    earned: BTreeSet<BadgeId>,
    streak: StreakState,
    last_active: Option<DateTime<Utc>>,
}

impl EngagementTracker {
    pub fn load(
        store: SharedStore,
        hub: SharedHub,
        rules: StreakRules,
        streak_alert_cooldown: Duration,
    ) -> Self {
        let progress = load_or_default(store.as_ref(), keys::PROGRESS);
        let earned = load_or_default(store.as_ref(), keys::EARNED_BADGES);
        let streak = load_or_default(store.as_ref(), keys::STREAK);
        let last_active = load_or_default(store.as_ref(), keys::LAST_ACTIVE);
        Self {
            store,
            hub,
            rules,
            streak_alert_cooldown,
            progress,
            earned,
            streak,
            last_active,
        }
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn earned_badges(&self) -> &BTreeSet<BadgeId> {
        &self.earned
    }

    pub fn is_earned(&self, id: BadgeId) -> bool {
        self.earned.contains(&id)
    }

    pub fn streak(&self) -> StreakState {
        self.streak
    }

    pub fn last_active(&self) -> Option<DateTime<Utc>> {
        self.last_active
    }

    pub fn record_watch(&mut self) {
        self.progress.watched = self.progress.watched.saturating_add(1);
        persist(self.store.as_ref(), keys::PROGRESS, &self.progress);
    }

    pub fn record_ai_insight_use(&mut self) {
        self.progress.ai_insights = self.progress.ai_insights.saturating_add(1);
        persist(self.store.as_ref(), keys::PROGRESS, &self.progress);
    }

    /// Award every unearned badge whose criteria now hold.
    ///
    /// Returns the newly awarded badges. Each badge is awarded, and
    /// announced, at most once ever.
    pub fn evaluate_badges(
        &mut self,
        now: DateTime<Utc>,
        favorite_categories: &HashSet<CategoryId>,
    ) -> Vec<&'static BadgeDefinition> {
        let signals = BadgeSignals {
            watched: self.progress.watched,
            ai_insights: self.progress.ai_insights,
            distinct_favorite_categories: favorite_categories.len() as u64,
        };

        let awarded: Vec<&'static BadgeDefinition> = ALL_BADGES
            .iter()
            .filter(|badge| !self.earned.contains(&badge.id) && badge.is_met(&signals))
            .collect();
        if awarded.is_empty() {
            return awarded;
        }

        self.earned.extend(awarded.iter().map(|badge| badge.id));
        persist(self.store.as_ref(), keys::EARNED_BADGES, &self.earned);

        let mut hub = lock_hub(&self.hub);
        for badge in &awarded {
            tracing::info!(badge = ?badge.id, "badge earned");
            hub.push(
                NotificationRecord::new(
                    NotificationKind::BadgeEarned,
                    format!("Badge Unlocked: {}!", badge.name),
                    badge.description,
                    now,
                )
                .with_link(ACHIEVEMENTS_LINK),
            );
        }
        awarded
    }

    /// Record a visit at `now` and advance the daily streak.
    pub fn record_activity_and_update_streak(&mut self, now: DateTime<Utc>) -> StreakTransition {
        let previous_activity = self.last_active.replace(now);
        persist(self.store.as_ref(), keys::LAST_ACTIVE, &self.last_active);

        let (next, transition) = self.rules.advance(self.streak, previous_activity, now);
        if transition == StreakTransition::NoChange {
            return transition;
        }

        self.streak = next;
        persist(self.store.as_ref(), keys::STREAK, &self.streak);
        tracing::info!(?transition, count = self.streak.count, "streak updated");
        self.announce_streak(transition, now);
        transition
    }

    fn announce_streak(&self, transition: StreakTransition, now: DateTime<Utc>) {
        let count = self.streak.count;
        let (title, body) = match transition {
            StreakTransition::Started => (
                "🎉 Daily Streak Started!".to_string(),
                "You've started your daily video watching streak! Keep it up!".to_string(),
            ),
            StreakTransition::Incremented(n) => (
                format!("🏆 Streak: {n} Days!"),
                format!("Amazing! You're on a {n}-day streak."),
            ),
            StreakTransition::Broken => (
                "😟 Streak Broken".to_string(),
                "Your viewing streak was broken. Start a new one today!".to_string(),
            ),
            StreakTransition::NoChange => return,
        };

        let mut hub = lock_hub(&self.hub);
        hub.push(
            NotificationRecord::new(NotificationKind::StreakUpdate, &title, &body, now)
                .with_link(ACHIEVEMENTS_LINK),
        );

        let milestone = match transition {
            StreakTransition::Broken => true,
            _ => count == 1 || count % 3 == 0,
        };
        if milestone {
            let gamification = hub.preferences().gamification;
            hub.alert(
                NotificationKind::StreakUpdate,
                gamification,
                self.streak_alert_cooldown,
                &title,
                &body,
                now,
            );
        }
    }
}

/// Distinct categories among favorites; uncategorized favorites don't count.
pub fn distinct_categories<'a, I>(categories: I) -> HashSet<CategoryId>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    categories
        .into_iter()
        .flatten()
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::test_support::RecordingNotifier;
    use crate::notifications::NotificationHub;
    use crate::storage::{MemoryStore, NotificationsConfig};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, day, hour, 0, 0).unwrap()
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        hub: SharedHub,
        notifier: Arc<RecordingNotifier>,
        tracker: EngagementTracker,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let hub = NotificationHub::load(store.clone(), notifier.clone(), &NotificationsConfig::default())
            .shared();
        let tracker = EngagementTracker::load(
            store.clone(),
            hub.clone(),
            StreakRules::default(),
            Duration::hours(20),
        );
        Fixture {
            store,
            hub,
            notifier,
            tracker,
        }
    }

    fn badge_notifications(hub: &SharedHub) -> usize {
        lock_hub(hub)
            .center()
            .notifications()
            .iter()
            .filter(|n| n.kind == NotificationKind::BadgeEarned)
            .count()
    }

    #[test]
    fn counters_persist_after_every_increment() {
        let mut f = fixture();
        f.tracker.record_watch();
        f.tracker.record_watch();
        f.tracker.record_ai_insight_use();
        let stored: Progress = load_or_default(f.store.as_ref(), keys::PROGRESS);
        assert_eq!(stored, Progress { watched: 2, ai_insights: 1 });
    }

    #[test]
    fn badges_awarded_once_ever() {
        let mut f = fixture();
        let none = HashSet::new();
        for _ in 0..9 {
            f.tracker.record_watch();
        }
        assert!(f.tracker.evaluate_badges(at(1, 9), &none).is_empty());

        f.tracker.record_watch();
        let awarded = f.tracker.evaluate_badges(at(1, 9), &none);
        assert_eq!(awarded.len(), 1);
        assert_eq!(awarded[0].id, BadgeId::Watch10);

        for _ in 0..5 {
            f.tracker.record_watch();
            assert!(f.tracker.evaluate_badges(at(1, 9), &none).is_empty());
        }
        assert_eq!(badge_notifications(&f.hub), 1);
    }

    #[test]
    fn favorite_categories_badge_uses_snapshot() {
        let mut f = fixture();
        let favorites = distinct_categories(
            ["music", "news", "music", "sports", "comedy", "tech"]
                .into_iter()
                .map(Some)
                .chain([None, Some("")]),
        );
        assert_eq!(favorites.len(), 5);
        let awarded = f.tracker.evaluate_badges(at(1, 9), &favorites);
        assert_eq!(awarded[0].id, BadgeId::Favorite5DistinctCategories);

        // Dropping below the threshold later never revokes it.
        assert!(f.tracker.evaluate_badges(at(1, 10), &HashSet::new()).is_empty());
        assert!(f.tracker.is_earned(BadgeId::Favorite5DistinctCategories));
    }

    #[test]
    fn earned_badges_survive_reload() {
        let mut f = fixture();
        for _ in 0..3 {
            f.tracker.record_ai_insight_use();
        }
        f.tracker.evaluate_badges(at(1, 9), &HashSet::new());

        let mut reloaded = EngagementTracker::load(
            f.store.clone(),
            f.hub.clone(),
            StreakRules::default(),
            Duration::hours(20),
        );
        assert!(reloaded.is_earned(BadgeId::AiInsights3));
        assert!(reloaded.evaluate_badges(at(2, 9), &HashSet::new()).is_empty());
        assert_eq!(badge_notifications(&f.hub), 1);
    }

    #[test]
    fn store_failure_is_not_fatal() {
        let mut f = fixture();
        f.store.set_failing(true);
        for _ in 0..10 {
            f.tracker.record_watch();
        }
        let awarded = f.tracker.evaluate_badges(at(1, 9), &HashSet::new());
        assert_eq!(awarded.len(), 1);
        assert_eq!(f.tracker.progress().watched, 10);
        assert_eq!(
            f.tracker.record_activity_and_update_streak(at(1, 9)),
            StreakTransition::Started
        );
    }

    #[test]
    fn streak_day_rules() {
        let mut f = fixture();
        assert_eq!(f.tracker.record_activity_and_update_streak(at(1, 9)), StreakTransition::Started);
        assert_eq!(f.tracker.record_activity_and_update_streak(at(1, 18)), StreakTransition::NoChange);
        assert_eq!(
            f.tracker.record_activity_and_update_streak(at(2, 9)),
            StreakTransition::Incremented(2)
        );
        assert_eq!(f.tracker.record_activity_and_update_streak(at(6, 9)), StreakTransition::Broken);
        assert_eq!(f.tracker.record_activity_and_update_streak(at(6, 10)), StreakTransition::Started);
        assert_eq!(f.tracker.last_active(), Some(at(6, 10)));
    }

    #[test]
    fn streak_notifications_and_milestone_alerts() {
        let mut f = fixture();
        for day in 1..=3 {
            f.tracker.record_activity_and_update_streak(at(day, 9));
        }
        let hub = lock_hub(&f.hub);
        let titles: Vec<&str> = hub.center().notifications().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["🏆 Streak: 3 Days!", "🏆 Streak: 2 Days!", "🎉 Daily Streak Started!"]
        );
        // Day 1 and day 3 are milestones, 48h apart so both clear the 20h spacing.
        assert_eq!(f.notifier.count(), 2);
    }

    #[test]
    fn gamification_switch_silences_streak_alerts() {
        let mut f = fixture();
        {
            let mut hub = lock_hub(&f.hub);
            let mut prefs = hub.preferences().clone();
            prefs.gamification = false;
            hub.set_preferences(prefs);
        }
        f.tracker.record_activity_and_update_streak(at(1, 9));
        assert_eq!(f.notifier.count(), 0);
        assert_eq!(lock_hub(&f.hub).center().len(), 1);
    }
}
