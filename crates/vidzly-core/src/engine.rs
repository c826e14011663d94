//! Activation cycle.
//!
//! [`Engine`] owns one instance of every component, all sharing a single
//! store and notification hub, and runs them in a fixed order on each app
//! activation:
//!
//! 1. announce the platform permission state (first time only)
//! 2. evaluate every scheduled notification kind against the previous visit
//! 3. record this visit and advance the streak
//! 4. evaluate badges against the counters as they now stand
//! 5. serve or refresh the curated feed

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::catalog::{Catalog, ContentId, ContentItem};
use crate::curation::{CuratedFeed, CuratedFeedCache, RandomFallback, TextGenerator};
use crate::engagement::{BadgeId, CategoryId, EngagementTracker, StreakRules, StreakTransition};
use crate::insights::{self, Insight};
use crate::notifications::{
    lock_hub, CenterEvent, FireContext, FireOutcome, NotificationHub, NotificationId,
    NotificationScheduler, PlatformNotifier, ScheduledKind, SharedHub,
};
use crate::personalize;
use crate::storage::{Config, SharedStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledRun {
    pub kind: ScheduledKind,
    #[serde(flatten)]
    pub outcome: FireOutcome,
}

/// What one activation did.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationReport {
    pub permission_notice: Option<NotificationId>,
    pub scheduled: Vec<ScheduledRun>,
    pub streak: StreakTransition,
    pub badges: Vec<BadgeId>,
    pub feed: Option<CuratedFeed>,
}

pub struct Engine<G> {
    hub: SharedHub,
    tracker: EngagementTracker,
    scheduler: NotificationScheduler,
    feeds: CuratedFeedCache,
    generator: G,
    fallback: RandomFallback,
    staleness: Duration,
    feed_size: usize,
}

impl<G: TextGenerator> Engine<G> {
    pub fn new(
        store: SharedStore,
        notifier: Arc<dyn PlatformNotifier>,
        generator: G,
        config: &Config,
    ) -> Self {
        let hub = NotificationHub::load(store.clone(), notifier, &config.notifications).shared();
        let tracker = EngagementTracker::load(
            store.clone(),
            hub.clone(),
            StreakRules::from_config(&config.streak),
            Duration::hours(config.notifications.platform_min_interval_hours.into()),
        );
        let scheduler = NotificationScheduler::load(store.clone(), hub.clone(), config.cooldowns.clone());
        let feeds = CuratedFeedCache::load(store, hub.clone(), &config.curation);
        Self {
            hub,
            tracker,
            scheduler,
            feeds,
            generator,
            fallback: RandomFallback::new(),
            staleness: config.curation.staleness_threshold(),
            feed_size: config.curation.feed_size,
        }
    }

    /// Deterministic content picks, for tests and reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.scheduler = self.scheduler.with_seed(seed);
        self.fallback = RandomFallback::with_seed(seed);
        self
    }

    pub fn hub(&self) -> &SharedHub {
        &self.hub
    }

    pub fn tracker(&self) -> &EngagementTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    pub fn feeds(&self) -> &CuratedFeedCache {
        &self.feeds
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CenterEvent> {
        lock_hub(&self.hub).subscribe()
    }

    pub async fn activate(
        &mut self,
        now: DateTime<Utc>,
        catalog: &Catalog,
        favorite_categories: &HashSet<CategoryId>,
    ) -> ActivationReport {
        let permission_notice = lock_hub(&self.hub).announce_permission_once(now);

        let ctx = FireContext {
            catalog,
            last_active: self.tracker.last_active(),
        };
        let scheduled = self
            .scheduler
            .run_all(now, ctx)
            .into_iter()
            .map(|(kind, outcome)| ScheduledRun { kind, outcome })
            .collect();

        let streak = self.tracker.record_activity_and_update_streak(now);
        let badges = self.awarded(now, favorite_categories);
        let feed = self.curated_feed(now, catalog).await;

        ActivationReport {
            permission_notice,
            scheduled,
            streak,
            badges,
            feed,
        }
    }

    /// Count one watched item and award any badge it unlocks.
    pub fn record_watch(
        &mut self,
        now: DateTime<Utc>,
        favorite_categories: &HashSet<CategoryId>,
    ) -> Vec<BadgeId> {
        self.tracker.record_watch();
        self.awarded(now, favorite_categories)
    }

    /// Re-check badges after the favorites changed.
    pub fn favorites_changed(
        &mut self,
        now: DateTime<Utc>,
        favorite_categories: &HashSet<CategoryId>,
    ) -> Vec<BadgeId> {
        self.awarded(now, favorite_categories)
    }

    /// Summarize `item`. Each request counts as one AI insight use,
    /// whether or not a summary comes back.
    pub async fn request_summary(
        &mut self,
        now: DateTime<Utc>,
        item: &ContentItem,
        favorite_categories: &HashSet<CategoryId>,
    ) -> (Insight<String>, Vec<BadgeId>) {
        self.tracker.record_ai_insight_use();
        let badges = self.awarded(now, favorite_categories);
        let summary = insights::summarize(&self.generator, item).await;
        (summary, badges)
    }

    pub async fn tags(&self, item: &ContentItem) -> Insight<Vec<String>> {
        insights::generate_tags(&self.generator, item).await
    }

    pub async fn recommend(
        &self,
        catalog: &Catalog,
        favorites: &HashSet<ContentId>,
        count: usize,
    ) -> Vec<ContentId> {
        personalize::recommend(&self.generator, &self.fallback, catalog, favorites, count).await
    }

    pub async fn curated_feed(&self, now: DateTime<Utc>, catalog: &Catalog) -> Option<CuratedFeed> {
        self.feeds
            .get_or_refresh(now, self.staleness, &self.generator, &self.fallback, catalog)
            .await
    }

    pub fn announce_feature(
        &mut self,
        flag: &str,
        title: &str,
        body: &str,
        link: Option<&str>,
        now: DateTime<Utc>,
    ) -> FireOutcome {
        self.scheduler.announce_feature(flag, title, body, link, now)
    }

    pub fn feed_size(&self) -> usize {
        self.feed_size
    }

    fn awarded(&mut self, now: DateTime<Utc>, favorite_categories: &HashSet<CategoryId>) -> Vec<BadgeId> {
        self.tracker
            .evaluate_badges(now, favorite_categories)
            .into_iter()
            .map(|badge| badge.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::OfflineGenerator;
    use crate::notifications::{LogNotifier, NotificationKind, SkipReason};
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, day, hour, 0, 0).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new(
            (0..8)
                .map(|i| ContentItem::new(format!("v{i}"), format!("Video {i}"), i * 100))
                .collect(),
        )
    }

    fn engine() -> Engine<OfflineGenerator> {
        Engine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier),
            OfflineGenerator,
            &Config::default(),
        )
        .with_seed(11)
    }

    #[tokio::test]
    async fn first_activation_runs_every_stage() {
        let mut engine = engine();
        let report = engine.activate(at(1, 9), &catalog(), &HashSet::new()).await;

        assert!(report.permission_notice.is_some());
        assert_eq!(report.streak, StreakTransition::Started);
        assert!(report.badges.is_empty());
        assert!(report.feed.is_some());

        let outcome = |kind| {
            report
                .scheduled
                .iter()
                .find(|run| run.kind == kind)
                .map(|run| run.outcome.clone())
                .unwrap()
        };
        assert!(outcome(ScheduledKind::DailyHighlight).is_fired());
        assert!(outcome(ScheduledKind::WeeklyRoundup).is_fired());
        assert!(outcome(ScheduledKind::HumorousSurprise).is_fired());
        assert_eq!(
            outcome(ScheduledKind::InactivityReminder).skip_reason(),
            Some(SkipReason::NotDue)
        );
    }

    #[tokio::test]
    async fn second_activation_same_day_is_quiet() {
        let mut engine = engine();
        engine.activate(at(1, 9), &catalog(), &HashSet::new()).await;
        let before = lock_hub(engine.hub()).center().len();

        let report = engine.activate(at(1, 15), &catalog(), &HashSet::new()).await;
        assert!(report.permission_notice.is_none());
        assert_eq!(report.streak, StreakTransition::NoChange);
        assert!(report.scheduled.iter().all(|run| !run.outcome.is_fired()));
        assert_eq!(lock_hub(engine.hub()).center().len(), before);
    }

    #[tokio::test]
    async fn inactivity_is_measured_from_the_previous_visit() {
        let mut engine = engine();
        engine.activate(at(1, 9), &catalog(), &HashSet::new()).await;
        let report = engine.activate(at(5, 9), &catalog(), &HashSet::new()).await;

        let inactivity = report
            .scheduled
            .iter()
            .find(|run| run.kind == ScheduledKind::InactivityReminder)
            .unwrap();
        assert!(inactivity.outcome.is_fired());
        assert_eq!(report.streak, StreakTransition::Broken);
    }

    #[tokio::test]
    async fn watches_and_summaries_award_badges() {
        let mut engine = engine();
        let none = HashSet::new();
        for _ in 0..9 {
            assert!(engine.record_watch(at(1, 9), &none).is_empty());
        }
        assert_eq!(engine.record_watch(at(1, 9), &none), vec![BadgeId::Watch10]);

        let item = ContentItem::new("v1", "Video 1", 1);
        for _ in 0..2 {
            let (summary, badges) = engine.request_summary(at(1, 10), &item, &none).await;
            assert_eq!(summary, Insight::Unavailable);
            assert!(badges.is_empty());
        }
        let (_, badges) = engine.request_summary(at(1, 10), &item, &none).await;
        assert_eq!(badges, vec![BadgeId::AiInsights3]);
        assert_eq!(engine.tracker().progress().ai_insights, 3);
    }

    #[tokio::test]
    async fn subscribers_see_activation_changes() {
        let mut engine = engine();
        let mut events = engine.subscribe();
        engine.activate(at(1, 9), &catalog(), &HashSet::new()).await;
        assert!(matches!(events.try_recv(), Ok(CenterEvent::Pushed { .. })));
    }

    #[test]
    fn features_are_announced_once() {
        let mut engine = engine();
        let first = engine.announce_feature("curated_feeds", "Curated Feeds", "Fresh picks.", None, at(1, 9));
        assert!(first.is_fired());
        let again = engine.announce_feature("curated_feeds", "Curated Feeds", "Fresh picks.", None, at(2, 9));
        assert_eq!(again.skip_reason(), Some(SkipReason::AlreadyAnnounced));

        let hub = lock_hub(engine.hub());
        let record = &hub.center().notifications()[0];
        assert_eq!(record.kind, NotificationKind::FeatureAnnouncement);
        assert_eq!(record.link.as_deref(), Some("/settings"));
    }

    #[tokio::test]
    async fn permission_notice_pushed_once_when_store_fails() {
        let store = Arc::new(MemoryStore::new());
        store.set_failing(true);
        let mut engine = Engine::new(
            store,
            Arc::new(LogNotifier),
            OfflineGenerator,
            &Config::default(),
        )
        .with_seed(11);

        let mut notices = Vec::new();
        for hour in [9, 12, 15] {
            let report = engine.activate(at(1, hour), &catalog(), &HashSet::new()).await;
            notices.push(report.permission_notice.is_some());
        }
        assert_eq!(notices, vec![true, false, false]);

        let hub = lock_hub(engine.hub());
        let generic = hub
            .center()
            .notifications()
            .iter()
            .filter(|n| n.kind == NotificationKind::Generic)
            .count();
        assert_eq!(generic, 1);
    }
}
