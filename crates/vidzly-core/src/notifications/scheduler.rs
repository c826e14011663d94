//! Cooldown-driven content notifications.
//!
//! Each [`ScheduledKind`] fires at most once per cooldown window. A kind
//! whose switch is off is skipped before its cooldown is consulted, so
//! toggling a switch never advances or resets the clock.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{
    lock_hub, AlertOutcome, NotificationId, NotificationKind, NotificationRecord, ScheduledKind,
    SharedHub,
};
use crate::catalog::{Catalog, ContentItem};
use crate::storage::{keys, load_or_default, persist, CooldownConfig, SharedStore};

/// Why a kind did not fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    CooldownActive,
    NoContent,
    /// The kind's trigger condition (e.g. enough inactivity) does not hold.
    NotDue,
    AlreadyAnnounced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredNotification {
    pub id: NotificationId,
    pub alert: AlertOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FireOutcome {
    Fired(FiredNotification),
    Skipped { reason: SkipReason },
}

impl FireOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        FireOutcome::Skipped { reason }
    }

    pub fn is_fired(&self) -> bool {
        matches!(self, FireOutcome::Fired(_))
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            FireOutcome::Skipped { reason } => Some(*reason),
            FireOutcome::Fired(_) => None,
        }
    }
}

/// What a fire decision may look at besides the clock.
#[derive(Debug, Clone, Copy)]
pub struct FireContext<'a> {
    pub catalog: &'a Catalog,
    /// Last recorded user activity before the current visit.
    pub last_active: Option<DateTime<Utc>>,
}

struct Draft {
    title: String,
    body: String,
    content_id: Option<String>,
}

pub struct NotificationScheduler {
    store: SharedStore,
    hub: SharedHub,
    config: CooldownConfig,
    cooldowns: BTreeMap<ScheduledKind, DateTime<Utc>>,
    announced: BTreeSet<String>,
    rng: StdRng,
}

impl NotificationScheduler {
    pub fn load(store: SharedStore, hub: SharedHub, config: CooldownConfig) -> Self {
        let cooldowns = load_or_default(store.as_ref(), keys::COOLDOWNS);
        let announced = load_or_default(store.as_ref(), keys::ANNOUNCED_FEATURES);
        Self {
            store,
            hub,
            config,
            cooldowns,
            announced,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a deterministic random source for content picks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn last_fired(&self, kind: ScheduledKind) -> Option<DateTime<Utc>> {
        self.cooldowns.get(&kind).copied()
    }

    pub fn cooldown(&self, kind: ScheduledKind) -> Duration {
        self.config.cooldown(kind)
    }

    /// Evaluate one kind and fire it if due.
    pub fn try_fire(
        &mut self,
        kind: ScheduledKind,
        now: DateTime<Utc>,
        ctx: FireContext<'_>,
    ) -> FireOutcome {
        let enabled = lock_hub(&self.hub).preferences().allows(kind);
        if !enabled {
            return FireOutcome::skipped(SkipReason::Disabled);
        }

        let cooldown = self.config.cooldown(kind);
        if let Some(last) = self.last_fired(kind) {
            if now.signed_duration_since(last) < cooldown {
                tracing::debug!(kind = ?kind, %last, "cooldown active");
                return FireOutcome::skipped(SkipReason::CooldownActive);
            }
        }

        let draft = match self.draft(kind, now, ctx) {
            Ok(draft) => draft,
            Err(reason) => return FireOutcome::skipped(reason),
        };

        let record = NotificationRecord::new(kind.kind(), &draft.title, &draft.body, now)
            .with_link("/")
            .with_content(draft.content_id);

        let fired = {
            let mut hub = lock_hub(&self.hub);
            let id = hub.push(record);
            let platform_cooldown = hub.alerts().cooldown_for(cooldown);
            let alert = hub.alert(kind.kind(), true, platform_cooldown, &draft.title, &draft.body, now);
            FiredNotification { id, alert }
        };

        self.cooldowns.insert(kind, now);
        persist(self.store.as_ref(), keys::COOLDOWNS, &self.cooldowns);
        tracing::info!(kind = ?kind, id = %fired.id, alert = ?fired.alert, "notification fired");
        FireOutcome::Fired(fired)
    }

    /// Evaluate every scheduled kind. Kinds are independent.
    pub fn run_all(
        &mut self,
        now: DateTime<Utc>,
        ctx: FireContext<'_>,
    ) -> Vec<(ScheduledKind, FireOutcome)> {
        ScheduledKind::ALL
            .iter()
            .map(|&kind| (kind, self.try_fire(kind, now, ctx)))
            .collect()
    }

    /// Announce a feature once per flag, ever. Not on a timer.
    pub fn announce_feature(
        &mut self,
        flag: &str,
        title: &str,
        body: &str,
        link: Option<&str>,
        now: DateTime<Utc>,
    ) -> FireOutcome {
        if self.announced.contains(flag) {
            return FireOutcome::skipped(SkipReason::AlreadyAnnounced);
        }
        let record = NotificationRecord::new(
            NotificationKind::FeatureAnnouncement,
            format!("✨ New Feature: {title}"),
            body,
            now,
        )
        .with_link(link.unwrap_or("/settings"));
        let id = lock_hub(&self.hub).push(record);

        self.announced.insert(flag.to_string());
        persist(self.store.as_ref(), keys::ANNOUNCED_FEATURES, &self.announced);
        tracing::info!(flag, id = %id, "feature announced");
        FireOutcome::Fired(FiredNotification {
            id,
            alert: AlertOutcome::Disabled,
        })
    }

    fn draft(
        &mut self,
        kind: ScheduledKind,
        now: DateTime<Utc>,
        ctx: FireContext<'_>,
    ) -> Result<Draft, SkipReason> {
        match kind {
            ScheduledKind::DailyHighlight => {
                let item = ctx
                    .catalog
                    .top_by_popularity()
                    .ok_or(SkipReason::NoContent)?;
                Ok(Draft {
                    title: "🔥 Daily Hot Video".into(),
                    body: format!("Don't miss today's top pick: {}!", item.title),
                    content_id: Some(item.id.clone()),
                })
            }
            ScheduledKind::WeeklyRoundup => {
                let item = ctx
                    .catalog
                    .top_by_popularity()
                    .ok_or(SkipReason::NoContent)?;
                Ok(Draft {
                    title: "⭐ Weekly Roundup".into(),
                    body: format!(
                        "This week's star: {} with {} views. Catch up now!",
                        item.title, item.popularity
                    ),
                    content_id: Some(item.id.clone()),
                })
            }
            ScheduledKind::InactivityReminder => {
                let last_active = ctx.last_active.ok_or(SkipReason::NotDue)?;
                if now.signed_duration_since(last_active) < self.config.inactivity_threshold() {
                    return Err(SkipReason::NotDue);
                }
                let item = ctx.catalog.random_item(&mut self.rng);
                Ok(Draft {
                    title: "👋 We Miss You!".into(),
                    body: match item {
                        Some(item) => {
                            format!("Come back and check out videos like \"{}\"!", item.title)
                        }
                        None => "Discover what's new!".into(),
                    },
                    content_id: item.map(|item: &ContentItem| item.id.clone()),
                })
            }
            ScheduledKind::HumorousSurprise => {
                let item = ctx.catalog.random_item(&mut self.rng);
                Ok(Draft {
                    title: "Surprise! 😂".into(),
                    body: match item {
                        Some(item) => {
                            format!("You won't believe what's in this video: {}", item.title)
                        }
                        None => "Time for a laugh break!".into(),
                    },
                    content_id: item.map(|item: &ContentItem| item.id.clone()),
                })
            }
        }
    }
}
