//! Badge catalog.
//!
//! Definitions are static. Each badge names the signal it reads and a
//! threshold; adding a badge over a new signal means adding a
//! [`CriteriaKind`] variant and a field to [`BadgeSignals`].

use serde::{Deserialize, Serialize};

/// Badge identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeId {
    Watch10,
    Favorite5DistinctCategories,
    AiInsights3,
}

/// Which signal a badge threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaKind {
    WatchCount,
    DistinctFavoriteCategories,
    AiInsightCount,
}

/// Snapshot of every signal badges are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadgeSignals {
    pub watched: u64,
    pub ai_insights: u64,
    pub distinct_favorite_categories: u64,
}

impl CriteriaKind {
    pub fn signal(self, signals: &BadgeSignals) -> u64 {
        match self {
            CriteriaKind::WatchCount => signals.watched,
            CriteriaKind::DistinctFavoriteCategories => signals.distinct_favorite_categories,
            CriteriaKind::AiInsightCount => signals.ai_insights,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeDefinition {
    pub id: BadgeId,
    pub name: &'static str,
    pub description: &'static str,
    pub threshold: u64,
    pub criteria: CriteriaKind,
}

impl BadgeDefinition {
    pub fn is_met(&self, signals: &BadgeSignals) -> bool {
        self.criteria.signal(signals) >= self.threshold
    }
}

pub static ALL_BADGES: &[BadgeDefinition] = &[
    BadgeDefinition {
        id: BadgeId::Watch10,
        name: "Video Voyager",
        description: "Watched 10 videos. Keep exploring!",
        threshold: 10,
        criteria: CriteriaKind::WatchCount,
    },
    BadgeDefinition {
        id: BadgeId::Favorite5DistinctCategories,
        name: "Category Connoisseur",
        description: "Favorited videos in 5 different categories.",
        threshold: 5,
        criteria: CriteriaKind::DistinctFavoriteCategories,
    },
    BadgeDefinition {
        id: BadgeId::AiInsights3,
        name: "Insight Explorer",
        description: "Used AI Insights 3 times to learn more.",
        threshold: 3,
        criteria: CriteriaKind::AiInsightCount,
    },
];

pub fn badge(id: BadgeId) -> Option<&'static BadgeDefinition> {
    ALL_BADGES.iter().find(|b| b.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_id_has_one_definition() {
        for id in [
            BadgeId::Watch10,
            BadgeId::Favorite5DistinctCategories,
            BadgeId::AiInsights3,
        ] {
            assert_eq!(ALL_BADGES.iter().filter(|b| b.id == id).count(), 1);
        }
    }

    #[test]
    fn thresholds_are_inclusive() {
        let def = badge(BadgeId::AiInsights3).unwrap();
        let mut signals = BadgeSignals {
            ai_insights: 2,
            ..Default::default()
        };
        assert!(!def.is_met(&signals));
        signals.ai_insights = 3;
        assert!(def.is_met(&signals));
    }
}
