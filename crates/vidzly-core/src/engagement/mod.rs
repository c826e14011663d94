mod badges;
mod streak;
mod tracker;

pub use badges::{badge, BadgeDefinition, BadgeId, BadgeSignals, CriteriaKind, ALL_BADGES};
pub use streak::{StreakRules, StreakState, StreakTransition};
pub use tracker::{distinct_categories, CategoryId, EngagementTracker, Progress};
