//! # Vidzly Core Library
//!
//! Engagement and notification engine for the Vidzly video app. All
//! operations are available through the standalone `vidzly` CLI; any UI is
//! a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Engagement**: progress counters, one-time badge awards and a daily
//!   activity streak
//! - **Notifications**: a bounded in-app log with read state, cooldown-driven
//!   scheduled notifications and throttled platform alerts
//! - **Curation**: a staleness-driven curated feed cache backed by an external
//!   text generator, degrading to local selection
//! - **Storage**: a key-value store (SQLite or in-memory) holding one JSON
//!   record per entity group, plus TOML configuration
//!
//! ## Key Components
//!
//! - [`Engine`]: activation cycle wiring every component together
//! - [`EngagementTracker`]: progress, badges and streak
//! - [`NotificationScheduler`]: per-kind cooldown evaluation
//! - [`NotificationCenter`]: the bounded notification log
//! - [`CuratedFeedCache`]: current curated feed
//! - [`KvStore`]: persistence seam

pub mod catalog;
pub mod curation;
pub mod engagement;
pub mod engine;
pub mod error;
pub mod insights;
pub mod notifications;
pub mod personalize;
pub mod storage;

pub use catalog::{Catalog, ContentId, ContentItem};
pub use curation::{
    ConfiguredGenerator, CuratedFeed, CuratedFeedCache, FallbackSelector, FeedSource,
    GeminiGenerator, OfflineGenerator, RandomFallback, TextGenerator,
};
pub use engagement::{
    BadgeDefinition, BadgeId, EngagementTracker, Progress, StreakState, StreakTransition,
};
pub use engine::{ActivationReport, Engine, ScheduledRun};
pub use error::{ConfigError, CoreError, GenerationError, StoreError};
pub use insights::Insight;
pub use notifications::{
    NotificationCenter, NotificationHub, NotificationKind, NotificationPreferences,
    NotificationRecord, NotificationScheduler, ScheduledKind,
};
pub use storage::{Config, KvStore, MemoryStore, SqliteStore};
