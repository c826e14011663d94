//! Curated feeds.
//!
//! - [`TextGenerator`]: async prompt-to-text capability ([`GeminiGenerator`], [`OfflineGenerator`])
//! - [`FallbackSelector`]: local theme and content picks
//! - [`CuratedFeedCache`]: staleness-driven feed regeneration

mod cache;
mod fallback;
mod gemini;
mod generator;
pub mod prompt;

pub use cache::{CuratedFeed, CuratedFeedCache, FeedSource};
pub use fallback::{FallbackSelector, RandomFallback, LOCAL_THEMES};
pub use gemini::GeminiGenerator;
pub use generator::{ConfiguredGenerator, OfflineGenerator, TextGenerator};

#[cfg(test)]
pub(crate) use generator::test_support;
