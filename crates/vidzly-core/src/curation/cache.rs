//! Curated feed cache.
//!
//! Keeps a short newest-first history of curated feeds. The newest feed is
//! served until it goes stale; then one refresh asks the generator for a
//! theme and a selection, and degrades to local selection if that fails.
//! Only one refresh runs at a time: callers arriving mid-refresh get the
//! current feed, stale or not.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fallback::FallbackSelector;
use super::generator::TextGenerator;
use super::prompt::{parse_selection, parse_theme, selection_prompt, theme_prompt};
use crate::catalog::{Catalog, ContentId};
use crate::error::GenerationError;
use crate::notifications::{lock_hub, NotificationKind, NotificationRecord, SharedHub};
use crate::storage::{keys, load_or_default, persist, CurationConfig, SharedStore};

/// Where a feed's selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    Generated,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedFeed {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Never empty.
    pub content_ids: Vec<ContentId>,
    pub generated_at: DateTime<Utc>,
    pub source: FeedSource,
}

impl CuratedFeed {
    pub fn is_fresh(&self, now: DateTime<Utc>, staleness: Duration) -> bool {
        now.signed_duration_since(self.generated_at) < staleness
    }
}

struct Draft {
    title: String,
    description: String,
    content_ids: Vec<ContentId>,
    source: FeedSource,
}

/// Clears the refresh flag when the refresh settles, including on
/// cancellation.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CuratedFeedCache {
    store: SharedStore,
    hub: SharedHub,
    history: Mutex<Vec<CuratedFeed>>,
    capacity: usize,
    feed_size: usize,
    refreshing: AtomicBool,
}

impl CuratedFeedCache {
    pub fn load(store: SharedStore, hub: SharedHub, config: &CurationConfig) -> Self {
        let capacity = config.history_capacity.max(1);
        let mut history: Vec<CuratedFeed> = load_or_default(store.as_ref(), keys::CURATED_FEEDS);
        history.truncate(capacity);
        Self {
            store,
            hub,
            history: Mutex::new(history),
            capacity,
            feed_size: config.feed_size.max(1),
            refreshing: AtomicBool::new(false),
        }
    }

    fn history_lock(&self) -> MutexGuard<'_, Vec<CuratedFeed>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn latest(&self) -> Option<CuratedFeed> {
        self.history_lock().first().cloned()
    }

    /// Newest first.
    pub fn history(&self) -> Vec<CuratedFeed> {
        self.history_lock().clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Return the current feed, regenerating it first if it is stale.
    ///
    /// Returns `None` only when there is no feed and none can be built
    /// (empty catalog), or when another refresh is in flight and no feed
    /// exists yet.
    pub async fn get_or_refresh<G, F>(
        &self,
        now: DateTime<Utc>,
        staleness: Duration,
        generator: &G,
        fallback: &F,
        catalog: &Catalog,
    ) -> Option<CuratedFeed>
    where
        G: TextGenerator,
        F: FallbackSelector,
    {
        let latest = self.latest();
        if latest.as_ref().is_some_and(|feed| feed.is_fresh(now, staleness)) {
            tracing::debug!("curated feed still fresh");
            return latest;
        }

        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            tracing::debug!("curated feed refresh already in progress");
            return latest;
        };

        let existing_titles: Vec<String> =
            self.history_lock().iter().map(|feed| feed.title.clone()).collect();

        let generated = self.generate(generator, catalog, &existing_titles).await;

        // Another writer may have stored a fresh feed while we awaited.
        let current = self.latest();
        if current.as_ref().is_some_and(|feed| feed.is_fresh(now, staleness)) {
            return current;
        }

        let draft = match generated {
            Ok(draft) => draft,
            Err(err) => {
                tracing::warn!(error = %err, "curated feed generation failed, using local selection");
                let title = fallback.theme(&existing_titles);
                let content_ids = fallback.select(catalog, self.feed_size, &HashSet::new());
                if content_ids.is_empty() {
                    tracing::warn!("catalog empty, no curated feed");
                    return None;
                }
                Draft {
                    description: fallback.describe(&title),
                    title,
                    content_ids,
                    source: FeedSource::Local,
                }
            }
        };

        Some(self.commit(draft, now))
    }

    async fn generate<G: TextGenerator>(
        &self,
        generator: &G,
        catalog: &Catalog,
        existing_titles: &[String],
    ) -> Result<Draft, GenerationError> {
        if catalog.is_empty() {
            return Err(GenerationError::EmptySelection);
        }

        let title = parse_theme(&generator.generate(&theme_prompt(existing_titles)).await?)?;
        let prompt = selection_prompt(&title, catalog.items(), self.feed_size);
        let selection = parse_selection(&generator.generate(&prompt).await?)?;

        let mut content_ids = catalog.retain_known(&selection.content_ids);
        if content_ids.len() < selection.content_ids.len() {
            tracing::warn!(
                proposed = selection.content_ids.len(),
                kept = content_ids.len(),
                "generator proposed unknown content ids"
            );
        }
        content_ids.truncate(self.feed_size);
        if content_ids.is_empty() {
            return Err(GenerationError::EmptySelection);
        }

        Ok(Draft {
            title,
            description: selection.description,
            content_ids,
            source: FeedSource::Generated,
        })
    }

    fn commit(&self, draft: Draft, now: DateTime<Utc>) -> CuratedFeed {
        let feed = CuratedFeed {
            id: format!("curated_{}", Uuid::new_v4().simple()),
            title: draft.title,
            description: draft.description,
            content_ids: draft.content_ids,
            generated_at: now,
            source: draft.source,
        };

        {
            let mut history = self.history_lock();
            history.insert(0, feed.clone());
            history.truncate(self.capacity);
            persist(self.store.as_ref(), keys::CURATED_FEEDS, &*history);
        }

        lock_hub(&self.hub).push(
            NotificationRecord::new(
                NotificationKind::CuratedFeedNew,
                format!("✨ New Curated Feed: {}", feed.title),
                &feed.description,
                now,
            )
            .with_link("/"),
        );
        tracing::info!(id = %feed.id, title = %feed.title, source = ?feed.source, "curated feed generated");
        feed
    }
}
