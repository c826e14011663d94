//! Read-only content catalog.
//!
//! The catalog is supplied by the host. The engine uses it to pick content
//! for notifications, to validate ids returned by the text generator, and
//! as the pool for local fallback selection.

use std::collections::HashSet;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, StoreError};
use crate::storage::{keys, load_or_default, write_record, KvStore};

pub type ContentId = String;

/// One item of watchable content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Popularity metric (view count).
    #[serde(default)]
    pub popularity: u64,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, popularity: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            popularity,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// First `max_chars` characters of the description, for prompts.
    pub fn description_snippet(&self, max_chars: usize) -> String {
        let mut snippet: String = self.description.chars().take(max_chars).collect();
        if self.description.chars().count() > max_chars {
            snippet.push_str("...");
        }
        snippet
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedItem {
    id: ContentId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    popularity: Option<u64>,
    #[serde(default)]
    view_count: Option<String>,
}

impl From<ImportedItem> for ContentItem {
    fn from(item: ImportedItem) -> Self {
        let popularity = item
            .popularity
            .or_else(|| item.view_count.as_deref().and_then(parse_view_count))
            .unwrap_or(0);
        ContentItem::new(item.id, item.title, popularity).with_description(item.description)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    items: Vec<ContentItem>,
}

impl Catalog {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    /// Load a catalog from a JSON array of items.
    ///
    /// Items may carry `popularity` as a number or `viewCount` as a
    /// human-formatted string ("1.2M views").
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid item list.
    pub fn from_json_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CoreError> {
        let imported: Vec<ImportedItem> = serde_json::from_str(content)?;
        Ok(Self::new(imported.into_iter().map(ContentItem::from).collect()))
    }

    /// The catalog persisted in `store`, or an empty one.
    pub fn load(store: &dyn KvStore) -> Self {
        load_or_default(store, keys::CATALOG)
    }

    pub fn save(&self, store: &dyn KvStore) -> Result<(), StoreError> {
        write_record(store, keys::CATALOG, self)
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ContentItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Most popular item; ties go to the earliest entry.
    pub fn top_by_popularity(&self) -> Option<&ContentItem> {
        self.items
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.popularity.cmp(&b.popularity).then(ib.cmp(ia)))
            .map(|(_, item)| item)
    }

    pub fn random_item<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ContentItem> {
        self.items.choose(rng)
    }

    /// Up to `count` distinct items chosen at random, skipping `exclude`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        exclude: &HashSet<ContentId>,
    ) -> Vec<&ContentItem> {
        let candidates: Vec<&ContentItem> = self
            .items
            .iter()
            .filter(|item| !exclude.contains(&item.id))
            .collect();
        candidates.choose_multiple(rng, count).copied().collect()
    }

    /// Keep the ids present in the catalog, in order, without duplicates.
    pub fn retain_known(&self, ids: &[ContentId]) -> Vec<ContentId> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| self.contains(id) && seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}

/// Parse a human-formatted view count ("1.2M", "850K", "12,345") into a number.
pub fn parse_view_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches("views")
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let (number, multiplier) = match cleaned.chars().last()? {
        'K' | 'k' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'M' | 'm' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        'B' | 'b' => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };
    let value: f64 = number.trim().parse().ok()?;
    if value.is_sign_negative() || !value.is_finite() {
        return None;
    }
    Some((value * multiplier).round() as u64)
}
