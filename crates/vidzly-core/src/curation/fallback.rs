//! Local selection used when the generator is unavailable.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::catalog::{Catalog, ContentId};

pub const LOCAL_THEMES: &[&str] = &[
    "Mind-Bending Science Docs",
    "Viral Comedy Gold",
    "Epic Gaming Moments",
    "Future Tech Insights",
    "Travel Vlogs Uncharted",
    "DIY Home Projects",
    "Learn to Code Fast",
    "Space Exploration Wonders",
    "Hidden Culinary Gems",
    "Indie Music Discoveries",
];

/// Picks themes and content without the generator.
pub trait FallbackSelector: Send + Sync {
    /// A theme title, preferring ones not in `existing_titles`.
    fn theme(&self, existing_titles: &[String]) -> String;

    /// Up to `count` distinct catalog ids, skipping `exclude`.
    fn select(&self, catalog: &Catalog, count: usize, exclude: &HashSet<ContentId>) -> Vec<ContentId>;

    fn describe(&self, theme: &str) -> String {
        format!(
            "A curated list of videos about \"{theme}\", picked from the local catalog. \
             Dive in and explore."
        )
    }
}

pub struct RandomFallback {
    rng: Mutex<StdRng>,
}

impl RandomFallback {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackSelector for RandomFallback {
    fn theme(&self, existing_titles: &[String]) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let unused: Vec<&str> = LOCAL_THEMES
            .iter()
            .copied()
            .filter(|theme| !existing_titles.iter().any(|t| t == theme))
            .collect();
        let pool = if unused.is_empty() { LOCAL_THEMES } else { &unused[..] };
        pool.choose(&mut *rng)
            .copied()
            .unwrap_or("Fresh Picks")
            .to_string()
    }

    fn select(&self, catalog: &Catalog, count: usize, exclude: &HashSet<ContentId>) -> Vec<ContentId> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        catalog
            .sample(&mut *rng, count, exclude)
            .into_iter()
            .map(|item| item.id.clone())
            .collect()
    }
}
