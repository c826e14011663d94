//! "For you" recommendations.
//!
//! Asks the generator to pick from non-favorite candidates given a profile
//! built from the favorites. Generator picks are validated against the
//! catalog and topped up with local picks; any failure falls back to local
//! selection entirely.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::json;

use crate::catalog::{Catalog, ContentId, ContentItem};
use crate::curation::{prompt::strip_code_fence, FallbackSelector, TextGenerator};
use crate::error::GenerationError;

const MAX_CANDIDATES: usize = 50;
const MAX_KEYWORDS: usize = 10;
const SNIPPET_CHARS: usize = 150;

#[derive(Debug, Deserialize)]
struct Recommendation {
    #[serde(rename = "recommendedVideoIds", default)]
    content_ids: Vec<ContentId>,
}

/// Keywords drawn from favorite titles, in first-seen order.
pub fn profile_keywords(catalog: &Catalog, favorites: &HashSet<ContentId>) -> Vec<String> {
    let mut seen = HashSet::new();
    catalog
        .items()
        .iter()
        .filter(|item| favorites.contains(&item.id))
        .flat_map(|item| item.title.split_whitespace())
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() > 3 && word.parse::<f64>().is_err())
        .filter(|word| seen.insert(word.clone()))
        .take(MAX_KEYWORDS)
        .collect()
}

fn recommendation_prompt(keywords: &[String], candidates: &[&ContentItem], count: usize) -> String {
    let listing: Vec<serde_json::Value> = candidates
        .iter()
        .map(|item| {
            json!({
                "id": item.id,
                "title": item.title,
                "description": item.description_snippet(SNIPPET_CHARS),
            })
        })
        .collect();
    format!(
        "Based on the following user profile: \"User shows interest in topics related to: {}.\"\n\
         Recommend {count} unique video IDs from the candidate video list below that the user might like.\n\n\
         Candidate Video List (ID, Title, Description Snippet):\n{}\n\n\
         Provide your response strictly as a JSON object with a single key \"recommendedVideoIds\", \
         which is an array of {count} video string IDs.\nEnsure the JSON is valid.",
        keywords.join(", "),
        serde_json::Value::Array(listing)
    )
}

/// Local picks: non-favorites first, then favorites if the catalog is too small.
fn local_picks<F: FallbackSelector>(
    catalog: &Catalog,
    favorites: &HashSet<ContentId>,
    fallback: &F,
    chosen: &[ContentId],
    count: usize,
) -> Vec<ContentId> {
    let mut picks: Vec<ContentId> = chosen.to_vec();
    let mut exclude: HashSet<ContentId> = favorites.iter().chain(chosen).cloned().collect();
    picks.extend(fallback.select(catalog, count.saturating_sub(picks.len()), &exclude));

    if picks.len() < count {
        exclude = picks.iter().cloned().collect();
        picks.extend(
            catalog
                .items()
                .iter()
                .filter(|item| favorites.contains(&item.id) && !exclude.contains(&item.id))
                .map(|item| item.id.clone())
                .take(count - picks.len()),
        );
    }
    picks
}

async fn ask_generator<G: TextGenerator>(
    generator: &G,
    catalog: &Catalog,
    favorites: &HashSet<ContentId>,
    count: usize,
) -> Result<Vec<ContentId>, GenerationError> {
    let keywords = profile_keywords(catalog, favorites);
    if keywords.is_empty() {
        return Err(GenerationError::Unavailable("no profile from favorites".into()));
    }
    let candidates: Vec<&ContentItem> = catalog
        .items()
        .iter()
        .filter(|item| !favorites.contains(&item.id))
        .take(MAX_CANDIDATES)
        .collect();
    if candidates.len() < count {
        return Err(GenerationError::Unavailable("too few candidates".into()));
    }

    let raw = generator
        .generate(&recommendation_prompt(&keywords, &candidates, count))
        .await?;
    let parsed: Recommendation = serde_json::from_str(strip_code_fence(&raw))
        .map_err(|e| GenerationError::Malformed(e.to_string()))?;

    let mut ids = catalog.retain_known(&parsed.content_ids);
    ids.retain(|id| !favorites.contains(id));
    ids.truncate(count);
    if ids.is_empty() {
        return Err(GenerationError::EmptySelection);
    }
    Ok(ids)
}

/// Up to `count` recommended content ids.
pub async fn recommend<G, F>(
    generator: &G,
    fallback: &F,
    catalog: &Catalog,
    favorites: &HashSet<ContentId>,
    count: usize,
) -> Vec<ContentId>
where
    G: TextGenerator,
    F: FallbackSelector,
{
    if favorites.is_empty() {
        return local_picks(catalog, favorites, fallback, &[], count);
    }
    match ask_generator(generator, catalog, favorites, count).await {
        Ok(ids) => local_picks(catalog, favorites, fallback, &ids, count),
        Err(err) => {
            tracing::debug!(error = %err, "recommendations from local selection");
            local_picks(catalog, favorites, fallback, &[], count)
        }
    }
}
