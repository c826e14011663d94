//! AI-assisted summaries and tags.
//!
//! Failures are reported as [`Insight::Unavailable`] so the caller can show
//! "unavailable" where the text would have gone.

use serde::Serialize;

use crate::catalog::ContentItem;
use crate::curation::{prompt::strip_code_fence, TextGenerator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Insight<T> {
    Ready(T),
    Unavailable,
}

impl<T> Insight<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Insight::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Insight::Ready(value) => Some(value),
            Insight::Unavailable => None,
        }
    }
}

fn describe(item: &ContentItem) -> &str {
    if item.description.trim().is_empty() {
        "No description provided."
    } else {
        &item.description
    }
}

pub fn summary_prompt(item: &ContentItem) -> String {
    format!(
        "Summarize the following video in 2-3 short sentences for someone deciding whether to watch it. \
         Output only the summary.\nTitle: {}\nDescription: {}\n\nSummary:",
        item.title,
        describe(item)
    )
}

pub fn tags_prompt(item: &ContentItem) -> String {
    format!(
        "Generate 5-7 relevant, concise, comma-separated tags for a video with the following details. \
         Output only the tags, separated by commas.\nTitle: {}\nDescription: {}\n\nTags:",
        item.title,
        describe(item)
    )
}

pub async fn summarize<G: TextGenerator>(generator: &G, item: &ContentItem) -> Insight<String> {
    match generator.generate(&summary_prompt(item)).await {
        Ok(text) => {
            let summary = strip_code_fence(&text);
            if summary.is_empty() {
                Insight::Unavailable
            } else {
                Insight::Ready(summary.to_string())
            }
        }
        Err(err) => {
            tracing::warn!(id = %item.id, error = %err, "summary unavailable");
            Insight::Unavailable
        }
    }
}

pub async fn generate_tags<G: TextGenerator>(generator: &G, item: &ContentItem) -> Insight<Vec<String>> {
    match generator.generate(&tags_prompt(item)).await {
        Ok(text) => {
            let tags = parse_tags(&text);
            if tags.is_empty() {
                Insight::Unavailable
            } else {
                Insight::Ready(tags)
            }
        }
        Err(err) => {
            tracing::warn!(id = %item.id, error = %err, "tags unavailable");
            Insight::Unavailable
        }
    }
}

fn parse_tags(raw: &str) -> Vec<String> {
    strip_code_fence(raw)
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
