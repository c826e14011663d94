//! Prompts for the text generator and parsing of its replies.

use serde::Deserialize;
use serde_json::json;

use crate::catalog::{ContentId, ContentItem};
use crate::error::GenerationError;

const SNIPPET_CHARS: usize = 100;

/// Generator-proposed feed contents, before catalog validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Selection {
    #[serde(rename = "videoIds", default)]
    pub content_ids: Vec<ContentId>,
    #[serde(default)]
    pub description: String,
}

pub fn theme_prompt(existing_titles: &[String]) -> String {
    format!(
        "Generate a short, catchy theme title (max 5 words) for a video playlist. \
         It should be engaging and suitable for a general audience. \
         If possible, avoid these themes: [{}]. \
         Examples: 'Epic Movie Soundtracks', 'Viral Comedy Gold', 'Mind-Blowing Tech'. \
         Your response should be ONLY the theme title.",
        existing_titles.join(", ")
    )
}

pub fn selection_prompt(theme: &str, items: &[ContentItem], count: usize) -> String {
    let listing: Vec<serde_json::Value> = items
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
        "Given the theme \"{theme}\", select exactly {count} relevant video IDs from the following list.\n\
         For each video, consider its title and description.\n\
         Provide your response strictly as a JSON object with two keys:\n\
         1. \"videoIds\": An array of {count} selected video string IDs.\n\
         2. \"description\": A short, engaging 1-2 sentence description (max 150 characters) \
         for this curated feed based on the theme and selected videos.\n\n\
         Video List:\n{}\n\nEnsure your JSON is valid.\n",
        serde_json::Value::Array(listing)
    )
}

/// Strip a surrounding markdown code fence (optionally language-tagged).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    match inner.split_once('\n') {
        Some((tag, body)) if tag.trim().chars().all(|c| c.is_alphanumeric() || c == '_') => {
            body.trim()
        }
        _ => inner.trim(),
    }
}

/// Clean a generated theme title.
pub fn parse_theme(raw: &str) -> Result<String, GenerationError> {
    let theme: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '.'))
        .collect();
    let theme = theme.trim();
    if theme.is_empty() {
        return Err(GenerationError::Malformed("empty theme title".into()));
    }
    Ok(theme.to_string())
}

pub fn parse_selection(raw: &str) -> Result<Selection, GenerationError> {
    let selection: Selection = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| GenerationError::Malformed(e.to_string()))?;
    if selection.content_ids.is_empty() {
        return Err(GenerationError::EmptySelection);
    }
    if selection.description.trim().is_empty() {
        return Err(GenerationError::Malformed("selection has no description".into()));
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tagged_and_bare_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn theme_cleanup_drops_quotes_and_periods() {
        assert_eq!(parse_theme("\"Epic Gaming Moments.\"\n").unwrap(), "Epic Gaming Moments");
        assert_eq!(parse_theme("Don't Stop").unwrap(), "Dont Stop");
        assert!(parse_theme(" \"\". ").is_err());
    }

    #[test]
    fn parses_fenced_selection() {
        let raw = "```json\n{\"videoIds\": [\"a\", \"b\"], \"description\": \"Two picks\"}\n```";
        let selection = parse_selection(raw).unwrap();
        assert_eq!(selection.content_ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(selection.description, "Two picks");
    }

    #[test]
    fn rejects_empty_or_undescribed_selection() {
        assert_eq!(
            parse_selection(r#"{"videoIds": [], "description": "x"}"#),
            Err(GenerationError::EmptySelection)
        );
        assert!(matches!(
            parse_selection(r#"{"videoIds": ["a"]}"#),
            Err(GenerationError::Malformed(_))
        ));
        assert!(matches!(parse_selection("not json"), Err(GenerationError::Malformed(_))));
    }

    #[test]
    fn prompts_carry_context() {
        let prompt = theme_prompt(&["Viral Comedy Gold".into(), "DIY Home Projects".into()]);
        assert!(prompt.contains("[Viral Comedy Gold, DIY Home Projects]"));

        let items = vec![ContentItem::new("v1", "Rocket launch", 10).with_description("Liftoff")];
        let prompt = selection_prompt("Space", &items, 5);
        assert!(prompt.contains("\"Space\""));
        assert!(prompt.contains("\"id\":\"v1\""));
    }
}
