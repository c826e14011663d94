use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use vidzly_core::{BadgeId, ContentItem, Insight};

use super::{categories, print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum InsightAction {
    /// Summarize a catalog item (counts toward insight badges)
    Summary {
        id: String,
        /// Category of a favorited item (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Suggest tags for a catalog item
    Tags {
        id: String,
    },
}

fn find(session: &Session, id: &str) -> Result<ContentItem, Box<dyn std::error::Error>> {
    session
        .catalog
        .get(id)
        .cloned()
        .ok_or_else(|| format!("no catalog item with id {id}").into())
}

pub async fn run(action: InsightAction, now: DateTime<Utc>) -> CliResult {
    let mut session = Session::open()?;
    match action {
        InsightAction::Summary { id, categories: favorite_categories } => {
            let item = find(&session, &id)?;
            let (summary, awarded) = session
                .engine
                .request_summary(now, &item, &categories(favorite_categories))
                .await;

            #[derive(Serialize)]
            struct SummaryResult {
                summary: Insight<String>,
                awarded: Vec<BadgeId>,
            }
            print_json(&SummaryResult { summary, awarded })
        }
        InsightAction::Tags { id } => {
            let item = find(&session, &id)?;
            print_json(&session.engine.tags(&item).await)
        }
    }
}
