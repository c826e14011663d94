use std::collections::HashSet;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use vidzly_core::ContentId;

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum FeedAction {
    /// Current curated feed, regenerated if stale
    Curated,
    /// Previously generated curated feeds, newest first
    History,
    /// Personalized recommendations
    ForYou {
        /// Id of a favorited item (repeatable)
        #[arg(long = "favorite")]
        favorites: Vec<ContentId>,
        /// Number of recommendations
        #[arg(long)]
        count: Option<usize>,
    },
}

pub async fn run(action: FeedAction, now: DateTime<Utc>) -> CliResult {
    let session = Session::open()?;
    match action {
        FeedAction::Curated => {
            let feed = session.engine.curated_feed(now, &session.catalog).await;
            print_json(&feed)
        }
        FeedAction::History => print_json(&session.engine.feeds().history()),
        FeedAction::ForYou { favorites, count } => {
            let favorites: HashSet<ContentId> = favorites.into_iter().collect();
            let count = count.unwrap_or_else(|| session.engine.feed_size());
            let ids = session
                .engine
                .recommend(&session.catalog, &favorites, count)
                .await;
            let items: Vec<_> = ids
                .iter()
                .filter_map(|id| session.catalog.get(id))
                .collect();
            print_json(&items)
        }
    }
}
