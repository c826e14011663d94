use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "vidzly", version, about = "Vidzly engagement engine CLI")]
struct Cli {
    /// Evaluate as if the current time were this RFC 3339 timestamp
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one app activation cycle
    Activate {
        /// Category of a favorited item (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Record a watched video
    Watch {
        /// Category of a favorited item (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// In-app notification log
    Notifications {
        #[command(subcommand)]
        action: commands::notifications::NotificationsAction,
    },
    /// Announce a feature in-app, once per flag
    Announce {
        /// Feature flag
        flag: String,
        title: String,
        body: String,
        /// In-app link (defaults to /settings)
        #[arg(long)]
        link: Option<String>,
    },
    /// Badge catalog and earned badges
    Badges,
    /// Daily streak state
    Streak,
    /// Curated and personalized feeds
    Feed {
        #[command(subcommand)]
        action: commands::feed::FeedAction,
    },
    /// Notification preferences
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Content catalog
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// AI summaries and tags
    Insight {
        #[command(subcommand)]
        action: commands::insight::InsightAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("VIDZLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let now = cli.now.unwrap_or_else(Utc::now);

    let result = match cli.command {
        Commands::Activate { categories } => commands::engagement::activate(now, categories).await,
        Commands::Watch { categories } => commands::engagement::watch(now, categories),
        Commands::Notifications { action } => commands::notifications::run(action),
        Commands::Announce {
            flag,
            title,
            body,
            link,
        } => commands::notifications::announce(&flag, &title, &body, link.as_deref(), now),
        Commands::Badges => commands::engagement::badges(),
        Commands::Streak => commands::engagement::streak(),
        Commands::Feed { action } => commands::feed::run(action, now).await,
        Commands::Prefs { action } => commands::prefs::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Catalog { action } => commands::catalog::run(action),
        Commands::Insight { action } => commands::insight::run(action, now).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
