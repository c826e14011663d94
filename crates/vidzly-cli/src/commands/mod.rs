pub mod catalog;
pub mod config;
pub mod engagement;
pub mod feed;
pub mod insight;
pub mod notifications;
pub mod prefs;

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use vidzly_core::engagement::CategoryId;
use vidzly_core::notifications::LogNotifier;
use vidzly_core::storage::SharedStore;
use vidzly_core::{Catalog, Config, ConfiguredGenerator, Engine, SqliteStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// The on-disk store under the data directory.
pub fn open_store() -> Result<SharedStore, Box<dyn std::error::Error>> {
    Ok(Arc::new(SqliteStore::open()?))
}

/// Everything a command needs to drive the engine.
pub struct Session {
    pub catalog: Catalog,
    pub engine: Engine<ConfiguredGenerator>,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let store = open_store()?;
        let catalog = Catalog::load(store.as_ref());
        let generator = ConfiguredGenerator::from_config(&config.generator);
        tracing::debug!(
            online = generator.is_online(),
            items = catalog.len(),
            "session opened"
        );
        let engine = Engine::new(store, Arc::new(LogNotifier), generator, &config);
        Ok(Self { catalog, engine })
    }
}

pub fn categories(list: Vec<String>) -> HashSet<CategoryId> {
    vidzly_core::engagement::distinct_categories(list.iter().map(|c| Some(c.as_str())))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
