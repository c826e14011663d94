use std::path::PathBuf;

use clap::Subcommand;
use vidzly_core::Catalog;

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// Replace the stored catalog with a JSON array of items
    Import {
        path: PathBuf,
    },
    /// List stored catalog items
    List,
}

pub fn run(action: CatalogAction) -> CliResult {
    let store = open_store()?;
    match action {
        CatalogAction::Import { path } => {
            let catalog = Catalog::from_json_file(&path)?;
            catalog.save(store.as_ref())?;
            println!("imported {} items", catalog.len());
            Ok(())
        }
        CatalogAction::List => print_json(Catalog::load(store.as_ref()).items()),
    }
}
