use clap::Subcommand;
use vidzly_core::notifications::lock_hub;

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Show every notification switch
    List,
    /// Turn a switch on or off
    Set {
        /// Switch name (e.g. "daily_highlight", "platform_enabled")
        name: String,
        /// true or false
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

pub fn run(action: PrefsAction) -> CliResult {
    let session = Session::open()?;
    let mut hub = lock_hub(session.engine.hub());
    match action {
        PrefsAction::List => print_json(hub.preferences()),
        PrefsAction::Set { name, enabled } => {
            let mut prefs = hub.preferences().clone();
            prefs.set(&name, enabled)?;
            hub.set_preferences(prefs);
            println!("ok");
            Ok(())
        }
    }
}
