use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use vidzly_core::notifications::lock_hub;
use vidzly_core::NotificationRecord;

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum NotificationsAction {
    /// List notifications, newest first
    List {
        /// Include categories hidden by preferences
        #[arg(long)]
        all: bool,
    },
    /// Number of unread notifications
    Unread,
    /// Mark one notification as read
    Read {
        id: String,
    },
    /// Mark every notification as read
    ReadAll,
    /// Remove one notification
    Remove {
        id: String,
    },
    /// Remove every notification
    Clear,
}

pub fn run(action: NotificationsAction) -> CliResult {
    let session = Session::open()?;
    let mut hub = lock_hub(session.engine.hub());
    match action {
        NotificationsAction::List { all } => {
            let records: Vec<&NotificationRecord> = if all {
                hub.center().notifications().iter().collect()
            } else {
                hub.center().visible(hub.preferences()).collect()
            };
            print_json(&records)?;
        }
        NotificationsAction::Unread => {
            #[derive(Serialize)]
            struct Unread {
                unread: usize,
                total: usize,
            }
            print_json(&Unread {
                unread: hub.center().unread_count(),
                total: hub.center().len(),
            })?;
        }
        NotificationsAction::Read { id } => {
            if !hub.center_mut().mark_read(&id) {
                return Err(format!("no unread notification with id {id}").into());
            }
            println!("ok");
        }
        NotificationsAction::ReadAll => {
            hub.center_mut().mark_all_read();
            println!("ok");
        }
        NotificationsAction::Remove { id } => {
            if !hub.center_mut().remove(&id) {
                return Err(format!("no notification with id {id}").into());
            }
            println!("ok");
        }
        NotificationsAction::Clear => {
            hub.center_mut().clear_all();
            println!("ok");
        }
    }
    Ok(())
}

/// Announce a feature once per flag, ever.
pub fn announce(
    flag: &str,
    title: &str,
    body: &str,
    link: Option<&str>,
    now: DateTime<Utc>,
) -> CliResult {
    let mut session = Session::open()?;
    let outcome = session.engine.announce_feature(flag, title, body, link, now);
    print_json(&outcome)
}
