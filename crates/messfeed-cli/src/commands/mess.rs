use clap::Subcommand;
use messfeed_core::storage::Database;
use messfeed_core::{Config, MessType, ProfileStore};

use super::{require_student, CmdResult};

#[derive(Subcommand)]
pub enum MessAction {
    /// Change your mess type and caterer
    Change {
        /// Veg, Non-Veg or Special
        #[arg(long)]
        mess_type: MessType,
        #[arg(long)]
        caterer: String,
    },
    /// List the caterers you can choose from
    Caterers,
}

pub fn run(action: MessAction) -> CmdResult {
    let config = Config::load()?;

    match action {
        MessAction::Change { mess_type, caterer } => {
            let db = Database::open()?;
            let mut student = require_student(&db)?;
            let previous = (student.mess_type, student.caterer.clone());
            let caterer = config.mess.resolve_caterer(&caterer)?;

            if student.change_mess(mess_type, &caterer)? {
                db.save_profile(&student)?;
                tracing::info!(%mess_type, %caterer, "mess changed");
                println!("Mess: {} -> {}", previous.0, student.mess_type);
                println!("Caterer: {} -> {}", previous.1, student.caterer);
                println!("Future feedback will be recorded against the new mess.");
            } else {
                println!("No changes to save.");
            }
        }
        MessAction::Caterers => {
            if config.mess.caterers.is_empty() {
                println!("(any caterer name is accepted)");
            }
            for caterer in &config.mess.caterers {
                println!("{caterer}");
            }
        }
    }
    Ok(())
}
