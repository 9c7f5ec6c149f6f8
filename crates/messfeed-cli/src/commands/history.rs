use clap::Subcommand;
use messfeed_core::storage::Database;
use messfeed_core::{Config, HistorySummary};

use super::{open_desk, require_student, CmdResult};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List all your feedback, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Total count and average rating
    Summary {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: HistoryAction) -> CmdResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let student = require_student(&db)?;
    let desk = open_desk(&config, None)?;
    let records = desk.history(&student)?;

    match action {
        HistoryAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }
            if records.is_empty() {
                println!("No feedback yet. Start rating your mess food to see it here.");
                return Ok(());
            }
            for record in &records {
                println!(
                    "{}  {:<10} {} ({:?})  {} | {}",
                    record.submitted_at.format("%Y-%m-%d %H:%M"),
                    record.meal_slot.to_string(),
                    record.rating,
                    record.rating.band(),
                    record.mess_type,
                    record.caterer,
                );
                if !record.comment.is_empty() {
                    println!("    \"{}\"", record.comment);
                }
            }
        }
        HistoryAction::Summary { json } => {
            let summary = HistorySummary::from_records(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }
            println!("Total feedback: {}", summary.total);
            if let Some(avg) = summary.average_label() {
                println!("Average rating: {avg}");
            }
            for (meal, count) in &summary.per_meal {
                println!("  {meal:<10} {count}");
            }
        }
    }
    Ok(())
}
