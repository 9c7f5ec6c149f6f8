//! Today's meal board and rating submission.

use chrono::{DateTime, FixedOffset};
use clap::Subcommand;
use messfeed_core::storage::Database;
use messfeed_core::{Config, MealSlot, MealStatus, Rating};
use serde_json::json;

use super::{open_desk, parse_at, require_student, CmdResult};

#[derive(Subcommand)]
pub enum MealsAction {
    /// Show which meals can be rated right now
    Status {
        /// Evaluate at this local time instead of now (e.g. 2024-06-10T13:00)
        #[arg(long, value_parser = parse_at)]
        at: Option<DateTime<FixedOffset>>,
        #[arg(long)]
        json: bool,
    },
    /// Rate a meal from 1 to 5 stars, as of the current time
    Rate {
        /// breakfast, lunch, snacks or dinner
        meal: MealSlot,
        /// Stars, 1-5
        rating: i64,
        #[arg(long, short, default_value = "")]
        comment: String,
    },
}

pub fn run(action: MealsAction) -> CmdResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let student = require_student(&db)?;

    match action {
        MealsAction::Status { at, json } => {
            let desk = open_desk(&config, at)?;
            let board = desk.board(&student)?;
            let thresholds = desk.gate().thresholds();

            if json {
                let meals: Vec<_> = board
                    .entries()
                    .map(|(slot, status)| {
                        json!({
                            "meal": slot,
                            "status": status,
                            "opensAt": thresholds.opens_at_label(slot),
                        })
                    })
                    .collect();
                let out = json!({
                    "date": desk.now().date_naive().to_string(),
                    "meals": meals,
                    "completed": board.completed_count(),
                    "allDone": board.all_done(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            println!("Today's meals ({})", desk.now().format("%a %d %b %Y, %H:%M"));
            for (slot, status) in board.entries() {
                match status {
                    MealStatus::Locked => println!(
                        "  {:<10} locked (opens {})",
                        slot.to_string(),
                        thresholds.opens_at_label(slot)
                    ),
                    other => println!("  {:<10} {other}", slot.to_string()),
                }
            }
            println!(
                "Meals rated today: {}/{}",
                board.completed_count(),
                MealSlot::ALL.len()
            );
            if board.all_done() {
                println!("All meals rated for today. Thank you!");
            }
        }
        MealsAction::Rate {
            meal,
            rating,
            comment,
        } => {
            let rating = Rating::new(rating)?;
            let mut desk = open_desk(&config, None)?;
            let record = desk.submit(&student, meal, rating, &comment)?;
            println!(
                "Feedback submitted: {} {} ({} | {})",
                record.meal_slot, record.rating, record.mess_type, record.caterer
            );
            println!(
                "Thank you for rating today's {}. It helps improve our mess service.",
                meal.as_str()
            );
        }
    }
    Ok(())
}
