//! Login, logout and the current student.

use clap::Subcommand;
use messfeed_core::storage::Database;
use messfeed_core::{Config, MessType, ProfileStore, StudentProfile};

use super::{require_student, CmdResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Log in with your student details
    Login {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Registration number
        #[arg(long = "reg-no")]
        registration_number: String,
        /// Year of study
        #[arg(long)]
        year: String,
        /// Veg, Non-Veg or Special
        #[arg(long)]
        mess_type: MessType,
        #[arg(long)]
        caterer: String,
    },
    /// Forget the logged-in student on this device
    Logout,
    /// Show the logged-in student
    Whoami {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SessionAction) -> CmdResult {
    let db = Database::open()?;

    match action {
        SessionAction::Login {
            name,
            email,
            registration_number,
            year,
            mess_type,
            caterer,
        } => {
            let config = Config::load()?;
            let profile = StudentProfile {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                registration_number: registration_number.trim().to_string(),
                year_of_study: year.trim().to_string(),
                mess_type,
                caterer: config.mess.resolve_caterer(&caterer)?,
            };
            profile.validate()?;
            db.save_profile(&profile)?;
            tracing::info!(student = profile.student_id(), "logged in");
            println!("Welcome, {}!", profile.name);
            println!("Mess: {} | Caterer: {}", profile.mess_type, profile.caterer);
        }
        SessionAction::Logout => {
            db.clear_profile()?;
            println!("logged out");
        }
        SessionAction::Whoami { json } => {
            let student = require_student(&db)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&student)?);
            } else {
                println!("{} <{}>", student.name, student.email);
                println!("Registration: {}", student.registration_number);
                println!("Year of study: {}", student.year_of_study);
                println!("Mess: {} | Caterer: {}", student.mess_type, student.caterer);
            }
        }
    }
    Ok(())
}
