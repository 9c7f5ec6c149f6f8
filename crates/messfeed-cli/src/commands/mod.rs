pub mod config;
pub mod history;
pub mod meals;
pub mod mess;
pub mod session;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use messfeed_core::storage::Database;
use messfeed_core::{
    open_feedback_store, Clock, Config, FeedbackDesk, FeedbackError, FeedbackStore, FixedClock,
    MealGate, ProfileStore, StudentProfile, SystemClock,
};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an `--at` override: RFC 3339, or a local date and time.
pub fn parse_at(value: &str) -> Result<DateTime<FixedOffset>, String> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant);
    }
    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| format!("cannot parse '{value}' as a date and time (try 2024-06-10T13:00)"))?;
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| format!("'{value}' is not a unique local time"))
}

/// Logged-in student, or an error telling the user to log in.
pub fn require_student(db: &Database) -> Result<StudentProfile, Box<dyn std::error::Error>> {
    db.current_profile()?
        .ok_or_else(|| FeedbackError::NotLoggedIn.into())
}

/// Desk over the configured store, pinned to `at` or the current time.
///
/// Only read-only views may pass `at`; submissions always use the real clock.
pub fn open_desk(
    config: &Config,
    at: Option<DateTime<FixedOffset>>,
) -> Result<FeedbackDesk<Box<dyn FeedbackStore>, FixedClock>, Box<dyn std::error::Error>> {
    let store = open_feedback_store(config)?;
    let now = at.unwrap_or_else(|| SystemClock.now());
    Ok(FeedbackDesk::new(store, FixedClock::new(now), MealGate::new(config.gate)))
}
