mod config;
pub mod database;
pub mod migrations;
pub mod remote;

pub use config::{Config, MessConfig, RemoteConfig, StorageBackend, StorageConfig};
pub use database::Database;
pub use remote::RemoteStore;

use std::path::PathBuf;

use crate::clock::LocalDay;
use crate::error::{ConfigError, Result};
use crate::feedback::FeedbackRecord;
use crate::student::StudentProfile;

/// Persistence for feedback records.
///
/// Implementations must make an appended record visible to the next
/// `records_on` call from the same client.
pub trait FeedbackStore {
    /// Records of `student_id` submitted during `day`, judged in `day`'s
    /// offset rather than each record's own.
    fn records_on(&self, student_id: &str, day: LocalDay) -> Result<Vec<FeedbackRecord>>;

    /// Every record of `student_id`, newest first.
    fn history(&self, student_id: &str) -> Result<Vec<FeedbackRecord>>;

    fn append(&mut self, record: &FeedbackRecord) -> Result<()>;
}

impl<T: FeedbackStore + ?Sized> FeedbackStore for Box<T> {
    fn records_on(&self, student_id: &str, day: LocalDay) -> Result<Vec<FeedbackRecord>> {
        (**self).records_on(student_id, day)
    }

    fn history(&self, student_id: &str) -> Result<Vec<FeedbackRecord>> {
        (**self).history(student_id)
    }

    fn append(&mut self, record: &FeedbackRecord) -> Result<()> {
        (**self).append(record)
    }
}

/// Persistence for the logged-in student on this device.
pub trait ProfileStore {
    fn current_profile(&self) -> Result<Option<StudentProfile>>;

    fn save_profile(&self, profile: &StudentProfile) -> Result<()>;

    fn clear_profile(&self) -> Result<()>;
}

/// Open the feedback store selected by `config.storage.backend`.
///
/// # Errors
/// Returns an error if the selected backend cannot be opened.
pub fn open_feedback_store(config: &Config) -> Result<Box<dyn FeedbackStore>> {
    match config.storage.backend {
        StorageBackend::Local => Ok(Box::new(Database::open()?)),
        StorageBackend::Remote => Ok(Box::new(RemoteStore::from_config(&config.storage.remote)?)),
    }
}

/// Returns the data directory.
///
/// `MESSFEED_DATA_DIR` wins when set; otherwise `~/.config/messfeed`, or
/// `~/.config/messfeed-dev` when `MESSFEED_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("MESSFEED_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("MESSFEED_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("messfeed-dev")
            } else {
                base_dir.join("messfeed")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
