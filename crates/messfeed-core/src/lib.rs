//! # Messfeed Core Library
//!
//! This library provides the core logic for Messfeed, a student mess
//! feedback tool. Students rate the four daily meals on a 1-5 star scale,
//! review their history and change their assigned mess. The CLI binary is a
//! thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Meal Gate**: a pure function deciding whether each meal is locked,
//!   open for rating, or already rated today
//! - **Clock**: the single source of "now", injected everywhere it is needed
//! - **Storage**: a feedback store port with a local SQLite implementation
//!   and a remote HTTP document store implementation, plus TOML configuration
//! - **Feedback Desk**: the submit and status flow built from the above
//!
//! ## Key Components
//!
//! - [`MealGate`]: meal status engine
//! - [`FeedbackDesk`]: submission service
//! - [`FeedbackStore`]: storage port
//! - [`Config`]: application configuration management

pub mod clock;
pub mod desk;
pub mod error;
pub mod feedback;
pub mod gate;
pub mod history;
pub mod meal;
pub mod storage;
pub mod student;

pub use clock::{Clock, FixedClock, LocalDay, SystemClock};
pub use desk::FeedbackDesk;
pub use error::{
    ConfigError, CoreError, DatabaseError, FeedbackError, Result, StoreError, ValidationError,
};
pub use feedback::{FeedbackRecord, Rating, RatingBand};
pub use gate::MealGate;
pub use history::HistorySummary;
pub use meal::{DayBoard, GateThresholds, MealSlot, MealStatus};
pub use storage::{
    open_feedback_store, Config, Database, FeedbackStore, ProfileStore, RemoteStore,
    StorageBackend,
};
pub use student::{MessType, StudentProfile};
