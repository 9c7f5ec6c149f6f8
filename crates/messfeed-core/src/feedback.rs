//! Feedback records.
//!
//! Field names on the wire follow the original browser storage format
//! (`userId`, `mealType`, `messType`, `date`), so the same JSON is read from
//! the local session and from the remote document store.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::meal::MealSlot;
use crate::student::{MessType, StudentProfile};

/// Star rating, 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    /// Returns an error if `value` is outside 1..=5.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn band(self) -> RatingBand {
        RatingBand::from(self)
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

/// Coarse grouping used when listing history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingBand {
    Good,
    Fair,
    Poor,
}

impl From<Rating> for RatingBand {
    fn from(rating: Rating) -> Self {
        match rating.get() {
            4..=5 => RatingBand::Good,
            3 => RatingBand::Fair,
            _ => RatingBand::Poor,
        }
    }
}

/// One submitted rating for one meal slot on one calendar day.
///
/// Records are created once and never mutated. `mess_type` and `caterer` are
/// copied from the profile at submission time, so a later mess change leaves
/// history untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: String,
    #[serde(rename = "userId")]
    pub student_id: String,
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
    #[serde(rename = "mealType")]
    pub meal_slot: MealSlot,
    pub mess_type: MessType,
    pub caterer: String,
    #[serde(rename = "date")]
    pub submitted_at: DateTime<FixedOffset>,
}

impl FeedbackRecord {
    /// Build a new record for `student` with a fresh id.
    pub fn new(
        student: &StudentProfile,
        meal_slot: MealSlot,
        rating: Rating,
        comment: impl Into<String>,
        submitted_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student.student_id().to_string(),
            rating,
            comment: comment.into().trim().to_string(),
            meal_slot,
            mess_type: student.mess_type,
            caterer: student.caterer.clone(),
            submitted_at,
        }
    }

    /// Calendar date in the submitter's own offset.
    ///
    /// Other viewers should use [`crate::clock::LocalDay::contains`] instead.
    pub fn local_date(&self) -> NaiveDate {
        self.submitted_at.date_naive()
    }
}
