//! Feedback desk: the dashboard's read and submit flow.
//!
//! Each call takes a fresh reading of the clock and a fresh snapshot of the
//! student's records for today, then asks the gate. Nothing is cached
//! between calls.

use chrono::{DateTime, FixedOffset};

use crate::clock::{Clock, LocalDay};
use crate::error::{FeedbackError, Result};
use crate::feedback::{FeedbackRecord, Rating};
use crate::gate::MealGate;
use crate::meal::{DayBoard, MealSlot, MealStatus};
use crate::storage::FeedbackStore;
use crate::student::StudentProfile;

pub struct FeedbackDesk<S, C> {
    store: S,
    clock: C,
    gate: MealGate,
}

impl<S: FeedbackStore, C: Clock> FeedbackDesk<S, C> {
    pub fn new(store: S, clock: C, gate: MealGate) -> Self {
        Self { store, clock, gate }
    }

    pub fn gate(&self) -> &MealGate {
        &self.gate
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    /// Today's records for `student`.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn todays_records(&self, student: &StudentProfile) -> Result<Vec<FeedbackRecord>> {
        self.store.records_on(student.student_id(), self.clock.local_day())
    }

    /// Status of every meal right now.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn board(&self, student: &StudentProfile) -> Result<DayBoard> {
        let now = self.clock.now();
        let records = self.store.records_on(student.student_id(), LocalDay::of(now))?;
        Ok(self.gate.board(now, &records))
    }

    /// Rate `slot` if it is open and not yet rated today.
    ///
    /// # Errors
    /// Returns [`FeedbackError::MealLocked`] or [`FeedbackError::AlreadyRated`]
    /// when the slot is not available, or a store error if the write fails.
    pub fn submit(
        &mut self,
        student: &StudentProfile,
        slot: MealSlot,
        rating: Rating,
        comment: &str,
    ) -> Result<FeedbackRecord> {
        let now = self.clock.now();
        let records = self.store.records_on(student.student_id(), LocalDay::of(now))?;

        match self.gate.status(slot, now, &records) {
            MealStatus::Locked => {
                let opens_at = self.gate.thresholds().opens_at_label(slot);
                tracing::warn!(meal = %slot, %opens_at, "refused feedback for locked meal");
                Err(FeedbackError::MealLocked { slot, opens_at }.into())
            }
            MealStatus::Completed => {
                tracing::warn!(meal = %slot, "refused second feedback for meal");
                Err(FeedbackError::AlreadyRated { slot }.into())
            }
            MealStatus::Available => {
                let record = FeedbackRecord::new(student, slot, rating, comment, now);
                self.store.append(&record)?;
                tracing::info!(
                    meal = %slot,
                    rating = rating.get(),
                    student = student.student_id(),
                    "feedback submitted"
                );
                Ok(record)
            }
        }
    }

    /// Every record of `student`, newest first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn history(&self, student: &StudentProfile) -> Result<Vec<FeedbackRecord>> {
        self.store.history(student.student_id())
    }
}
