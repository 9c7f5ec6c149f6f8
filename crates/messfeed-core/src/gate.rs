//! Meal gate engine.
//!
//! Decides, for a given local instant and a student's records, whether each
//! meal slot is locked, open for rating, or already rated today.
//!
//! ## Rules
//!
//! Evaluated in this order for one slot:
//!
//! 1. A record for the slot submitted on `now`'s local calendar day makes
//!    the slot **Completed**. Any number of matching records counts as one.
//!    A record's day is read in `now`'s offset, whatever offset it was
//!    written with.
//! 2. Otherwise the slot is **Available** once the local hour reaches the
//!    slot's threshold (inclusive), and **Locked** before it.
//!
//! There is no closing time. The day boundary is local calendar-date
//! equality, not a rolling 24 hour window.

use chrono::{DateTime, FixedOffset, Timelike};

use crate::clock::LocalDay;
use crate::feedback::FeedbackRecord;
use crate::meal::{DayBoard, GateThresholds, MealSlot, MealStatus};

/// Pure status calculator. Holds only its thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MealGate {
    thresholds: GateThresholds,
}

impl MealGate {
    pub fn new(thresholds: GateThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    /// Status of `slot` at `now` given the student's records.
    ///
    /// `records` is expected to hold today's submissions; anything dated on
    /// another local day is ignored.
    pub fn status(
        &self,
        slot: MealSlot,
        now: DateTime<FixedOffset>,
        records: &[FeedbackRecord],
    ) -> MealStatus {
        let today = LocalDay::of(now);
        let rated = records
            .iter()
            .any(|r| r.meal_slot == slot && today.contains(r.submitted_at));
        if rated {
            return MealStatus::Completed;
        }

        if now.hour() >= self.thresholds.hour_for(slot) {
            MealStatus::Available
        } else {
            MealStatus::Locked
        }
    }

    /// Status of every slot at `now`.
    pub fn board(&self, now: DateTime<FixedOffset>, records: &[FeedbackRecord]) -> DayBoard {
        DayBoard::from_fn(|slot| self.status(slot, now, records))
    }
}
