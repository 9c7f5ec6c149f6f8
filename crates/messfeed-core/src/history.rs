//! Feedback history summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackRecord;
use crate::meal::MealSlot;

/// Totals shown under a student's feedback history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total: usize,
    /// Mean rating, `None` when there is no history.
    pub average: Option<f64>,
    pub per_meal: BTreeMap<String, usize>,
}

impl HistorySummary {
    pub fn from_records(records: &[FeedbackRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let sum: u32 = records.iter().map(|r| u32::from(r.rating.get())).sum();
        let mut per_meal = BTreeMap::new();
        for slot in MealSlot::ALL {
            let count = records.iter().filter(|r| r.meal_slot == slot).count();
            if count > 0 {
                per_meal.insert(slot.as_str().to_string(), count);
            }
        }

        Self {
            total: records.len(),
            average: Some(f64::from(sum) / records.len() as f64),
            per_meal,
        }
    }

    /// Average formatted like `4.3/5`.
    pub fn average_label(&self) -> Option<String> {
        self.average.map(|avg| format!("{avg:.1}/5"))
    }
}
