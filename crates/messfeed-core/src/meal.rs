//! Meal slots, their derived status, and the hours at which they open.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};

/// One of the four daily serving windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
}

impl MealSlot {
    /// All slots in the order they are served.
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Snacks,
        MealSlot::Dinner,
    ];

    /// Lowercase identifier used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Snacks => "snacks",
            MealSlot::Dinner => "dinner",
        }
    }

    fn index(self) -> usize {
        match self {
            MealSlot::Breakfast => 0,
            MealSlot::Lunch => 1,
            MealSlot::Snacks => 2,
            MealSlot::Dinner => 3,
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Snacks => "Snacks",
            MealSlot::Dinner => "Dinner",
        };
        f.write_str(label)
    }
}

impl FromStr for MealSlot {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "snacks" | "snack" => Ok(MealSlot::Snacks),
            "dinner" => Ok(MealSlot::Dinner),
            other => Err(ValidationError::InvalidValue {
                field: "meal".to_string(),
                message: format!("unknown meal '{other}'"),
            }),
        }
    }
}

/// Derived, never stored. Recomputed on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealStatus {
    /// Before the slot's opening hour and not yet rated.
    Locked,
    /// Open for rating.
    Available,
    /// Already rated today.
    Completed,
}

impl fmt::Display for MealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MealStatus::Locked => "locked",
            MealStatus::Available => "available",
            MealStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Hour of day (0-23) from which each slot may be rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateThresholds {
    #[serde(default = "default_breakfast")]
    pub breakfast: u32,
    #[serde(default = "default_lunch")]
    pub lunch: u32,
    #[serde(default = "default_snacks")]
    pub snacks: u32,
    #[serde(default = "default_dinner")]
    pub dinner: u32,
}

fn default_breakfast() -> u32 {
    7
}
fn default_lunch() -> u32 {
    12
}
fn default_snacks() -> u32 {
    17
}
fn default_dinner() -> u32 {
    19
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            breakfast: default_breakfast(),
            lunch: default_lunch(),
            snacks: default_snacks(),
            dinner: default_dinner(),
        }
    }
}

impl GateThresholds {
    pub fn hour_for(&self, slot: MealSlot) -> u32 {
        match slot {
            MealSlot::Breakfast => self.breakfast,
            MealSlot::Lunch => self.lunch,
            MealSlot::Snacks => self.snacks,
            MealSlot::Dinner => self.dinner,
        }
    }

    /// Opening time as shown to students, e.g. `"5:00 PM"`.
    pub fn opens_at_label(&self, slot: MealSlot) -> String {
        let hour = self.hour_for(slot);
        let (display, suffix) = match hour {
            0 => (12, "AM"),
            1..=11 => (hour, "AM"),
            12 => (12, "PM"),
            _ => (hour - 12, "PM"),
        };
        format!("{display}:00 {suffix}")
    }

    /// # Errors
    /// Returns an error naming the first slot whose hour is not in 0..=23.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for slot in MealSlot::ALL {
            let hour = self.hour_for(slot);
            if hour > 23 {
                return Err(ConfigError::InvalidValue {
                    key: format!("gate.{}", slot.as_str()),
                    message: format!("hour must be 0-23, got {hour}"),
                });
            }
        }
        Ok(())
    }
}

/// Statuses of all four slots from a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoard {
    statuses: [MealStatus; 4],
}

impl DayBoard {
    pub(crate) fn from_fn(mut f: impl FnMut(MealSlot) -> MealStatus) -> Self {
        Self {
            statuses: MealSlot::ALL.map(&mut f),
        }
    }

    pub fn status(&self, slot: MealSlot) -> MealStatus {
        self.statuses[slot.index()]
    }

    pub fn entries(&self) -> impl Iterator<Item = (MealSlot, MealStatus)> + '_ {
        MealSlot::ALL.into_iter().zip(self.statuses)
    }

    pub fn completed_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == MealStatus::Completed)
            .count()
    }

    /// True once every meal of the day has been rated.
    pub fn all_done(&self) -> bool {
        self.completed_count() == MealSlot::ALL.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let t = GateThresholds::default();
        assert_eq!(t.hour_for(MealSlot::Breakfast), 7);
        assert_eq!(t.hour_for(MealSlot::Lunch), 12);
        assert_eq!(t.hour_for(MealSlot::Snacks), 17);
        assert_eq!(t.hour_for(MealSlot::Dinner), 19);
    }

    #[test]
    fn opening_labels_use_twelve_hour_clock() {
        let t = GateThresholds::default();
        assert_eq!(t.opens_at_label(MealSlot::Breakfast), "7:00 AM");
        assert_eq!(t.opens_at_label(MealSlot::Lunch), "12:00 PM");
        assert_eq!(t.opens_at_label(MealSlot::Snacks), "5:00 PM");
        assert_eq!(t.opens_at_label(MealSlot::Dinner), "7:00 PM");

        let midnight = GateThresholds {
            breakfast: 0,
            ..GateThresholds::default()
        };
        assert_eq!(midnight.opens_at_label(MealSlot::Breakfast), "12:00 AM");
    }

    #[test]
    fn validate_rejects_hour_24() {
        let t = GateThresholds {
            dinner: 24,
            ..GateThresholds::default()
        };
        let err = t.validate().unwrap_err();
        assert!(err.to_string().contains("gate.dinner"));
    }

    #[test]
    fn slot_parses_case_insensitively() {
        assert_eq!("Lunch".parse::<MealSlot>().unwrap(), MealSlot::Lunch);
        assert_eq!(" SNACKS ".parse::<MealSlot>().unwrap(), MealSlot::Snacks);
        assert!("brunch".parse::<MealSlot>().is_err());
    }

    #[test]
    fn slot_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MealSlot::Breakfast).unwrap(),
            "\"breakfast\""
        );
    }

    #[test]
    fn board_counts_completed() {
        let board = DayBoard::from_fn(|slot| match slot {
            MealSlot::Breakfast | MealSlot::Lunch => MealStatus::Completed,
            _ => MealStatus::Locked,
        });
        assert_eq!(board.completed_count(), 2);
        assert!(!board.all_done());
        assert_eq!(board.status(MealSlot::Snacks), MealStatus::Locked);
    }
}
