//! Student profile and mess assignment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Kind of mess a student eats at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessType {
    #[serde(rename = "Veg", alias = "veg")]
    Veg,
    #[serde(rename = "Non-Veg", alias = "non-veg", alias = "nonveg")]
    NonVeg,
    #[serde(rename = "Special", alias = "special")]
    Special,
}

impl MessType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessType::Veg => "Veg",
            MessType::NonVeg => "Non-Veg",
            MessType::Special => "Special",
        }
    }
}

impl fmt::Display for MessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "veg" | "vegetarian" => Ok(MessType::Veg),
            "non-veg" | "nonveg" | "non_veg" | "non-vegetarian" => Ok(MessType::NonVeg),
            "special" => Ok(MessType::Special),
            other => Err(ValidationError::InvalidValue {
                field: "mess_type".to_string(),
                message: format!("unknown mess type '{other}'"),
            }),
        }
    }
}

/// The logged-in student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub name: String,
    pub email: String,
    pub registration_number: String,
    pub year_of_study: String,
    pub mess_type: MessType,
    pub caterer: String,
}

impl StudentProfile {
    /// Identity used to own feedback records.
    pub fn student_id(&self) -> &str {
        &self.email
    }

    /// Checks that every required field is filled in.
    ///
    /// # Errors
    /// Returns the first empty field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("name", &self.name),
            ("email", &self.email),
            ("registration_number", &self.registration_number),
            ("year_of_study", &self.year_of_study),
            ("caterer", &self.caterer),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field.to_string()));
            }
        }
        Ok(())
    }

    /// Reassign the student's mess. Returns `false` when nothing changed.
    ///
    /// # Errors
    /// Returns an error if `caterer` is empty.
    pub fn change_mess(
        &mut self,
        mess_type: MessType,
        caterer: &str,
    ) -> Result<bool, ValidationError> {
        let caterer = caterer.trim();
        if caterer.is_empty() {
            return Err(ValidationError::MissingField("caterer".to_string()));
        }
        if self.mess_type == mess_type && self.caterer == caterer {
            return Ok(false);
        }
        self.mess_type = mess_type;
        self.caterer = caterer.to_string();
        Ok(true)
    }
}
