//! SQLite-based local storage.
//!
//! Provides persistent storage for:
//! - Submitted feedback records
//! - The logged-in student profile (JSON in the key-value table)

use std::path::Path;

use chrono::DateTime;
use rusqlite::{params, Connection, Row, TransactionBehavior};

use super::migrations;
use super::{data_dir, FeedbackStore, ProfileStore};
use crate::clock::LocalDay;
use crate::error::{DatabaseError, FeedbackError, Result};
use crate::feedback::{FeedbackRecord, Rating};
use crate::meal::MealSlot;
use crate::student::{MessType, StudentProfile};

const CURRENT_STUDENT_KEY: &str = "current_student";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite database for single-device use.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database in the data directory.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_in(&data_dir()?)
    }

    /// Open `messfeed.db` inside `dir`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_in(dir: &Path) -> Result<Self> {
        let path = dir.join("messfeed.db");
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "opened local feedback database");
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn query_records(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<FeedbackRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, raw_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(decode(row?)?);
        }
        Ok(records)
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, student_id, rating, comment, meal_slot, mess_type, caterer, submitted_at FROM feedback";

type RawRow = (String, String, i64, String, String, String, String, String);

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode(raw: RawRow) -> Result<FeedbackRecord> {
    let (id, student_id, rating, comment, meal_slot, mess_type, caterer, submitted_at) = raw;
    let corrupt = |message: String| DatabaseError::CorruptRow {
        table: "feedback".to_string(),
        message: format!("{id}: {message}"),
    };
    let rating = Rating::new(rating).map_err(|e| corrupt(e.to_string()))?;
    let meal_slot = meal_slot
        .parse::<MealSlot>()
        .map_err(|e| corrupt(e.to_string()))?;
    let mess_type = mess_type
        .parse::<MessType>()
        .map_err(|e| corrupt(e.to_string()))?;
    let submitted_at =
        DateTime::parse_from_rfc3339(&submitted_at).map_err(|e| corrupt(e.to_string()))?;

    Ok(FeedbackRecord {
        id,
        student_id,
        rating,
        comment,
        meal_slot,
        mess_type,
        caterer,
        submitted_at,
    })
}

impl FeedbackStore for Database {
    fn records_on(&self, student_id: &str, day: LocalDay) -> Result<Vec<FeedbackRecord>> {
        let (start, end) = day.timestamp_range();
        self.query_records(
            &format!(
                "{SELECT_COLUMNS} WHERE student_id = ?1 AND submitted_epoch >= ?2 AND submitted_epoch < ?3"
            ),
            params![student_id, start, end],
        )
    }

    fn history(&self, student_id: &str) -> Result<Vec<FeedbackRecord>> {
        let mut records = self.query_records(
            &format!("{SELECT_COLUMNS} WHERE student_id = ?1"),
            params![student_id],
        )?;
        // Offsets may differ between rows, so order on the instant rather than the text.
        records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(records)
    }

    fn append(&mut self, record: &FeedbackRecord) -> Result<()> {
        // The record's own offset is the writer's "today".
        let (start, end) = LocalDay::of(record.submitted_at).timestamp_range();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM feedback
             WHERE student_id = ?1 AND meal_slot = ?2
               AND submitted_epoch >= ?3 AND submitted_epoch < ?4",
            params![record.student_id, record.meal_slot.as_str(), start, end],
            |row| row.get(0),
        )?;
        if existing > 0 {
            tracing::warn!(meal = %record.meal_slot, "duplicate feedback rejected by local store");
            return Err(FeedbackError::AlreadyRated {
                slot: record.meal_slot,
            }
            .into());
        }

        tx.execute(
            "INSERT INTO feedback
                (id, student_id, rating, comment, meal_slot, mess_type, caterer,
                 submitted_at, local_date, submitted_epoch)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id,
                record.student_id,
                record.rating.get(),
                record.comment,
                record.meal_slot.as_str(),
                record.mess_type.as_str(),
                record.caterer,
                record.submitted_at.to_rfc3339(),
                record.local_date().format(DATE_FORMAT).to_string(),
                record.submitted_at.timestamp(),
            ],
        )?;
        tx.commit()?;

        tracing::debug!(id = %record.id, meal = %record.meal_slot, "stored feedback locally");
        Ok(())
    }
}

impl ProfileStore for Database {
    fn current_profile(&self) -> Result<Option<StudentProfile>> {
        match self.kv_get(CURRENT_STUDENT_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_profile(&self, profile: &StudentProfile) -> Result<()> {
        self.kv_set(CURRENT_STUDENT_KEY, &serde_json::to_string(profile)?)?;
        Ok(())
    }

    fn clear_profile(&self) -> Result<()> {
        self.kv_delete(CURRENT_STUDENT_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn student() -> StudentProfile {
        StudentProfile {
            name: "Ravi".to_string(),
            email: "ravi@campus.edu".to_string(),
            registration_number: "22MIS0042".to_string(),
            year_of_study: "2".to_string(),
            mess_type: MessType::NonVeg,
            caterer: "Compass Group".to_string(),
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2024, 6, day, hour, 15, 0)
            .unwrap()
    }

    #[test]
    fn record_and_query() {
        let mut db = Database::open_memory().unwrap();
        let rating = Rating::new(4).unwrap();
        db.append(&FeedbackRecord::new(&student(), MealSlot::Lunch, rating, "ok", at(10, 13)))
            .unwrap();
        db.append(&FeedbackRecord::new(&student(), MealSlot::Dinner, rating, "", at(9, 20)))
            .unwrap();

        let today = db.records_on("ravi@campus.edu", LocalDay::of(at(10, 9))).unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].meal_slot, MealSlot::Lunch);
        assert_eq!(today[0].comment, "ok");
        assert_eq!(today[0].submitted_at, at(10, 13));

        let history = db.history("ravi@campus.edu").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].meal_slot, MealSlot::Lunch);
        assert!(db.history("someone@else.edu").unwrap().is_empty());
    }

    #[test]
    fn second_rating_same_day_is_rejected() {
        let mut db = Database::open_memory().unwrap();
        let rating = Rating::new(3).unwrap();
        db.append(&FeedbackRecord::new(&student(), MealSlot::Snacks, rating, "", at(10, 17)))
            .unwrap();
        let err = db
            .append(&FeedbackRecord::new(&student(), MealSlot::Snacks, rating, "", at(10, 18)))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Feedback(FeedbackError::AlreadyRated { slot: MealSlot::Snacks })
        ));
    }

    #[test]
    fn records_on_uses_callers_day_not_stored_offset() {
        let mut db = Database::open_memory().unwrap();
        let utc_dinner = DateTime::parse_from_rfc3339("2024-06-11T00:30:00Z").unwrap();
        db.append(&FeedbackRecord::new(
            &student(),
            MealSlot::Dinner,
            Rating::new(4).unwrap(),
            "",
            utc_dinner,
        ))
        .unwrap();

        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let evening_of_10th = LocalDay::of(est.with_ymd_and_hms(2024, 6, 10, 21, 0, 0).unwrap());
        let evening_of_11th = LocalDay::of(est.with_ymd_and_hms(2024, 6, 11, 20, 0, 0).unwrap());
        assert_eq!(db.records_on("ravi@campus.edu", evening_of_10th).unwrap().len(), 1);
        assert!(db.records_on("ravi@campus.edu", evening_of_11th).unwrap().is_empty());

        // Rating tomorrow's dinner from the -05:00 device is not a duplicate.
        db.append(&FeedbackRecord::new(
            &student(),
            MealSlot::Dinner,
            Rating::new(5).unwrap(),
            "",
            est.with_ymd_and_hms(2024, 6, 11, 20, 0, 0).unwrap(),
        ))
        .unwrap();
        assert_eq!(db.history("ravi@campus.edu").unwrap().len(), 2);
    }

    #[test]
    fn id_collision_is_a_database_error() {
        let mut db = Database::open_memory().unwrap();
        let rating = Rating::new(4).unwrap();
        let lunch = FeedbackRecord::new(&student(), MealSlot::Lunch, rating, "", at(10, 13));
        db.append(&lunch).unwrap();

        let reused_id = FeedbackRecord {
            meal_slot: MealSlot::Dinner,
            submitted_at: at(10, 20),
            ..lunch
        };
        let err = db.append(&reused_id).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Database(DatabaseError::QueryFailed(_))
        ));
        assert_eq!(db.history("ravi@campus.edu").unwrap().len(), 1);
    }

    #[test]
    fn profile_session_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.current_profile().unwrap().is_none());
        db.save_profile(&student()).unwrap();
        assert_eq!(db.current_profile().unwrap(), Some(student()));
        db.clear_profile().unwrap();
        assert!(db.current_profile().unwrap().is_none());
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn open_in_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut db = Database::open_in(dir.path()).unwrap();
            db.append(&FeedbackRecord::new(
                &student(),
                MealSlot::Breakfast,
                Rating::new(5).unwrap(),
                "",
                at(10, 8),
            ))
            .unwrap();
        }
        let db = Database::open_in(dir.path()).unwrap();
        assert_eq!(db.history("ravi@campus.edu").unwrap().len(), 1);
    }
}
