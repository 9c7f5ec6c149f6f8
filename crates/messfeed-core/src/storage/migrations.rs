//! Database schema migrations for messfeed.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
pub(crate) fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version, assuming 0");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: feedback records and the key-value table.
///
/// `local_date` is the submitter's local calendar date (`YYYY-MM-DD`).
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS feedback (
            id           TEXT PRIMARY KEY,
            student_id   TEXT NOT NULL,
            rating       INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            comment      TEXT NOT NULL DEFAULT '',
            meal_slot    TEXT NOT NULL,
            mess_type    TEXT NOT NULL,
            caterer      TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            local_date   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: one record per student, day and meal.
///
/// Rows that would violate the new unique index are dropped, keeping the
/// earliest submission for each (student, day, meal).
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    let removed = tx.execute(
        "DELETE FROM feedback
         WHERE rowid NOT IN (
             SELECT MIN(rowid) FROM feedback
             GROUP BY student_id, local_date, meal_slot
         )",
        [],
    )?;
    if removed > 0 {
        tracing::warn!(removed, "dropped duplicate feedback rows during migration");
    }

    tx.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_feedback_student_day_meal
             ON feedback(student_id, local_date, meal_slot);
         CREATE INDEX IF NOT EXISTS idx_feedback_student_submitted
             ON feedback(student_id, submitted_at);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

/// Migration v3: day lookups by instant.
///
/// `local_date` only holds the submitter's date, which disagrees with the
/// reader's day once offsets differ. Rows gain `submitted_epoch` (Unix
/// seconds) and the per-day unique index is replaced by an instant index;
/// the one-per-day rule is checked inside the append transaction instead.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE feedback ADD COLUMN submitted_epoch INTEGER NOT NULL DEFAULT 0;

         UPDATE feedback
            SET submitted_epoch = COALESCE(CAST(strftime('%s', submitted_at) AS INTEGER), 0);

         DROP INDEX IF EXISTS idx_feedback_student_day_meal;
         DROP INDEX IF EXISTS idx_feedback_student_submitted;
         CREATE INDEX IF NOT EXISTS idx_feedback_student_epoch
             ON feedback(student_id, submitted_epoch);",
    )?;

    set_schema_version(&tx, 3)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(conn: &Connection, id: &str, meal: &str, date: &str) {
        conn.execute(
            "INSERT INTO feedback
                (id, student_id, rating, meal_slot, mess_type, caterer, submitted_at, local_date)
             VALUES (?1, 'asha@campus.edu', 4, ?2, 'Veg', 'Sodexo', ?3 || 'T12:00:00+05:30', ?3)",
            rusqlite::params![id, meal, date],
        )
        .unwrap();
    }

    #[test]
    fn test_migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);

        let out_of_range = conn.execute(
            "INSERT INTO feedback
                (id, student_id, rating, meal_slot, mess_type, caterer, submitted_at, local_date)
             VALUES ('b', 'asha@campus.edu', 6, 'lunch', 'Veg', 'Sodexo', 'x', '2024-06-10')",
            [],
        );
        assert!(out_of_range.is_err());
    }

    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_incremental_migration_drops_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 1);

        insert(&conn, "first", "dinner", "2024-06-10");
        insert(&conn, "second", "dinner", "2024-06-10");
        insert(&conn, "other-day", "dinner", "2024-06-11");

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);

        let mut stmt = conn.prepare("SELECT id FROM feedback ORDER BY id").unwrap();
        let ids: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec!["first".to_string(), "other-day".to_string()]);
    }

    #[test]
    fn test_v3_backfills_epoch_from_offset_timestamps() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        migrate_v2(&conn).unwrap();
        insert(&conn, "lunch", "lunch", "2024-06-10");

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 3);

        let epoch: i64 = conn
            .query_row("SELECT submitted_epoch FROM feedback WHERE id = 'lunch'", [], |row| {
                row.get(0)
            })
            .unwrap();
        let expected = chrono::DateTime::parse_from_rfc3339("2024-06-10T12:00:00+05:30")
            .unwrap()
            .timestamp();
        assert_eq!(epoch, expected);

        let unique_index: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'idx_feedback_student_day_meal'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(unique_index, 0);
    }
}
