use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, Row};
use serde::Serialize;

use crate::{error::Result, ndr::NdrAction, storage::models::SubmissionRecord};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS action_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                correlation_id TEXT NOT NULL,
                action TEXT NOT NULL,
                waybills TEXT NOT NULL,
                rejected_count INTEGER NOT NULL,
                submitted_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_correlation_id ON action_submissions(correlation_id)",
            [],
        )?;

        Ok(())
    }

    pub fn save_submission(&self, record: &SubmissionRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO action_submissions
             (correlation_id, action, waybills, rejected_count, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.correlation_id,
                record.action.as_str(),
                serde_json::to_string(&record.waybills)?,
                record.rejected_count as i64,
                record.submitted_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_submission_history(&self, limit: Option<usize>) -> Result<Vec<SubmissionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, correlation_id, action, waybills, rejected_count, submitted_at
             FROM action_submissions
             ORDER BY submitted_at DESC, id DESC
             LIMIT ?1",
        )?;

        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let records = stmt
            .query_map([limit], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn find_by_correlation_id(&self, correlation_id: &str) -> Result<Option<SubmissionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, correlation_id, action, waybills, rejected_count, submitted_at
             FROM action_submissions
             WHERE correlation_id = ?1",
        )?;

        let mut records = stmt.query_map([correlation_id], row_to_record)?;
        Ok(records.next().transpose()?)
    }

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let total_submissions: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM action_submissions",
            [],
            |row| row.get(0),
        )?;

        let count_for = |action: NdrAction| -> rusqlite::Result<i64> {
            self.conn.query_row(
                "SELECT COUNT(*) FROM action_submissions WHERE action = ?1",
                [action.as_str()],
                |row| row.get(0),
            )
        };
        let re_attempt_submissions = count_for(NdrAction::ReAttempt)?;
        let rto_submissions = count_for(NdrAction::PickupReschedule)?;

        let total_shipments: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(json_array_length(waybills)), 0) FROM action_submissions",
            [],
            |row| row.get(0),
        )?;

        let total_rejected: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(rejected_count), 0) FROM action_submissions",
            [],
            |row| row.get(0),
        )?;

        Ok(DatabaseStats {
            total_submissions: total_submissions as usize,
            re_attempt_submissions: re_attempt_submissions as usize,
            rto_submissions: rto_submissions as usize,
            total_shipments: total_shipments as usize,
            total_rejected: total_rejected as usize,
        })
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SubmissionRecord> {
    let action: String = row.get(2)?;
    let action = action
        .parse::<NdrAction>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    let waybills: String = row.get(3)?;
    let waybills = serde_json::from_str(&waybills)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    let submitted_at: String = row.get(5)?;
    let submitted_at = DateTime::parse_from_rfc3339(&submitted_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(SubmissionRecord {
        id: row.get(0)?,
        correlation_id: row.get(1)?,
        action,
        waybills,
        rejected_count: row.get::<_, i64>(4)? as usize,
        submitted_at,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub total_submissions: usize,
    pub re_attempt_submissions: usize,
    pub rto_submissions: usize,
    pub total_shipments: usize,
    pub total_rejected: usize,
}
