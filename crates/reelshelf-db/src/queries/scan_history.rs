//! Scan run history.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use reelshelf_common::{Error, Result, ScanId, ScanStatus};

use super::{conversion_error, optional_timestamp, parsed, timestamp};
use crate::models::ScanRecord;

/// Totals written when a run reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTotals {
    pub status: ScanStatus,
    pub items_found: u32,
    pub items_matched: u32,
    pub error_count: u32,
    pub items_removed: u32,
}

/// Record the start of a run.
pub fn insert_scan(conn: &Connection, record: &ScanRecord) -> Result<()> {
    let folders_json =
        serde_json::to_string(&record.folders).map_err(|e| Error::internal(e.to_string()))?;

    conn.execute(
        "INSERT INTO scan_history (
            id, folders, status, items_found, items_matched, error_count,
            items_removed, started_at, finished_at
         ) VALUES (
            :id, :folders, :status, :items_found, :items_matched, :error_count,
            :items_removed, :started_at, :finished_at
         )",
        rusqlite::named_params! {
            ":id": record.id.to_string(),
            ":folders": folders_json,
            ":status": record.status.as_str(),
            ":items_found": record.items_found,
            ":items_matched": record.items_matched,
            ":error_count": record.error_count,
            ":items_removed": record.items_removed,
            ":started_at": record.started_at.to_rfc3339(),
            ":finished_at": record.finished_at.map(|dt| dt.to_rfc3339()),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Close out a run with its final totals.
pub fn finish_scan(
    conn: &Connection,
    id: ScanId,
    totals: ScanTotals,
    finished_at: DateTime<Utc>,
) -> Result<bool> {
    let rows = conn
        .execute(
            "UPDATE scan_history SET
                status = :status,
                items_found = :items_found,
                items_matched = :items_matched,
                error_count = :error_count,
                items_removed = :items_removed,
                finished_at = :finished_at
             WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":status": totals.status.as_str(),
                ":items_found": totals.items_found,
                ":items_matched": totals.items_matched,
                ":error_count": totals.error_count,
                ":items_removed": totals.items_removed,
                ":finished_at": finished_at.to_rfc3339(),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows > 0)
}

fn parse_scan_row(row: &rusqlite::Row) -> rusqlite::Result<ScanRecord> {
    let folders_json: String = row.get(1)?;
    Ok(ScanRecord {
        id: parsed(row, 0)?,
        folders: serde_json::from_str(&folders_json).map_err(|e| conversion_error(1, e))?,
        status: parsed(row, 2)?,
        items_found: row.get(3)?,
        items_matched: row.get(4)?,
        error_count: row.get(5)?,
        items_removed: row.get(6)?,
        started_at: timestamp(row, 7)?,
        finished_at: optional_timestamp(row, 8)?,
    })
}

/// Get one run by ID.
pub fn get_scan(conn: &Connection, id: ScanId) -> Result<Option<ScanRecord>> {
    conn.query_row(
        "SELECT id, folders, status, items_found, items_matched, error_count,
                items_removed, started_at, finished_at
         FROM scan_history WHERE id = :id",
        rusqlite::named_params! { ":id": id.to_string() },
        parse_scan_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Most recent runs first.
pub fn list_scans(conn: &Connection, limit: u32) -> Result<Vec<ScanRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, folders, status, items_found, items_matched, error_count,
                    items_removed, started_at, finished_at
             FROM scan_history
             ORDER BY started_at DESC
             LIMIT :limit",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    let records = stmt
        .query_map(rusqlite::named_params! { ":limit": limit }, parse_scan_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(records)
}
