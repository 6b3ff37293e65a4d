//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Trigger table migrations before returning a usable connection.
//! - Optionally cap the database size to emulate a storage quota.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_logged("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_logged("memory", Connection::open_in_memory)
}

/// Caps the database at roughly `max_bytes` via `PRAGMA max_page_count`.
///
/// Writes that would grow the file past the cap fail with `SQLITE_FULL`
/// and leave previously committed rows untouched. Returns the effective
/// page limit, which SQLite never lowers below the current page count.
pub fn apply_capacity_limit(conn: &Connection, max_bytes: u64) -> DbResult<u64> {
    if max_bytes == 0 {
        return Err(DbError::InvalidCapacity(max_bytes));
    }

    let page_size: i64 = conn.query_row("PRAGMA page_size;", [], |row| row.get(0))?;
    let page_size = u64::try_from(page_size.max(1)).unwrap_or(1);
    let pages = (max_bytes / page_size).max(1);
    let pages = i64::try_from(pages).unwrap_or(i64::MAX);

    let effective: i64 =
        conn.pragma_update_and_check(None, "max_page_count", pages, |row| row.get(0))?;
    info!(
        "event=db_capacity module=db status=ok max_bytes={} page_size={} max_page_count={}",
        max_bytes, page_size, effective
    );
    Ok(u64::try_from(effective).unwrap_or(0))
}

fn open_logged(
    mode: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
