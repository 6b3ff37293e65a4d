//! `kv_entries` table migrations.
//!
//! These version the SQLite table only. The document inside it carries its
//! own schema version, handled by `crate::migration`.
//!
//! # Invariants
//! - `version` values are contiguous from 1.
//! - The last applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct TableMigration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const TABLE_MIGRATIONS: &[TableMigration] = &[
    TableMigration {
        version: 1,
        name: "kv_entries",
        sql: include_str!("0001_kv_entries.sql"),
    },
    TableMigration {
        version: 2,
        name: "kv_entries_updated_index",
        sql: include_str!("0002_kv_entries_updated_index.sql"),
    },
];

/// Latest table version known by this binary.
pub fn latest_version() -> u32 {
    TABLE_MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the table up to `latest_version()` inside one transaction.
///
/// Returns how many migrations ran. A database written by a newer binary is
/// refused untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let stored: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if stored > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stored,
            latest_supported: latest,
        });
    }

    let pending: Vec<&TableMigration> = TABLE_MIGRATIONS
        .iter()
        .filter(|migration| migration.version > stored)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
    }
    tx.commit()?;

    for migration in &pending {
        info!(
            "event=db_migration module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, TABLE_MIGRATIONS};
    use rusqlite::Connection;

    #[test]
    fn versions_are_contiguous() {
        for (index, migration) in TABLE_MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, index + 1, "{}", migration.name);
        }
    }

    #[test]
    fn second_run_applies_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(apply_migrations(&mut conn).unwrap(), latest_version() as usize);
        assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
    }
}
