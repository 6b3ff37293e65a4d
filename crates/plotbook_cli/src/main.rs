//! Command-line probe for a Plotbook store.
//!
//! # Responsibility
//! - Open the configured store and report on the document in it.
//! - Keep output line-oriented `key=value` for scripting.

use log::error;
use plotbook_core::storage::{format_bytes, BackupKind};
use plotbook_core::{
    init_logging, DocumentStore, EngineConfig, LoadOutcome, SqliteKeyValueStore,
};
use std::error::Error;
use std::process::ExitCode;

fn usage() -> &'static str {
    "usage: plotbook <command>

commands:
  ping      check core linkage
  version   print core and schema versions
  inspect   load (migrating if needed) and summarize the document
  backups   list migration and pre-import backups
  stats     print storage usage
  export    print a backup envelope of the document

environment:
  PLOTBOOK_DB            SQLite file (in-memory when unset)
  PLOTBOOK_STORAGE_KEY   document key (default allotment-unified-data)
  PLOTBOOK_CAPACITY_BYTES  optional size cap
  PLOTBOOK_LOG_LEVEL     trace|debug|info|warn|error
  PLOTBOOK_LOG_DIR       absolute directory for rolling logs
"
}

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first().map(String::as_str) else {
        eprint!("{}", usage());
        return ExitCode::from(2);
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error command={command} error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: &str) -> Result<(), Box<dyn Error>> {
    match command {
        "ping" => {
            println!("plotbook_core ping={}", plotbook_core::ping());
            Ok(())
        }
        "version" => {
            println!("plotbook_core version={}", plotbook_core::core_version());
            println!("schema_version={}", plotbook_core::CURRENT_SCHEMA_VERSION);
            Ok(())
        }
        "inspect" => inspect(&mut open_store()?),
        "backups" => backups(&open_store()?),
        "stats" => stats(&open_store()?),
        "export" => export(&mut open_store()?),
        "-h" | "--help" | "help" => {
            print!("{}", usage());
            Ok(())
        }
        other => Err(format!("unknown command `{other}`\n\n{}", usage()).into()),
    }
}

fn open_store() -> Result<DocumentStore<SqliteKeyValueStore>, Box<dyn Error>> {
    let config = EngineConfig::from_env()?;
    if let Some(dir) = config.log_dir.as_ref().and_then(|dir| dir.to_str()) {
        init_logging(config.log_level, dir)?;
    }

    let kv = match &config.db_path {
        Some(path) => SqliteKeyValueStore::open(path)?,
        None => SqliteKeyValueStore::open_in_memory()?,
    };
    let kv = match config.capacity_bytes {
        Some(bytes) => kv.with_capacity_limit(bytes)?,
        None => kv,
    };
    Ok(DocumentStore::new(kv, &config))
}

fn inspect(store: &mut DocumentStore<SqliteKeyValueStore>) -> Result<(), Box<dyn Error>> {
    let report = match store.load()? {
        LoadOutcome::Empty => {
            println!("document=empty");
            return Ok(());
        }
        LoadOutcome::Loaded(report) => report,
    };

    let document = &report.document;
    println!("name={}", document.meta.name);
    println!("version={}", document.version);
    println!("current_year={}", document.current_year);
    println!("areas={}", document.layout.areas.len());
    println!(
        "archived_areas={}",
        document.layout.areas.iter().filter(|area| area.is_archived).count()
    );
    println!(
        "seasons={}",
        document
            .seasons
            .iter()
            .map(|season| season.year.to_string())
            .collect::<Vec<_>>()
            .join(",")
    );
    println!("varieties={}", document.varieties.len());
    println!("maintenance_tasks={}", document.maintenance_tasks.len());
    println!("repaired={}", report.repaired);
    if let Some(from) = report.migrated_from {
        println!("migrated_from={from}");
        println!("applied_steps={}", report.applied_steps.join(","));
        println!("persisted={}", report.persisted);
    }
    Ok(())
}

fn backups(store: &DocumentStore<SqliteKeyValueStore>) -> Result<(), Box<dyn Error>> {
    for entry in store.list_backups()? {
        let kind = match entry.kind {
            BackupKind::Migration { from_version } => format!("migration from_version={from_version}"),
            BackupKind::PreImport { timestamp_millis } => {
                format!("pre_import timestamp_millis={timestamp_millis}")
            }
        };
        println!("key={} kind={} size={}", entry.key, kind, format_bytes(entry.bytes));
    }
    Ok(())
}

fn stats(store: &DocumentStore<SqliteKeyValueStore>) -> Result<(), Box<dyn Error>> {
    let stats = store.storage_stats()?;
    println!("document_size={}", stats.document_size_label());
    println!("total_size={}", format_bytes(stats.total_bytes));
    println!("backups={}", stats.backup_count);
    if let (Some(quota), Some(percent)) = (stats.quota_bytes, stats.percent_used) {
        println!("quota={}", format_bytes(quota));
        println!("used_percent={percent:.1}");
    }
    Ok(())
}

fn export(store: &mut DocumentStore<SqliteKeyValueStore>) -> Result<(), Box<dyn Error>> {
    match store.load()? {
        LoadOutcome::Empty => Err("no document to export".into()),
        LoadOutcome::Loaded(report) => {
            println!("{}", store.export_backup(&report.document)?);
            Ok(())
        }
    }
}
