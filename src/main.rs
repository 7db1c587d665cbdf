//! Oil Library
//!
//! Command line entry point.
//!
//! ```text
//! oil_library migrate          create or upgrade the database schema
//! oil_library import <file>    load imported records from a JSON array
//! oil_library estimate         build derived oils from every imported record
//! ```
//!
//! `estimate` is the default command.

use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use oil_library::build_info;
use oil_library::config;
use oil_library::db::{self, Database};
use oil_library::estimation::process_all;
use oil_library::models::{ImportedRecord, ImportedRecordCreate};

fn open_database() -> Result<Database, Box<dyn std::error::Error>> {
    let db_path = config::database_path();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&db_path)?;
    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    Ok(database)
}

fn import(database: &Database, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let records: Vec<ImportedRecordCreate> = serde_json::from_str(&text)?;

    let mut created = 0;
    for data in &records {
        let existing = database.with_conn(|conn| ImportedRecord::get_by_adios_id(conn, &data.adios_oil_id))?;
        if existing.is_some() {
            eprintln!("  {} already imported, skipping", data.adios_oil_id);
            continue;
        }

        database.with_conn(|conn| ImportedRecord::create(conn, data))?;
        created += 1;
    }

    info!("Imported {} of {} records from {}", created, records.len(), path.display());
    println!("Imported {} records", created);
    Ok(())
}

fn estimate(database: &Database) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(threads) = config::worker_threads() {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }
    let estimation_config = config::estimation_config()?;

    let report = process_all(database, &estimation_config)?;

    for oil in &report.diagnostics {
        for diagnostic in &oil.diagnostics {
            eprintln!("  {}: {}", oil.adios_oil_id, diagnostic);
        }
    }
    for skipped in &report.skipped {
        eprintln!("  skipped {}: {}", skipped.adios_oil_id, skipped.reason);
    }

    println!("Processed: {}", report.processed);
    println!("Skipped:   {}", report.skipped.len());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("oil_library=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner("estimation");

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("estimate");

    let database = open_database()?;

    match command {
        "migrate" => Ok(()),
        "import" => match args.get(2) {
            Some(path) => import(&database, Path::new(path)),
            None => Err("usage: oil_library import <records.json>".into()),
        },
        "estimate" => estimate(&database),
        other => Err(format!("unknown command '{}'", other).into()),
    }
}
