//! Export every derived oil as JSON
//!
//! Usage: `export_oil_library [output.json]`; writes to stdout when no file
//! is given.

use std::fs::File;
use std::io::{self, BufWriter};

use tracing_subscriber::EnvFilter;

use oil_library::build_info;
use oil_library::config;
use oil_library::db::Database;
use oil_library::tools::export::{collect_export, write_export};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("oil_library=info".parse()?))
        .with_writer(io::stderr)
        .init();

    build_info::print_startup_banner("export");

    let db_path = config::database_path();
    eprintln!("Database: {}", db_path.display());
    let database = Database::new(&db_path)?;

    let export = collect_export(&database)?;

    match std::env::args().nth(1) {
        Some(path) => {
            write_export(&export, BufWriter::new(File::create(&path)?))?;
            eprintln!("Wrote {} oils to {}", export.oil_count, path);
        }
        None => write_export(&export, io::stdout().lock())?,
    }

    Ok(())
}
