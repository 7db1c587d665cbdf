//! Audit the distillation cuts of derived oils
//!
//! Usage: `audit_oil_cuts [adios_oil_id]`; audits every oil with cuts when no
//! id is given.

use tracing_subscriber::EnvFilter;

use oil_library::build_info;
use oil_library::config;
use oil_library::db::Database;
use oil_library::models::{ImportedRecord, Oil};
use oil_library::tools::audit::{audit_all, audit_oil, render_audit};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("oil_library=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner("cut audit");

    let db_path = config::database_path();
    eprintln!("Database: {}", db_path.display());
    let database = Database::new(&db_path)?;
    let estimation_config = config::estimation_config()?;

    let audits = match std::env::args().nth(1) {
        Some(adios_oil_id) => {
            let found = database.with_conn(|conn| {
                let Some(oil) = Oil::get_by_adios_id(conn, &adios_oil_id)? else {
                    return Ok(None);
                };
                let imported = ImportedRecord::get_by_id(conn, oil.record.imported_record_id)?;
                Ok(imported.map(|imported| (imported, oil)))
            })?;

            let Some((imported, oil)) = found else {
                println!("No derived oil for {}", adios_oil_id);
                return Ok(());
            };
            vec![audit_oil(&imported, &oil, &estimation_config)?]
        }
        None => audit_all(&database, &estimation_config)?,
    };

    for audit in &audits {
        println!("{}", render_audit(audit));
    }
    println!("Audited {} oils", audits.len());

    Ok(())
}
