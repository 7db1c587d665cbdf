//! Plot an oil's viscosity curve
//!
//! Usage: `plot_oil_viscosity <adios_oil_id> [output.png]`

use tracing_subscriber::EnvFilter;

use oil_library::build_info;
use oil_library::config;
use oil_library::db::Database;
use oil_library::models::Oil;
use oil_library::tools::viscosity_chart::generate_viscosity_chart;

const CHART_WIDTH: u32 = 800;
const CHART_HEIGHT: u32 = 600;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("oil_library=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner("viscosity plot");

    let args: Vec<String> = std::env::args().collect();
    let Some(adios_oil_id) = args.get(1) else {
        return Err("usage: plot_oil_viscosity <adios_oil_id> [output.png]".into());
    };
    let output = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| format!("{}_viscosity.png", adios_oil_id));

    let db_path = config::database_path();
    eprintln!("Database: {}", db_path.display());
    let database = Database::new(&db_path)?;
    let estimation_config = config::estimation_config()?;

    let Some(oil) = database.with_conn(|conn| Oil::get_by_adios_id(conn, adios_oil_id))? else {
        println!("No derived oil for {}", adios_oil_id);
        return Ok(());
    };

    let png = generate_viscosity_chart(&oil, &estimation_config, CHART_WIDTH, CHART_HEIGHT)?;
    std::fs::write(&output, png)?;
    println!("Wrote {}", output);

    Ok(())
}
