//! Reporting tools
//!
//! Export, audit and chart helpers behind the command line tools in `src/bin`.

pub mod audit;
pub mod export;
pub mod viscosity_chart;
