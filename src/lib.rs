//! Oil Library
//!
//! Estimates oil properties from imported laboratory records and keeps the
//! derived records in SQLite.

pub mod build_info;
pub mod config;
pub mod db;
pub mod estimation;
pub mod models;
pub mod tools;
