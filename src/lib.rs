//! `gridgoals` library crate.
//!
//! The binary (`goals`) is a thin wrapper around this library so that:
//!
//! - the goal-tracker engine is testable without spawning processes
//! - data sources, reports and the dashboard share one pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
pub mod tracker;
pub mod tui;
