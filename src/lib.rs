//! `review-insights` library crate.
//!
//! The binary (`insights`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes or touching the network
//! - front-ends (CLI report, TUI dashboard) share one implementation

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod tui;
