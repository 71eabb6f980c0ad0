//! Input/output helpers.
//!
//! - analysis JSON export and re-import (`export`)

pub mod export;

pub use export::*;
