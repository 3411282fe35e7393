//! Output writers.
//!
//! # Submodules
//!
//! - [`csv`]: writes the extracted records as a CSV table (the run's result)
//! - [`json`]: writes the raw fetched articles as a debugging snapshot
//!
//! # Output Structure
//!
//! ```text
//! output/
//! └── ai_startup_news.csv   # one row per extracted article
//! data/
//! └── raw.json              # articles exactly as fetched, before dedup
//! ```

pub mod csv;
pub mod json;
