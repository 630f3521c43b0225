//! # Cycle Lens Ingest
//!
//! Turns a loosely formatted price table into a normalized `Series`.
//!
//! - `table`: the uniform row set (`RawTable`) and the CSV adapter that fills it.
//! - `columns`: the name-based column classifier and `ColumnMapping` resolution.
//! - `loader`: timestamp/number parsing, sorting, de-duplication and windowing.
//!
//! Bad rows are skipped and reported, never fatal. An empty result is.

pub mod columns;
pub mod error;
pub mod loader;
pub mod table;

pub use columns::{classify, resolve_mapping};
pub use error::IngestError;
pub use loader::{normalize, trailing_window_start, window_filter, NormalizedSeries};
pub use table::RawTable;
