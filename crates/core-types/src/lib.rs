//! # Cycle Lens Core Types
//!
//! Layer 0 of the workspace: the plain data structures every other crate speaks.
//! It contains no analytics, only the invariants that make a `Series` safe to
//! analyze (strictly ascending timestamps, finite positive prices).

pub mod enums;
pub mod error;
pub mod mapping;
pub mod session;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{ColumnRole, RunDirection};
pub use error::CoreError;
pub use mapping::ColumnMapping;
pub use session::AnalysisSession;
pub use structs::{DcaPlan, Observation, Series};
