//! igc-core: Pure decoder for the IGC flight-recorder log format.
//!
//! No async, no I/O — just parsing. One line per record (the task
//! declaration excepted), dispatched on the leading tag character, with
//! extension-field columns declared earlier in the stream and consumed by
//! later fix and periodic-data records. Any structurally invalid record
//! aborts the parse; the error carries the offending line.
//!
//! Fetching log files, selecting data sources, and storing or exporting
//! decoded flights are the callers' concerns.

pub mod coord;
pub mod parse;
mod task;
pub mod types;

// Re-export commonly used items at crate root
pub use coord::dmd_to_decimal;
pub use parse::{parse, parse_partial};
pub use types::*;
