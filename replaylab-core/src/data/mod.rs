//! Bar sources: finite, forward-only sequences of market events.
//!
//! Sources validate everything at load time. Once constructed they can only
//! yield bars that the engine will accept.

pub mod csv_source;
pub mod synthetic;
pub mod timestamp;

pub use csv_source::{CsvSource, CsvSourceConfig, LoadReport, SourceError};
pub use synthetic::SyntheticSource;
pub use timestamp::parse_timestamp;
