/// Scan domain layer: literal search and its classified outcomes.
pub mod errors;
pub mod search;

pub use errors::ScanError;
pub use search::{Finding, SearchOptions, search, validate};
