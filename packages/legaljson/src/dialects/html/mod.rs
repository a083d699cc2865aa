//! HTML dialects.
//!
//! Each dialect owns its parsed [`scraper::Html`] tree for the length of one
//! conversion.

pub mod cellar;
pub mod proposal;
pub mod regional;
pub mod standard;

pub use cellar::CellarParser;
pub use proposal::ProposalParser;
pub use regional::RegionalParser;
pub use standard::CellarStandardParser;
