//! Dialect parsers, one per source format.

pub mod html;
pub mod xml;

pub use html::{CellarParser, CellarStandardParser, ProposalParser, RegionalParser};
pub use xml::{AkomaNtosoParser, BoeParser, FormexParser};
