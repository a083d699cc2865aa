//! LegalJSON output checks.

pub mod validator;

pub use validator::LegalJsonValidator;
