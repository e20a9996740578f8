//! Sieve-style mail filter rules: typed tests and actions, the if/elsif/else
//! rule tree, and validation of the editheader actions (RFC 5293).

pub mod config;
pub mod error;
pub mod model;
pub mod store;

pub use error::{Reason, ValidationError};
