//! Access control for filesystem paths coming from the UI
//!
//! [`Validator`] classifies candidate strings, [`Allowlist`] holds the
//! directory roots under which mutation is permitted.

pub mod allowlist;
pub mod error;
pub mod validator;

pub use allowlist::{Allowlist, AllowlistSnapshot};
pub use error::{AccessError, ErrorKind, Result};
pub use validator::{is_within, Limits, ValidatedPath, Validator};
