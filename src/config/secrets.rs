//! Secret handling re-exports.
//!
//! The database URL carries credentials and stays wrapped until the
//! pool is opened.

pub use secrecy::{ExposeSecret, SecretString};
