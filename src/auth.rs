//! Auth-domain value types: client credentials, cached tokens, and redacted secrets.

pub mod credentials;
pub mod token;

pub use credentials::*;
pub use token::{record::*, secret::*};
