//! Resolution seams: which credentials serve an audience, and which secret they present.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
