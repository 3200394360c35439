//! Shared types for the AuthKit session server workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
