//! Core trait definitions shared across crates.

pub mod identity;

pub use identity::{IdentityStore, SecretHandle};
