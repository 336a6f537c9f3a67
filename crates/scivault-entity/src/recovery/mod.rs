//! Credential-recovery domain entities.

pub mod model;

pub use model::{ResetRequest, ResetState};
