//! Unauthenticated credential-reset flow.

pub mod service;

pub use service::{CredentialRecovery, ResetOutcome};
