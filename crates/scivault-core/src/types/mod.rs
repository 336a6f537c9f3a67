//! Shared type definitions used across all SciVault crates.

pub mod id;

pub use id::{GroupId, ResetRequestId, SessionId, UserId};
