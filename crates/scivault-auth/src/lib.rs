//! # scivault-auth
//!
//! Access control, session management, and credential recovery for the
//! SciVault platform.
//!
//! ## Modules
//!
//! - `context`: immutable per-call identity snapshots
//! - `gate`: permission-mask checks against the acting context
//! - `identity`: credential storage behind the `IdentityStore` trait
//! - `password`: Argon2id secret hashing
//! - `recovery`: unauthenticated credential-reset flow
//! - `registry`: the user/group directory and context construction
//! - `session`: session lifecycle, impersonation, and expiry sweeps

pub mod context;
pub mod gate;
pub mod identity;
pub mod password;
pub mod recovery;
pub mod registry;
pub mod session;

pub use context::EventContext;
pub use gate::AccessGate;
pub use identity::MemoryIdentityStore;
pub use password::SecretHasher;
pub use recovery::{CredentialRecovery, ResetOutcome};
pub use registry::GroupRegistry;
pub use session::{SessionManager, run_sweeper};
