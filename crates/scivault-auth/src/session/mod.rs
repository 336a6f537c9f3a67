//! Session lifecycle: login, impersonation, joining, expiry.

pub mod manager;
pub mod sweeper;

pub use manager::SessionManager;
pub use sweeper::run_sweeper;
