//! # scivault-entity
//!
//! Domain entity models for SciVault. Every struct in this crate
//! represents a directory record or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod group;
pub mod permission;
pub mod recovery;
pub mod session;
pub mod user;
