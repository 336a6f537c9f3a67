//! Permission domain entities.

pub mod flags;
pub mod marshal;
pub mod mask;

pub use flags::{Action, Scope};
pub use marshal::{Securable, on_marshal};
pub use mask::PermissionSet;
