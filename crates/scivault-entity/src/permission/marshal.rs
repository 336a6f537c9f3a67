//! Marshalling-boundary freeze hook.

use super::mask::PermissionSet;

/// An entity carrying a permission set that must be sealed before it
/// leaves the process.
pub trait Securable {
    /// Mutable access to the entity's permission set.
    fn permissions_mut(&mut self) -> &mut PermissionSet;
}

/// Freeze the entity's permissions at the persistence boundary.
///
/// Idempotent: marshalling the same entity twice leaves it frozen once.
pub fn on_marshal<T: Securable>(entity: &mut T) {
    entity.permissions_mut().freeze();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Group;
    use crate::permission::{Action, Scope};
    use scivault_core::error::ErrorKind;
    use scivault_core::types::GroupId;

    #[test]
    fn test_on_marshal_freezes_group_permissions() {
        let mut group = Group::new(GroupId::new(), "cryo-em", PermissionSet::default());
        assert!(!group.default_permissions.is_frozen());

        on_marshal(&mut group);
        on_marshal(&mut group);
        assert!(group.default_permissions.is_frozen());

        let err = group
            .default_permissions
            .set_flag(Scope::World, Action::Read, true)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::PermissionImmutable);
    }
}
