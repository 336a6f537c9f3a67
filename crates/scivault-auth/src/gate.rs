//! Object access checks against permission masks.

use tracing::debug;

use scivault_core::types::{GroupId, UserId};
use scivault_core::{AppError, AppResult};
use scivault_entity::permission::{Action, PermissionSet, Scope};

use crate::context::EventContext;

/// Decides whether a call may act on an object, given the object's
/// owner, group, and permission mask.
///
/// The object's mask is consulted in exactly one scope per caller:
/// owner when the acting user owns the object, group when the call's
/// active group is the object's group, world otherwise. System-group
/// admins bypass the mask entirely.
#[derive(Debug, Clone)]
pub struct AccessGate;

impl AccessGate {
    /// Creates a new gate.
    pub fn new() -> Self {
        Self
    }

    /// Resolves which scope of the mask applies to this caller.
    pub fn resolve_scope(
        &self,
        ctx: &EventContext,
        owner_id: UserId,
        group_id: GroupId,
    ) -> Scope {
        if ctx.user_id == owner_id {
            Scope::Owner
        } else if ctx.group_id == group_id {
            Scope::Group
        } else {
            Scope::World
        }
    }

    /// Checks whether the caller may perform `action` on the object.
    pub fn check(
        &self,
        ctx: &EventContext,
        owner_id: UserId,
        group_id: GroupId,
        perms: &PermissionSet,
        action: Action,
    ) -> bool {
        if ctx.is_admin {
            return true;
        }
        let scope = self.resolve_scope(ctx, owner_id, group_id);
        perms.can(scope, action)
    }

    /// Like [`check`](Self::check) but fails with `NotAuthorized`,
    /// naming the denied action.
    pub fn require(
        &self,
        ctx: &EventContext,
        owner_id: UserId,
        group_id: GroupId,
        perms: &PermissionSet,
        action: Action,
    ) -> AppResult<()> {
        if self.check(ctx, owner_id, group_id, perms, action) {
            Ok(())
        } else {
            let scope = self.resolve_scope(ctx, owner_id, group_id);
            debug!(
                user_id = %ctx.user_id,
                group_id = %ctx.group_id,
                scope = %scope,
                action = %action,
                "Access denied"
            );
            Err(AppError::not_authorized(format!(
                "Scope '{scope}' does not grant '{action}' on this object"
            )))
        }
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new()
    }
}
