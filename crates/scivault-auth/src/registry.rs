//! Group directory: groups, memberships, user accounts, and context building.
//!
//! The registry is the single authority on who belongs to which group.
//! All state sits behind one `RwLock`, so a membership mutation that
//! completes before a context build is always visible to that build.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::info;

use scivault_core::config::AuthConfig;
use scivault_core::events::{DirectoryEvent, EventBus, EventPayload};
use scivault_core::types::{GroupId, SessionId, UserId};
use scivault_core::{AppError, AppResult};
use scivault_entity::group::{Group, Membership};
use scivault_entity::permission::PermissionSet;
use scivault_entity::user::UserAccount;

use crate::context::EventContext;

/// Interior directory state.
#[derive(Debug, Default)]
struct RegistryState {
    groups: HashMap<GroupId, Group>,
    groups_by_name: HashMap<String, GroupId>,
    users: HashMap<UserId, UserAccount>,
    users_by_name: HashMap<String, UserId>,
    /// Per-user memberships in join order; never empty for a known user.
    memberships: HashMap<UserId, Vec<Membership>>,
    system_group_id: Option<GroupId>,
}

impl RegistryState {
    fn membership(&self, user_id: UserId, group_id: GroupId) -> Option<&Membership> {
        self.memberships
            .get(&user_id)
            .and_then(|ms| ms.iter().find(|m| m.group_id == group_id))
    }

    fn is_owner_of(&self, user_id: UserId, group_id: GroupId) -> bool {
        self.membership(user_id, group_id)
            .is_some_and(|m| m.is_owner)
    }

    fn is_system_member(&self, user_id: UserId) -> bool {
        self.system_group_id
            .is_some_and(|gid| self.membership(user_id, gid).is_some())
    }

    fn is_system_admin(&self, user_id: UserId) -> bool {
        self.system_group_id
            .is_some_and(|gid| self.is_owner_of(user_id, gid))
    }

    fn member_count(&self, group_id: GroupId) -> usize {
        self.memberships
            .values()
            .flatten()
            .filter(|m| m.group_id == group_id)
            .count()
    }

    fn user(&self, user_id: UserId) -> AppResult<&UserAccount> {
        self.users
            .get(&user_id)
            .ok_or_else(|| AppError::unknown_user(format!("User {user_id} does not exist")))
    }

    fn group(&self, group_id: GroupId) -> AppResult<&Group> {
        self.groups
            .get(&group_id)
            .ok_or_else(|| AppError::unknown_group(format!("Group {group_id} does not exist")))
    }
}

/// The group and account directory.
#[derive(Debug)]
pub struct GroupRegistry {
    /// All directory state behind one lock.
    state: RwLock<RegistryState>,
    /// Bus for directory change events.
    events: EventBus,
    /// Auth configuration (system group name, root account name).
    config: AuthConfig,
}

impl GroupRegistry {
    /// Creates an empty registry. Call [`bootstrap`](Self::bootstrap)
    /// before serving requests.
    pub fn new(config: AuthConfig, events: EventBus) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            events,
            config,
        }
    }

    /// Ensures the reserved system group and the root account exist.
    ///
    /// Idempotent: repeated calls return the existing records. The root
    /// account holds an owner-flagged membership in the system group and
    /// is therefore the first administrator.
    pub async fn bootstrap(&self) -> AppResult<(Group, UserAccount)> {
        let mut pending = Vec::new();

        let (group, root) = {
            let mut state = self.state.write().await;

            let group = match state.system_group_id {
                Some(gid) => state.group(gid)?.clone(),
                None => {
                    let group = Group::new(
                        GroupId::new(),
                        self.config.system_group.clone(),
                        PermissionSet::default(),
                    );
                    state.system_group_id = Some(group.id);
                    state.groups_by_name.insert(group.name.clone(), group.id);
                    state.groups.insert(group.id, group.clone());
                    pending.push(DirectoryEvent::GroupCreated {
                        group_id: group.id,
                        name: group.name.clone(),
                    });
                    info!(group_id = %group.id, name = %group.name, "System group created");
                    group
                }
            };

            let root = match state.users_by_name.get(&self.config.root_username) {
                Some(&uid) => state.user(uid)?.clone(),
                None => {
                    let root = UserAccount::new(
                        UserId::new(),
                        self.config.root_username.clone(),
                        "Root Administrator",
                    );
                    state.users_by_name.insert(root.username.clone(), root.id);
                    state.users.insert(root.id, root.clone());
                    state
                        .memberships
                        .insert(root.id, vec![Membership::new(root.id, group.id, true)]);
                    pending.push(DirectoryEvent::UserRegistered {
                        user_id: root.id,
                        username: root.username.clone(),
                        group_id: group.id,
                    });
                    pending.push(DirectoryEvent::MembershipAdded {
                        group_id: group.id,
                        user_id: root.id,
                        is_owner: true,
                    });
                    info!(user_id = %root.id, username = %root.username, "Root account created");
                    root
                }
            };

            (group, root)
        };

        for event in pending {
            self.events.publish(None, EventPayload::Directory(event));
        }

        Ok((group, root))
    }

    /// Creates a new group. Admin only; group names are unique.
    pub async fn create_group(
        &self,
        ctx: &EventContext,
        name: &str,
        default_permissions: PermissionSet,
    ) -> AppResult<Group> {
        if !ctx.is_admin {
            return Err(AppError::not_authorized(
                "Creating groups requires system administration",
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Group name must not be empty"));
        }

        let group = {
            let mut state = self.state.write().await;
            if state.groups_by_name.contains_key(name) {
                return Err(AppError::conflict(format!(
                    "Group name '{name}' is already in use"
                )));
            }
            let group = Group::new(GroupId::new(), name, default_permissions);
            state.groups_by_name.insert(group.name.clone(), group.id);
            state.groups.insert(group.id, group.clone());
            group
        };

        info!(
            group_id = %group.id,
            name = %group.name,
            created_by = %ctx.user_id,
            "Group created"
        );
        self.events.publish(
            Some(ctx.user_id),
            EventPayload::Directory(DirectoryEvent::GroupCreated {
                group_id: group.id,
                name: group.name.clone(),
            }),
        );

        Ok(group)
    }

    /// Adds a user to a group, or updates the owner flag of an existing
    /// membership.
    ///
    /// The caller must be an admin or an owner of the group. Re-adding an
    /// identical membership is a no-op. Delegated group owners may raise
    /// the owner flag but never lower it; demotion is admin-only.
    pub async fn add_membership(
        &self,
        ctx: &EventContext,
        group_id: GroupId,
        user_id: UserId,
        is_owner: bool,
    ) -> AppResult<()> {
        let changed = {
            let mut state = self.state.write().await;
            self.require_group_authority(&state, ctx, group_id)?;
            state.group(group_id)?;
            state.user(user_id)?;

            let current_flag = state.membership(user_id, group_id).map(|m| m.is_owner);
            match current_flag {
                Some(flag) if flag == is_owner => false,
                Some(flag) => {
                    if flag && !ctx.is_admin {
                        return Err(AppError::not_authorized(
                            "Demoting a group owner requires system administration",
                        ));
                    }
                    let ms = state
                        .memberships
                        .get_mut(&user_id)
                        .ok_or_else(|| AppError::internal("Membership index out of sync"))?;
                    if let Some(m) = ms.iter_mut().find(|m| m.group_id == group_id) {
                        m.is_owner = is_owner;
                    }
                    true
                }
                None => {
                    state
                        .memberships
                        .entry(user_id)
                        .or_default()
                        .push(Membership::new(user_id, group_id, is_owner));
                    true
                }
            }
        };

        if changed {
            info!(
                group_id = %group_id,
                user_id = %user_id,
                is_owner = is_owner,
                added_by = %ctx.user_id,
                "Membership added"
            );
            self.events.publish(
                Some(ctx.user_id),
                EventPayload::Directory(DirectoryEvent::MembershipAdded {
                    group_id,
                    user_id,
                    is_owner,
                }),
            );
        }
        Ok(())
    }

    /// Removes a user from a group.
    ///
    /// The caller must be an admin or an owner of the group; removing a
    /// fellow owner is admin-only. A user's last membership can never be
    /// removed.
    pub async fn remove_membership(
        &self,
        ctx: &EventContext,
        group_id: GroupId,
        user_id: UserId,
    ) -> AppResult<()> {
        {
            let mut state = self.state.write().await;
            self.require_group_authority(&state, ctx, group_id)?;
            let group_name = state.group(group_id)?.name.clone();
            let username = state.user(user_id)?.username.clone();

            let target_is_owner = state
                .membership(user_id, group_id)
                .map(|m| m.is_owner)
                .ok_or_else(|| {
                    AppError::not_member(format!(
                        "User '{username}' is not a member of group '{group_name}'"
                    ))
                })?;
            if target_is_owner && !ctx.is_admin {
                return Err(AppError::not_authorized(
                    "Removing a group owner requires system administration",
                ));
            }

            let ms = state
                .memberships
                .get_mut(&user_id)
                .ok_or_else(|| AppError::internal("Membership index out of sync"))?;
            if ms.len() == 1 {
                return Err(AppError::conflict(format!(
                    "Cannot remove the last membership of user '{username}'"
                )));
            }
            ms.retain(|m| m.group_id != group_id);
        }

        info!(
            group_id = %group_id,
            user_id = %user_id,
            removed_by = %ctx.user_id,
            "Membership removed"
        );
        self.events.publish(
            Some(ctx.user_id),
            EventPayload::Directory(DirectoryEvent::MembershipRemoved { group_id, user_id }),
        );
        Ok(())
    }

    /// Returns the user's memberships in join order. Never empty.
    pub async fn memberships_of(&self, user_id: UserId) -> AppResult<Vec<Membership>> {
        let state = self.state.read().await;
        state.user(user_id)?;
        state
            .memberships
            .get(&user_id)
            .cloned()
            .ok_or_else(|| AppError::internal("Membership index out of sync"))
    }

    /// Returns the group a session defaults to: the chronologically
    /// first membership.
    pub async fn resolve_default_group(&self, user_id: UserId) -> AppResult<GroupId> {
        let state = self.state.read().await;
        state.user(user_id)?;
        state
            .memberships
            .get(&user_id)
            .and_then(|ms| ms.first())
            .map(|m| m.group_id)
            .ok_or_else(|| AppError::internal("Membership index out of sync"))
    }

    /// Registers a new account with its first membership. Admin only.
    pub async fn register_user(
        &self,
        ctx: &EventContext,
        username: &str,
        display_name: &str,
        initial_group: GroupId,
        is_owner: bool,
    ) -> AppResult<UserAccount> {
        if !ctx.is_admin {
            return Err(AppError::not_authorized(
                "Registering users requires system administration",
            ));
        }
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::validation("Username must not be empty"));
        }

        let user = {
            let mut state = self.state.write().await;
            state.group(initial_group)?;
            if state.users_by_name.contains_key(username) {
                return Err(AppError::conflict(format!(
                    "User '{username}' already exists"
                )));
            }
            let user = UserAccount::new(UserId::new(), username, display_name);
            state.users_by_name.insert(user.username.clone(), user.id);
            state.users.insert(user.id, user.clone());
            state
                .memberships
                .insert(user.id, vec![Membership::new(user.id, initial_group, is_owner)]);
            user
        };

        info!(
            user_id = %user.id,
            username = %user.username,
            group_id = %initial_group,
            registered_by = %ctx.user_id,
            "User registered"
        );
        self.events.publish(
            Some(ctx.user_id),
            EventPayload::Directory(DirectoryEvent::UserRegistered {
                user_id: user.id,
                username: user.username.clone(),
                group_id: initial_group,
            }),
        );

        Ok(user)
    }

    /// Activates or deactivates an account. Admin only.
    ///
    /// Deactivated accounts keep their memberships but fail
    /// `build_context`, so existing sessions stop working at the next
    /// call even before they expire.
    pub async fn set_user_active(
        &self,
        ctx: &EventContext,
        user_id: UserId,
        active: bool,
    ) -> AppResult<()> {
        if !ctx.is_admin {
            return Err(AppError::not_authorized(
                "Changing account activation requires system administration",
            ));
        }

        let changed = {
            let mut state = self.state.write().await;
            let user = state
                .users
                .get_mut(&user_id)
                .ok_or_else(|| AppError::unknown_user(format!("User {user_id} does not exist")))?;
            let changed = user.active != active;
            user.active = active;
            changed
        };

        if changed {
            info!(user_id = %user_id, active = active, changed_by = %ctx.user_id, "User activation changed");
            self.events.publish(
                Some(ctx.user_id),
                EventPayload::Directory(DirectoryEvent::UserActivationChanged { user_id, active }),
            );
        }
        Ok(())
    }

    /// Looks up an account by exact username.
    pub async fn find_user_by_name(&self, username: &str) -> AppResult<UserAccount> {
        let state = self.state.read().await;
        let uid = state
            .users_by_name
            .get(username)
            .copied()
            .ok_or_else(|| AppError::unknown_user(format!("User '{username}' does not exist")))?;
        Ok(state.user(uid)?.clone())
    }

    /// Looks up a group by exact name.
    pub async fn find_group_by_name(&self, name: &str) -> AppResult<Group> {
        let state = self.state.read().await;
        let gid = state
            .groups_by_name
            .get(name)
            .copied()
            .ok_or_else(|| AppError::unknown_group(format!("Group '{name}' does not exist")))?;
        Ok(state.group(gid)?.clone())
    }

    /// Looks up an account by ID.
    pub async fn get_user(&self, user_id: UserId) -> AppResult<UserAccount> {
        Ok(self.state.read().await.user(user_id)?.clone())
    }

    /// Looks up a group by ID.
    pub async fn get_group(&self, group_id: GroupId) -> AppResult<Group> {
        Ok(self.state.read().await.group(group_id)?.clone())
    }

    /// Lists all groups sorted by name.
    pub async fn list_groups(&self) -> Vec<Group> {
        let state = self.state.read().await;
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    /// Deletes a group. Admin only; fails while members remain, and the
    /// system group is never deletable.
    pub async fn delete_group(&self, ctx: &EventContext, group_id: GroupId) -> AppResult<()> {
        if !ctx.is_admin {
            return Err(AppError::not_authorized(
                "Deleting groups requires system administration",
            ));
        }

        {
            let mut state = self.state.write().await;
            let name = state.group(group_id)?.name.clone();
            if state.system_group_id == Some(group_id) {
                return Err(AppError::conflict("The system group cannot be deleted"));
            }
            let members = state.member_count(group_id);
            if members > 0 {
                return Err(AppError::conflict(format!(
                    "Cannot delete group '{name}' while {members} member(s) remain"
                )));
            }
            state.groups_by_name.remove(&name);
            state.groups.remove(&group_id);
        }

        info!(group_id = %group_id, deleted_by = %ctx.user_id, "Group deleted");
        self.events.publish(
            Some(ctx.user_id),
            EventPayload::Directory(DirectoryEvent::GroupDeleted { group_id }),
        );
        Ok(())
    }

    /// Builds the immutable identity snapshot for one call.
    ///
    /// Fails with `UnknownUser`/`UnknownGroup` for unresolved identities
    /// and `NotMember` when the group is not among the user's
    /// memberships. Admins get no membership bypass here.
    pub async fn build_context(
        &self,
        user_id: UserId,
        group_id: GroupId,
        session_id: SessionId,
    ) -> AppResult<EventContext> {
        let state = self.state.read().await;
        let user = state.user(user_id)?;
        if !user.active {
            return Err(AppError::unknown_user(format!(
                "User '{}' is not active",
                user.username
            )));
        }
        let group = state.group(group_id)?;
        if state.membership(user_id, group_id).is_none() {
            return Err(AppError::not_member(format!(
                "User '{}' is not a member of group '{}'",
                user.username, group.name
            )));
        }

        Ok(EventContext {
            user_id,
            user_name: user.username.clone(),
            group_id,
            group_name: group.name.clone(),
            session_id,
            is_admin: state.is_system_admin(user_id),
            is_system_group_member: state.is_system_member(user_id),
        })
    }

    /// Whether the user holds an owner-flagged membership in the group.
    pub async fn is_group_owner(&self, user_id: UserId, group_id: GroupId) -> bool {
        self.state.read().await.is_owner_of(user_id, group_id)
    }

    /// Whether the user holds any membership in the system group.
    pub async fn is_system_group_member(&self, user_id: UserId) -> bool {
        self.state.read().await.is_system_member(user_id)
    }

    fn require_group_authority(
        &self,
        state: &RegistryState,
        ctx: &EventContext,
        group_id: GroupId,
    ) -> AppResult<()> {
        if ctx.is_admin || state.is_owner_of(ctx.user_id, group_id) {
            Ok(())
        } else {
            Err(AppError::not_authorized(
                "Managing memberships requires group ownership or system administration",
            ))
        }
    }
}
