//! Packed permission mask with freeze semantics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use scivault_core::{AppError, AppResult};

use super::flags::{Action, Scope};

/// Per-scope read/annotate/write/link flags packed into a `u16`.
///
/// The wire form is the permission token: two characters per scope in
/// owner, group, world order (`r`/`-` for read, then `w` for write,
/// `a` for annotate only, `-` for neither; in this compact form link
/// rides along with write), or three characters per scope when link is
/// tracked separately (`r`/`-`, `w`/`a`/`-`, `l`/`-`). Rendering picks
/// the compact form whenever link matches write in every scope, so
/// parsing and re-rendering a six-character token always reproduces it.
///
/// Once [`freeze`](PermissionSet::freeze) has been called the set is
/// immutable and every mutator fails with `PermissionImmutable`. Freeze
/// state is process-local and not part of the serialized token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PermissionSet {
    bits: u16,
    frozen: bool,
}

// Equality is over the grant bits; the freeze latch is lifecycle state,
// not part of the value.
impl PartialEq for PermissionSet {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for PermissionSet {}

fn bit(scope: Scope, action: Action) -> u16 {
    1 << (scope.base_bit() + action.offset())
}

impl PermissionSet {
    /// A set granting nothing to anyone.
    pub fn empty() -> Self {
        Self {
            bits: 0,
            frozen: false,
        }
    }

    /// The standard grant: owner full control, group read and annotate,
    /// world nothing (`rwra--`).
    pub fn standard() -> Self {
        let mut set = Self::empty();
        for action in Action::ALL {
            set.bits |= bit(Scope::Owner, action);
        }
        set.bits |= bit(Scope::Group, Action::Read);
        set.bits |= bit(Scope::Group, Action::Annotate);
        set
    }

    /// Parse a six- or nine-character permission token.
    ///
    /// Fails with `MalformedPermissionSpec` on any other length or on an
    /// unexpected character; the message names the offending token.
    pub fn parse(token: &str) -> AppResult<Self> {
        let chars: Vec<char> = token.chars().collect();
        let per_scope = match chars.len() {
            6 => 2,
            9 => 3,
            _ => {
                return Err(AppError::malformed_permission_spec(format!(
                    "Permission token '{token}' must be 6 or 9 characters"
                )));
            }
        };

        let mut set = Self::empty();
        for (index, scope) in Scope::ALL.into_iter().enumerate() {
            let slot = &chars[index * per_scope..(index + 1) * per_scope];

            match slot[0] {
                'r' => set.bits |= bit(scope, Action::Read),
                '-' => {}
                c => {
                    return Err(AppError::malformed_permission_spec(format!(
                        "Unexpected character '{c}' in permission token '{token}'"
                    )));
                }
            }

            match slot[1] {
                'w' => {
                    set.bits |= bit(scope, Action::Write);
                    set.bits |= bit(scope, Action::Annotate);
                    if per_scope == 2 {
                        set.bits |= bit(scope, Action::Link);
                    }
                }
                'a' => set.bits |= bit(scope, Action::Annotate),
                '-' => {}
                c => {
                    return Err(AppError::malformed_permission_spec(format!(
                        "Unexpected character '{c}' in permission token '{token}'"
                    )));
                }
            }

            if per_scope == 3 {
                match slot[2] {
                    'l' => set.bits |= bit(scope, Action::Link),
                    '-' => {}
                    c => {
                        return Err(AppError::malformed_permission_spec(format!(
                            "Unexpected character '{c}' in permission token '{token}'"
                        )));
                    }
                }
            }
        }

        Ok(set)
    }

    /// Render the token form.
    ///
    /// Emits the compact six-character form when link equals write in
    /// every scope, otherwise the explicit nine-character form.
    pub fn render(&self) -> String {
        let compact = Scope::ALL
            .into_iter()
            .all(|scope| self.can(scope, Action::Link) == self.can(scope, Action::Write));

        let mut token = String::with_capacity(if compact { 6 } else { 9 });
        for scope in Scope::ALL {
            token.push(if self.can(scope, Action::Read) { 'r' } else { '-' });
            token.push(if self.can(scope, Action::Write) {
                'w'
            } else if self.can(scope, Action::Annotate) {
                'a'
            } else {
                '-'
            });
            if !compact {
                token.push(if self.can(scope, Action::Link) { 'l' } else { '-' });
            }
        }
        token
    }

    /// Check whether the given scope holds the given flag. Pure.
    pub fn can(&self, scope: Scope, action: Action) -> bool {
        self.bits & bit(scope, action) != 0
    }

    /// Set or clear one flag in place.
    ///
    /// Fails with `PermissionImmutable` once the set is frozen.
    pub fn set_flag(&mut self, scope: Scope, action: Action, value: bool) -> AppResult<()> {
        self.ensure_mutable()?;
        if value {
            self.bits |= bit(scope, action);
        } else {
            self.bits &= !bit(scope, action);
        }
        Ok(())
    }

    /// Clear every flag.
    ///
    /// Fails with `PermissionImmutable` once the set is frozen.
    pub fn revoke_all(&mut self) -> AppResult<()> {
        self.ensure_mutable()?;
        self.bits = 0;
        Ok(())
    }

    /// Mark the set immutable. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether [`freeze`](Self::freeze) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_mutable(&self) -> AppResult<()> {
        if self.frozen {
            return Err(AppError::permission_immutable(format!(
                "Permission set '{}' is frozen",
                self.render()
            )));
        }
        Ok(())
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl FromStr for PermissionSet {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<PermissionSet> for String {
    fn from(set: PermissionSet) -> Self {
        set.render()
    }
}

impl TryFrom<String> for PermissionSet {
    type Error = AppError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Self::parse(&token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scivault_core::error::ErrorKind;

    #[test]
    fn test_standard_grant_flags() {
        let set = PermissionSet::default();
        for action in Action::ALL {
            assert!(set.can(Scope::Owner, action));
        }
        assert!(set.can(Scope::Group, Action::Read));
        assert!(set.can(Scope::Group, Action::Annotate));
        assert!(!set.can(Scope::Group, Action::Write));
        assert!(!set.can(Scope::Group, Action::Link));
        for action in Action::ALL {
            assert!(!set.can(Scope::World, action));
        }
        assert_eq!(set.render(), "rwra--");
    }

    #[test]
    fn test_six_char_round_trip() {
        for token in ["rwra--", "rw----", "r-r-r-", "rarara", "------", "rwrwrw"] {
            let set = PermissionSet::parse(token).unwrap();
            assert_eq!(set.render(), token, "round trip of '{token}'");
        }
    }

    #[test]
    fn test_nine_char_tracks_link_separately() {
        let set = PermissionSet::parse("rw-ra-r--").unwrap();
        assert!(set.can(Scope::Owner, Action::Write));
        assert!(!set.can(Scope::Owner, Action::Link));
        assert!(set.can(Scope::Group, Action::Annotate));
        assert!(set.can(Scope::World, Action::Read));
        assert_eq!(set.render(), "rw-ra-r--");
    }

    #[test]
    fn test_nine_char_collapses_when_compact_expressible() {
        let set = PermissionSet::parse("rwlra----").unwrap();
        assert_eq!(set.render(), "rwra--");
    }

    #[test]
    fn test_compact_write_implies_link() {
        let set = PermissionSet::parse("rw----").unwrap();
        assert!(set.can(Scope::Owner, Action::Link));
        assert!(set.can(Scope::Owner, Action::Annotate));
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        for token in ["", "rwra-", "rwra---", "rwra--rwra"] {
            let err = PermissionSet::parse(token).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedPermissionSpec);
            assert!(err.message.contains(token));
        }
    }

    #[test]
    fn test_parse_rejects_unknown_character() {
        for token in ["xwra--", "rxra--", "rwra-x", "rw-ra-r-x"] {
            let err = PermissionSet::parse(token).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedPermissionSpec);
        }
    }

    #[test]
    fn test_freeze_blocks_mutation() {
        let mut set = PermissionSet::default();
        set.freeze();
        assert!(set.is_frozen());

        let err = set.set_flag(Scope::World, Action::Read, true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PermissionImmutable);
        let err = set.revoke_all().unwrap_err();
        assert_eq!(err.kind, ErrorKind::PermissionImmutable);
        assert_eq!(set.render(), "rwra--");
    }

    #[test]
    fn test_double_freeze_is_idempotent() {
        let mut set = PermissionSet::default();
        set.freeze();
        set.freeze();
        assert!(set.is_frozen());
    }

    #[test]
    fn test_clone_keeps_frozen() {
        let mut set = PermissionSet::default();
        set.freeze();
        let copy = set.clone();
        assert!(copy.is_frozen());
    }

    #[test]
    fn test_equality_ignores_freeze_state() {
        let mut frozen = PermissionSet::parse("rwra--").unwrap();
        let thawed = PermissionSet::parse("rwra--").unwrap();
        frozen.freeze();
        assert_eq!(frozen, thawed);
        assert_ne!(frozen, PermissionSet::parse("rw----").unwrap());
    }

    #[test]
    fn test_set_flag_mutates_in_place() {
        let mut set = PermissionSet::empty();
        set.set_flag(Scope::World, Action::Read, true).unwrap();
        assert!(set.can(Scope::World, Action::Read));
        set.set_flag(Scope::World, Action::Read, false).unwrap();
        assert!(!set.can(Scope::World, Action::Read));
    }

    #[test]
    fn test_serde_uses_token_form() {
        let set = PermissionSet::parse("rw----").unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "\"rw----\"");
        let back: PermissionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
