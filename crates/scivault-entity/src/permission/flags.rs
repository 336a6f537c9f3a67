//! Permission scope and action enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The subject class a permission flag applies to.
///
/// Resolution against an object proceeds owner, then group, then world;
/// exactly one scope applies to a given caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The user who owns the object.
    Owner,
    /// Members of the object's group.
    Group,
    /// Everyone else.
    World,
}

impl Scope {
    /// All scopes in resolution order.
    pub const ALL: [Scope; 3] = [Scope::Owner, Scope::Group, Scope::World];

    /// Bit offset of this scope's flag block in the packed mask.
    pub(crate) fn base_bit(&self) -> u16 {
        match self {
            Self::Owner => 0,
            Self::Group => 4,
            Self::World => 8,
        }
    }

    /// Return the scope as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Group => "group",
            Self::World => "world",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Scope {
    type Err = scivault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "group" => Ok(Self::Group),
            "world" => Ok(Self::World),
            _ => Err(scivault_core::AppError::validation(format!(
                "Invalid permission scope: '{s}'"
            ))),
        }
    }
}

/// An operation class gated by a permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Read object content and metadata.
    Read,
    /// Attach annotations without modifying content.
    Annotate,
    /// Modify content and metadata.
    Write,
    /// Reference the object from other objects.
    Link,
}

impl Action {
    /// All actions in flag order.
    pub const ALL: [Action; 4] = [Action::Read, Action::Annotate, Action::Write, Action::Link];

    /// Bit offset of this action within a scope's flag block.
    pub(crate) fn offset(&self) -> u16 {
        match self {
            Self::Read => 0,
            Self::Annotate => 1,
            Self::Write => 2,
            Self::Link => 3,
        }
    }

    /// Return the action as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Annotate => "annotate",
            Self::Write => "write",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = scivault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "annotate" => Ok(Self::Annotate),
            "write" => Ok(Self::Write),
            "link" => Ok(Self::Link),
            _ => Err(scivault_core::AppError::validation(format!(
                "Invalid permission action: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_string_round_trip() {
        for scope in Scope::ALL {
            assert_eq!(scope.as_str().parse::<Scope>().unwrap(), scope);
        }
        assert!("everyone".parse::<Scope>().is_err());
    }

    #[test]
    fn test_action_string_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!("delete".parse::<Action>().is_err());
    }

    #[test]
    fn test_bit_positions_do_not_overlap() {
        let mut seen = 0u16;
        for scope in Scope::ALL {
            for action in Action::ALL {
                let bit = 1u16 << (scope.base_bit() + action.offset());
                assert_eq!(seen & bit, 0, "{scope}/{action} collides");
                seen |= bit;
            }
        }
        assert_eq!(seen, 0x0FFF);
    }
}
