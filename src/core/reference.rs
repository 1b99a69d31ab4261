//! Entity references - typed pointers to records of any entity kind
//!
//! A reference is a `(kind, id)` pair. It carries identity only: nothing in
//! this crate resolves a reference to a record, so references to records that
//! no longer exist are perfectly valid values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when building a reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("Invalid reference: {reason}")]
    InvalidReference { reason: String },
}

impl ReferenceError {
    fn invalid(reason: impl Into<String>) -> Self {
        ReferenceError::InvalidReference {
            reason: reason.into(),
        }
    }
}

/// Name of an entity type (e.g. "Event", "Person", "Color")
///
/// The set of kinds is open: any non-blank name is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKind(String);

impl EntityKind {
    /// Create a kind, rejecting empty or whitespace-only names
    pub fn new(name: impl Into<String>) -> Result<Self, ReferenceError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ReferenceError::invalid("entity kind is empty"));
        }
        if trimmed.contains(':') {
            return Err(ReferenceError::invalid(format!(
                "entity kind '{}' must not contain ':'",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityKind {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityKind {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.0
    }
}

/// Pointer to "some record of some entity kind"
///
/// Immutable once built; equality compares both kind and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawReference")]
pub struct EntityReference {
    kind: EntityKind,
    id: i64,
}

#[derive(Deserialize)]
struct RawReference {
    kind: String,
    id: i64,
}

impl TryFrom<RawReference> for EntityReference {
    type Error = ReferenceError;

    fn try_from(raw: RawReference) -> Result<Self, Self::Error> {
        Self::new(raw.kind, raw.id)
    }
}

impl EntityReference {
    /// Build a reference, failing on a blank kind or a non-positive id
    pub fn new(kind: impl Into<String>, id: i64) -> Result<Self, ReferenceError> {
        let kind = EntityKind::new(kind)?;
        Self::from_parts(kind, id)
    }

    /// Build a reference from an already validated kind
    pub fn from_parts(kind: EntityKind, id: i64) -> Result<Self, ReferenceError> {
        if id <= 0 {
            return Err(ReferenceError::invalid(format!(
                "id must be a positive identifier (got {})",
                id
            )));
        }
        Ok(Self { kind, id })
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Parses the `Kind:id` form (e.g. `Event:42`)
impl FromStr for EntityReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .rsplit_once(':')
            .ok_or_else(|| ReferenceError::invalid(format!("expected Kind:id, got '{}'", s)))?;
        let id: i64 = id
            .trim()
            .parse()
            .map_err(|_| ReferenceError::invalid(format!("'{}' is not a numeric id", id)))?;
        Self::new(kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_reference() {
        let r = EntityReference::new("Event", 42).unwrap();
        assert_eq!(r.kind().as_str(), "Event");
        assert_eq!(r.id(), 42);
        assert_eq!(r.to_string(), "Event:42");
    }

    #[test]
    fn test_rejects_non_positive_id() {
        assert!(matches!(
            EntityReference::new("Event", 0),
            Err(ReferenceError::InvalidReference { .. })
        ));
        assert!(EntityReference::new("Event", -3).is_err());
    }

    #[test]
    fn test_rejects_blank_kind() {
        assert!(EntityReference::new("", 1).is_err());
        assert!(EntityReference::new("   ", 1).is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a = EntityReference::new("Person", 7).unwrap();
        let b = EntityReference::new("Person", 7).unwrap();
        let c = EntityReference::new("Image", 7).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_parse_kind_colon_id() {
        let r: EntityReference = "Color:3".parse().unwrap();
        assert_eq!(r, EntityReference::new("Color", 3).unwrap());

        assert!("Color".parse::<EntityReference>().is_err());
        assert!("Color:abc".parse::<EntityReference>().is_err());
        assert!(":5".parse::<EntityReference>().is_err());
        assert!("Color:0".parse::<EntityReference>().is_err());
    }

    #[test]
    fn test_kind_is_trimmed() {
        let kind = EntityKind::new("  Hashtag ").unwrap();
        assert_eq!(kind.as_str(), "Hashtag");
    }

    #[test]
    fn test_serde_round_trip_through_json() {
        let r = EntityReference::new("Font", 9).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"kind":"Font","id":9}"#);
        let back: EntityReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);

        assert!(serde_json::from_str::<EntityReference>(r#"{"kind":"","id":9}"#).is_err());
        assert!(serde_json::from_str::<EntityReference>(r#"{"kind":"Font","id":0}"#).is_err());
    }
}
