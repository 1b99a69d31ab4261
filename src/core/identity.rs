//! Record identifiers
//!
//! Records owned by this crate are identified as `PREFIX-ULID`, e.g.
//! `ASC-01KCWY20F01B21V0G4E835NW3J` for an association.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Kind of record an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordPrefix {
    /// Association between a label and a target
    Asc,
    /// Workflow record (review or progress)
    Wfl,
}

impl RecordPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordPrefix::Asc => "ASC",
            RecordPrefix::Wfl => "WFL",
        }
    }
}

impl fmt::Display for RecordPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(RecordPrefix::Asc),
            "WFL" => Ok(RecordPrefix::Wfl),
            _ => Err(IdParseError::UnknownPrefix(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("Missing '-' separator in ID: {0}")]
    MissingSeparator(String),

    #[error("Unknown ID prefix: {0}")]
    UnknownPrefix(String),

    #[error("Invalid ULID in ID: {0}")]
    InvalidUlid(String),

    #[error("Expected a {expected} ID, got {actual}")]
    WrongPrefix {
        expected: RecordPrefix,
        actual: RecordPrefix,
    },
}

/// Unique identifier of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    prefix: RecordPrefix,
    ulid: Ulid,
}

impl RecordId {
    /// Generate a fresh identifier
    pub fn new(prefix: RecordPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    pub fn prefix(&self) -> RecordPrefix {
        self.prefix
    }

    pub fn ulid(&self) -> Ulid {
        self.ulid
    }

    /// Parse and require a specific prefix
    pub fn parse_with_prefix(s: &str, expected: RecordPrefix) -> Result<Self, IdParseError> {
        let id: RecordId = s.parse()?;
        if id.prefix != expected {
            return Err(IdParseError::WrongPrefix {
                expected,
                actual: id.prefix,
            });
        }
        Ok(id)
    }

    /// `PREFIX-` plus the first 8 ULID characters, for display
    pub fn short(&self) -> String {
        let ulid = self.ulid.to_string();
        format!("{}-{}", self.prefix, &ulid[..8])
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for RecordId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, ulid) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingSeparator(s.to_string()))?;
        let prefix: RecordPrefix = prefix.parse()?;
        let ulid = Ulid::from_string(ulid).map_err(|_| IdParseError::InvalidUlid(s.to_string()))?;
        Ok(Self { prefix, ulid })
    }
}

impl Serialize for RecordId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_has_prefix() {
        let id = RecordId::new(RecordPrefix::Asc);
        assert!(id.to_string().starts_with("ASC-"));
        assert_eq!(id.to_string().len(), 4 + 26);
    }

    #[test]
    fn test_parse_round_trip() {
        let id = RecordId::new(RecordPrefix::Wfl);
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "NOPREFIX".parse::<RecordId>(),
            Err(IdParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "REQ-01KCWY20F01B21V0G4E835NW3J".parse::<RecordId>(),
            Err(IdParseError::UnknownPrefix(_))
        ));
        assert!(matches!(
            "ASC-not-a-ulid".parse::<RecordId>(),
            Err(IdParseError::InvalidUlid(_))
        ));
    }

    #[test]
    fn test_parse_with_prefix() {
        let id = RecordId::new(RecordPrefix::Asc);
        assert!(RecordId::parse_with_prefix(&id.to_string(), RecordPrefix::Asc).is_ok());
        assert!(matches!(
            RecordId::parse_with_prefix(&id.to_string(), RecordPrefix::Wfl),
            Err(IdParseError::WrongPrefix { .. })
        ));
    }

    #[test]
    fn test_short() {
        let id: RecordId = "WFL-01KCWY20F01B21V0G4E835NW3J".parse().unwrap();
        assert_eq!(id.short(), "WFL-01KCWY20");
    }
}
