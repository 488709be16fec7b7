use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Physical condition grade of a tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Good,
    Fair,
    Poor,
}

impl Condition {
    /// Canonical display form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = TypeError;

    /// Case-insensitive parse, so operator input like `"good"` or `"GOOD"`
    /// is accepted at the boundary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "fair" => Ok(Self::Fair),
            "poor" => Ok(Self::Poor),
            _ => Err(TypeError::InvalidCondition(s.to_string())),
        }
    }
}

/// Availability status of a tool, derived from its quantity fields.
///
/// Never persisted: a tool is `Available` exactly when at least one unit is
/// on the shelf, so the status is recomputed on every read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolStatus {
    Available,
    Unavailable,
}

impl ToolStatus {
    /// Derive status from an available-unit count.
    pub fn from_available(available: u32) -> Self {
        if available > 0 {
            Self::Available
        } else {
            Self::Unavailable
        }
    }

    /// Canonical display form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Unavailable => "Unavailable",
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("good".parse::<Condition>().unwrap(), Condition::Good);
        assert_eq!("GOOD".parse::<Condition>().unwrap(), Condition::Good);
        assert_eq!(" Fair ".parse::<Condition>().unwrap(), Condition::Fair);
        assert_eq!("poor".parse::<Condition>().unwrap(), Condition::Poor);
    }

    #[test]
    fn parse_rejects_unknown_grades() {
        let err = "excellent".parse::<Condition>().unwrap_err();
        assert_eq!(err, TypeError::InvalidCondition("excellent".into()));
    }

    #[test]
    fn display_uses_canonical_casing() {
        assert_eq!(Condition::Good.to_string(), "Good");
        assert_eq!(Condition::Fair.to_string(), "Fair");
        assert_eq!(Condition::Poor.to_string(), "Poor");
    }

    #[test]
    fn status_threshold_is_one_unit() {
        assert_eq!(ToolStatus::from_available(0), ToolStatus::Unavailable);
        assert_eq!(ToolStatus::from_available(1), ToolStatus::Available);
        assert_eq!(ToolStatus::from_available(500), ToolStatus::Available);
    }

    #[test]
    fn serde_roundtrip() {
        let json = serde_json::to_string(&Condition::Fair).unwrap();
        let parsed: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Condition::Fair);

        let json = serde_json::to_string(&ToolStatus::Unavailable).unwrap();
        let parsed: ToolStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ToolStatus::Unavailable);
    }
}
