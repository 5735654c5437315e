use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reliability class of a collector. Determines invocation order and
/// whether records bypass the text heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// County building-permit databases: the owner is already installing.
    Permit,
    /// Rebate/incentive program applicant lists.
    Incentive,
    /// AI-backed web search.
    WebSearch,
    /// Social platforms and forums.
    Social,
}

impl SourceKind {
    /// Invocation rank, lowest first.
    pub fn rank(&self) -> u8 {
        match self {
            SourceKind::Permit => 0,
            SourceKind::Incentive => 1,
            SourceKind::WebSearch => 2,
            SourceKind::Social => 3,
        }
    }

    /// Records from these sources describe installations in progress.
    pub fn is_verified_installation(&self) -> bool {
        matches!(self, SourceKind::Permit | SourceKind::Incentive)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Permit => write!(f, "permit"),
            SourceKind::Incentive => write!(f, "incentive"),
            SourceKind::WebSearch => write!(f, "websearch"),
            SourceKind::Social => write!(f, "social"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permit" | "permits" => Ok(SourceKind::Permit),
            "incentive" | "incentives" => Ok(SourceKind::Incentive),
            "websearch" | "web-search" | "web" => Ok(SourceKind::WebSearch),
            "social" => Ok(SourceKind::Social),
            _ => Err(format!("Unknown source kind: {s}")),
        }
    }
}
