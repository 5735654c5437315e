use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Score at or above which a lead is `Hot`.
pub const HOT_THRESHOLD: u32 = 50;
/// Score at or above which a lead is at least `Warm`.
pub const WARM_THRESHOLD: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Cold,
    Warm,
    Hot,
}

impl Priority {
    /// Thresholds are evaluated on the unclamped score.
    pub fn from_score(score: u32) -> Self {
        if score >= HOT_THRESHOLD {
            Priority::Hot
        } else if score >= WARM_THRESHOLD {
            Priority::Warm
        } else {
            Priority::Cold
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Hot => write!(f, "Hot"),
            Priority::Warm => write!(f, "Warm"),
            Priority::Cold => write!(f, "Cold"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hot" => Ok(Priority::Hot),
            "warm" => Ok(Priority::Warm),
            "cold" => Ok(Priority::Cold),
            _ => Err(format!("Unknown priority: {s}")),
        }
    }
}
