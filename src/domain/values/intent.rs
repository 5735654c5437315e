use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Installation,
    #[serde(rename = "Repair/Service")]
    RepairService,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Installation => write!(f, "Installation"),
            Intent::RepairService => write!(f, "Repair/Service"),
        }
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "installation" => Ok(Intent::Installation),
            "repair/service" | "repair" | "service" => Ok(Intent::RepairService),
            _ => Err(format!("Unknown intent: {s}")),
        }
    }
}
