use crate::domain::values::priority::Priority;
use serde::Serialize;

/// Points awarded to a lead together with the tier they map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub points: u32,
    pub priority: Priority,
}

impl Score {
    pub fn new(points: u32) -> Self {
        Self {
            points,
            priority: Priority::from_score(points),
        }
    }
}
