use crate::domain::values::intent::Intent;
use serde::Serialize;

/// Verdict of the intent classifier for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub matches: bool,
    pub intent: Option<Intent>,
    pub is_promotional: bool,
}

impl Classification {
    pub fn rejected() -> Self {
        Self {
            matches: false,
            intent: None,
            is_promotional: false,
        }
    }

    pub fn promotional() -> Self {
        Self {
            matches: false,
            intent: None,
            is_promotional: true,
        }
    }

    pub fn matched(intent: Intent) -> Self {
        Self {
            matches: true,
            intent: Some(intent),
            is_promotional: false,
        }
    }

    /// The accepted intent, if the text passed every filter.
    pub fn accepted_intent(&self) -> Option<Intent> {
        if self.matches && !self.is_promotional {
            self.intent
        } else {
            None
        }
    }
}
