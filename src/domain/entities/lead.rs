use crate::domain::values::intent::Intent;
use crate::domain::values::priority::Priority;
use crate::domain::values::score::Score;
use crate::domain::values::source_kind::SourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of `message`, in characters.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Placeholder display name when nothing identifies the person.
pub const ANONYMOUS: &str = "Anonymous";

/// A normalized record that has not been classified or scored yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialLead {
    pub source: String,
    pub source_kind: SourceKind,
    pub platform: String,
    pub name: String,
    /// Raw author handle, used for dedup when no post URL exists.
    pub author: String,
    pub location: String,
    pub message: String,
    pub profile_url: String,
    pub post_url: String,
    pub timestamp: DateTime<Utc>,
    pub phone: String,
    pub email: String,
    pub contact_method: String,
    pub address: String,
    pub system_size: String,
    pub permit_number: String,
}

impl PartialLead {
    pub fn has_phone(&self) -> bool {
        !self.phone.is_empty()
    }

    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
    }

    /// Seal the record. Priority is derived from the score, never passed in.
    pub fn into_lead(self, intent: Intent, score: Score) -> Lead {
        Lead {
            source: self.source,
            source_kind: self.source_kind,
            platform: self.platform,
            name: self.name,
            author: self.author,
            location: self.location,
            message: self.message,
            profile_url: self.profile_url,
            post_url: self.post_url,
            timestamp: self.timestamp,
            score: score.points,
            priority: Priority::from_score(score.points),
            intent,
            phone: self.phone,
            email: self.email,
            contact_method: self.contact_method,
            address: self.address,
            system_size: self.system_size,
            permit_number: self.permit_number,
        }
    }
}

/// A classified, scored lead. Immutable once appended to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub source: String,
    pub source_kind: SourceKind,
    pub platform: String,
    pub name: String,
    #[serde(default)]
    pub author: String,
    pub location: String,
    pub message: String,
    pub profile_url: String,
    pub post_url: String,
    pub timestamp: DateTime<Utc>,
    pub score: u32,
    pub priority: Priority,
    pub intent: Intent,
    pub phone: String,
    pub email: String,
    pub contact_method: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub system_size: String,
    #[serde(default)]
    pub permit_number: String,
}
