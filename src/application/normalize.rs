//! Record normalization: raw collector output into [`PartialLead`].
//!
//! Every canonical field is resolved independently, falling back to a fixed
//! default when the raw record does not carry it. The only failure is a raw
//! record that is not a JSON object.

use crate::domain::entities::lead::{PartialLead, ANONYMOUS, MAX_MESSAGE_CHARS};
use crate::domain::error::DomainError;
use crate::domain::values::raw_candidate::RawCandidate;
use crate::domain::values::source_kind::SourceKind;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\d{3}\)\s*\d{3}[-.\s]?\d{4}|\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b")
        .expect("valid phone regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

static CITY_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([A-Z][a-z]+(?: [A-Z][a-z]+)*),\s*(A[KLRZ]|C[AOT]|D[CE]|FL|GA|HI|I[ADLN]|K[SY]|LA|M[ADEINOST]|N[CDEHJMVY]|O[HKR]|PA|RI|S[CD]|T[NX]|UT|V[AT]|W[AIVY]|Alabama|Florida|Georgia|Tennessee|South Carolina|North Carolina|Texas|California|Arizona)\b",
    )
    .expect("valid city/state regex")
});

const AUTHOR_KEYS: &[&str] = &["author", "username", "user", "handle"];
const NAME_KEYS: &[&str] = &["name", "displayName", "display_name"];
const TITLE_KEYS: &[&str] = &["title", "question"];
const BODY_KEYS: &[&str] = &["message", "text", "body", "selftext", "content", "snippet", "description"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "createdAt", "created_at", "postedAt", "date"];
const EPOCH_KEYS: &[&str] = &["createdUtc", "created_utc", "epoch"];

/// Normalizes raw records from one collector.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    source: String,
    kind: SourceKind,
}

impl RecordNormalizer {
    pub fn new(source: &str, kind: SourceKind) -> Self {
        Self {
            source: source.trim().to_string(),
            kind,
        }
    }

    /// Resolve `raw` into a [`PartialLead`].
    ///
    /// `now` stands in for the post time when the record carries none, so
    /// the result is a pure function of its inputs.
    pub fn normalize(
        &self,
        raw: &RawCandidate,
        run_location: &str,
        now: DateTime<Utc>,
    ) -> Result<PartialLead, DomainError> {
        if !raw.value().is_object() {
            return Err(DomainError::InvalidRecord(format!(
                "{} produced a non-object record: {}",
                self.source,
                json_kind(raw)
            )));
        }

        let source = if self.source.is_empty() {
            raw.text(&["source"]).unwrap_or_else(|| "Unknown".to_string())
        } else {
            self.source.clone()
        };

        let full_text = compose_text(raw);
        let phone = raw
            .text(&["phone"])
            .filter(|p| PHONE_RE.is_match(p))
            .or_else(|| PHONE_RE.find(&full_text).map(|m| m.as_str().to_string()))
            .unwrap_or_default();
        let email = raw
            .text(&["email"])
            .filter(|e| EMAIL_RE.is_match(e))
            .or_else(|| EMAIL_RE.find(&full_text).map(|m| m.as_str().to_string()))
            .unwrap_or_default();

        let author = raw.text(AUTHOR_KEYS).unwrap_or_default();
        let name = raw
            .text(NAME_KEYS)
            .or_else(|| (!author.is_empty()).then(|| author.clone()))
            .or_else(|| (!phone.is_empty()).then(|| phone.clone()))
            .or_else(|| (!email.is_empty()).then(|| email.clone()))
            .unwrap_or_else(|| ANONYMOUS.to_string());

        let location = raw
            .text(&["location", "city"])
            .or_else(|| extract_location(&full_text))
            .unwrap_or_else(|| run_location.trim().to_string());

        let contact_method = if !phone.is_empty() {
            "Phone".to_string()
        } else if !email.is_empty() {
            "Email".to_string()
        } else {
            raw.text(&["contactFallback", "contact_fallback"])
                .unwrap_or_else(|| fallback_contact(&source))
        };

        Ok(PartialLead {
            platform: raw.text(&["platform", "subreddit"]).unwrap_or_else(|| source.clone()),
            source,
            source_kind: self.kind,
            name,
            author,
            location,
            message: truncate_chars(&full_text, MAX_MESSAGE_CHARS),
            profile_url: raw.text(&["profileUrl", "profile_url"]).unwrap_or_default(),
            post_url: raw
                .text(&["postUrl", "post_url", "url", "link"])
                .unwrap_or_default(),
            timestamp: resolve_timestamp(raw).unwrap_or(now),
            phone,
            email,
            contact_method,
            address: raw.text(&["address"]).unwrap_or_default(),
            system_size: raw.text(&["systemSize", "system_size"]).unwrap_or_default(),
            permit_number: raw.text(&["permitNumber", "permit_number"]).unwrap_or_default(),
        })
    }
}

/// Title and body joined, whitespace collapsed.
fn compose_text(raw: &RawCandidate) -> String {
    let title = raw.text(TITLE_KEYS);
    let body = raw.text(BODY_KEYS);
    let joined = match (title, body) {
        (Some(t), Some(b)) if t != b => format!("{t} {b}"),
        (Some(t), _) => t,
        (None, Some(b)) => b,
        (None, None) => String::new(),
    };
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn extract_location(text: &str) -> Option<String> {
    CITY_STATE_RE
        .captures(text)
        .map(|c| format!("{}, {}", &c[1], &c[2]))
}

fn fallback_contact(source: &str) -> String {
    if source.eq_ignore_ascii_case("reddit") {
        "Reddit DM".to_string()
    } else {
        format!("{source} message")
    }
}

fn resolve_timestamp(raw: &RawCandidate) -> Option<DateTime<Utc>> {
    if let Some(s) = raw.text(TIMESTAMP_KEYS) {
        if let Some(ts) = parse_timestamp(&s) {
            return Some(ts);
        }
    }
    let epoch = raw.number(EPOCH_KEYS)?;
    // Millisecond epochs are 13 digits; seconds are 10.
    let secs = if epoch > 1e12 { epoch / 1000.0 } else { epoch };
    Utc.timestamp_opt(secs as i64, 0).single()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

fn json_kind(raw: &RawCandidate) -> &'static str {
    match raw.value() {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
