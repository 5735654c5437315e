//! Additive lead scoring.
//!
//! Every signal that fires adds its points; there is no early return and no
//! clamp. Priority is read off the unclamped total.

use crate::domain::entities::lead::PartialLead;
use crate::domain::values::classification::Classification;
use crate::domain::values::score::Score;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;

pub const REPAIR_CRITICAL_POINTS: u32 = 40;
pub const REPAIR_SERVICE_POINTS: u32 = 35;
pub const FAULT_POINTS: u32 = 30;
pub const QUOTE_POINTS: u32 = 30;
pub const NEED_POINTS: u32 = 25;
pub const URGENCY_POINTS: u32 = 15;
pub const RECOMMENDATION_POINTS: u32 = 10;
pub const RECENT_DAY_POINTS: u32 = 20;
pub const RECENT_WEEK_POINTS: u32 = 10;
pub const RECENT_MONTH_POINTS: u32 = 5;
pub const PHONE_POINTS: u32 = 20;
pub const EMAIL_POINTS: u32 = 20;
/// Permit and incentive records: the owner is already mid-installation.
pub const RELIABLE_SOURCE_POINTS: u32 = 90;

struct KeywordSignal {
    pattern: LazyLock<Regex>,
    points: u32,
}

macro_rules! signal {
    ($re:expr, $points:expr) => {
        KeywordSignal {
            pattern: LazyLock::new(|| Regex::new($re).expect("valid scoring regex")),
            points: $points,
        }
    };
}

static KEYWORD_SIGNALS: [KeywordSignal; 7] = [
    signal!(r"(?i)not working|broken|stopped|\bdead\b|\bfailed|no power", REPAIR_CRITICAL_POINTS),
    signal!(r"(?i)\brepair|\bfix|troubleshoot|\bservice", REPAIR_SERVICE_POINTS),
    signal!(r"(?i)\berrors?\b|\bfault", FAULT_POINTS),
    signal!(r"(?i)\bquotes?\b|\bestimate|\bcost|\bprice|how much", QUOTE_POINTS),
    signal!(r"(?i)\bneed|looking for|\bhire", NEED_POINTS),
    signal!(r"(?i)\burgent|\basap\b|immediately", URGENCY_POINTS),
    signal!(r"(?i)\brecommend", RECOMMENDATION_POINTS),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score a classified record. Records the classifier rejected score 0.
    pub fn score(&self, lead: &PartialLead, classification: &Classification, now: DateTime<Utc>) -> Score {
        if classification.accepted_intent().is_none() {
            return Score::new(0);
        }

        let mut points: u32 = KEYWORD_SIGNALS
            .iter()
            .filter(|s| s.pattern.is_match(&lead.message))
            .map(|s| s.points)
            .sum();

        points += recency_points(now - lead.timestamp);

        if lead.has_phone() {
            points += PHONE_POINTS;
        }
        if lead.has_email() {
            points += EMAIL_POINTS;
        }
        if lead.source_kind.is_verified_installation() {
            points += RELIABLE_SOURCE_POINTS;
        }

        Score::new(points)
    }
}

/// Future-dated posts count as fresh.
fn recency_points(age: Duration) -> u32 {
    if age < Duration::hours(24) {
        RECENT_DAY_POINTS
    } else if age < Duration::days(7) {
        RECENT_WEEK_POINTS
    } else if age < Duration::days(30) {
        RECENT_MONTH_POINTS
    } else {
        0
    }
}
