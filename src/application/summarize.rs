use crate::domain::entities::lead::Lead;
use crate::domain::entities::run_session::{RunSession, SourceOutcome};
use crate::domain::values::priority::{Priority, HOT_THRESHOLD, WARM_THRESHOLD};
use crate::domain::values::run_status::RunStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub target_location: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub total_leads: usize,
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
    pub by_source: Vec<SourceCount>,
    pub top_leads: Vec<Lead>,
    pub outcomes: Vec<SourceOutcome>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

impl RunSummary {
    /// `top_n` caps the highlighted leads; the session is already sorted.
    pub fn from_session(session: &RunSession, top_n: usize) -> Self {
        let mut by_source: Vec<SourceCount> = Vec::new();
        for lead in session.leads() {
            match by_source.iter_mut().find(|s| s.source == lead.source) {
                Some(entry) => entry.count += 1,
                None => by_source.push(SourceCount {
                    source: lead.source.clone(),
                    count: 1,
                }),
            }
        }
        by_source.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            run_id: session.id.clone(),
            target_location: session.target_location.clone(),
            started_at: session.started_at,
            completed_at: session.completed_at,
            status: session.status(),
            error_message: session.error_message().map(String::from),
            total_leads: session.leads().len(),
            hot: session.count_by_priority(Priority::Hot),
            warm: session.count_by_priority(Priority::Warm),
            cold: session.count_by_priority(Priority::Cold),
            by_source,
            top_leads: session.leads().iter().take(top_n).cloned().collect(),
            outcomes: session.outcomes().to_vec(),
        }
    }

    /// Human-readable Markdown report.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let date = self.started_at.format("%Y-%m-%d");
        let _ = writeln!(out, "# Solar Lead Report - {date}\n");
        let _ = writeln!(out, "Target location: **{}**  ", self.target_location);
        let _ = writeln!(out, "Run: `{}` ({})\n", self.run_id, self.status);
        if let Some(err) = &self.error_message {
            let _ = writeln!(out, "> Run error: {err}\n");
        }

        let _ = writeln!(out, "## Summary\n");
        let _ = writeln!(out, "- **Total Leads:** {}", self.total_leads);
        let _ = writeln!(out, "- **Hot Leads:** {} (Score {HOT_THRESHOLD}+)", self.hot);
        let _ = writeln!(
            out,
            "- **Warm Leads:** {} (Score {WARM_THRESHOLD}-{})",
            self.warm,
            HOT_THRESHOLD - 1
        );
        let _ = writeln!(out, "- **Cold Leads:** {} (Score <{WARM_THRESHOLD})\n", self.cold);

        let _ = writeln!(out, "## Top {} Leads\n", self.top_leads.len());
        for (i, lead) in self.top_leads.iter().enumerate() {
            let _ = writeln!(out, "### {}. {} (Score: {})", i + 1, lead.name, lead.score);
            let _ = writeln!(out, "- **Source:** {} ({})", lead.source, lead.platform);
            let _ = writeln!(out, "- **Location:** {}", lead.location);
            let _ = writeln!(out, "- **Intent:** {}", lead.intent);
            let _ = writeln!(out, "- **Message:** {}", preview(&lead.message, 200));
            if !lead.profile_url.is_empty() {
                let _ = writeln!(out, "- **Profile:** {}", lead.profile_url);
            }
            if !lead.post_url.is_empty() {
                let _ = writeln!(out, "- **Post:** {}", lead.post_url);
            }
            let _ = writeln!(out, "- **Contact:** {}", lead.contact_method);
            let _ = writeln!(out, "- **Priority:** {}\n", lead.priority);
        }

        let _ = writeln!(out, "## Lead Sources\n");
        for s in &self.by_source {
            let _ = writeln!(out, "- **{}:** {} leads", s.source, s.count);
        }

        let _ = writeln!(out, "\n## Source Outcomes\n");
        let _ = writeln!(out, "| Source | Status | Leads | Fetched | Filtered | Duplicates | Error |");
        let _ = writeln!(out, "|---|---|---|---|---|---|---|");
        for o in &self.outcomes {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} |",
                o.source,
                if o.timed_out { "timeout".to_string() } else { o.status.to_string() },
                o.count,
                o.fetched,
                o.filtered,
                o.duplicates,
                o.error_message.as_deref().unwrap_or("").replace('|', "\\|")
            );
        }
        out
    }
}

fn preview(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        message.to_string()
    } else {
        let cut: String = message.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
