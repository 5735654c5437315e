//! Run-scoped duplicate suppression.

use crate::domain::entities::lead::PartialLead;
use std::collections::HashSet;

/// Identity of a candidate for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// The same post surfaced by more than one query or source.
    PostUrl(String),
    /// The same person surfaced repeatedly by one source's search passes.
    Author { source: String, author: String },
}

/// Seen-set for one run. Never persisted across runs.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<DedupKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post URL when known; otherwise `(source, author)`. Records with no
    /// author (permit rows, form exports) fall back to their permit number,
    /// contact details, address, then message text.
    pub fn key_for(lead: &PartialLead) -> DedupKey {
        let url = canonical_url(&lead.post_url);
        if !url.is_empty() {
            return DedupKey::PostUrl(url);
        }
        let author = [
            &lead.author,
            &lead.permit_number,
            &lead.phone,
            &lead.email,
            &lead.address,
            &lead.message,
        ]
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();
        DedupKey::Author {
            source: lead.source.to_lowercase(),
            author,
        }
    }

    pub fn is_duplicate(&self, key: &DedupKey) -> bool {
        self.seen.contains(key)
    }

    pub fn add(&mut self, key: DedupKey) {
        self.seen.insert(key);
    }

    /// Returns `true` (and records the key) if the key is new.
    pub fn check_and_add(&mut self, key: DedupKey) -> bool {
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Trimmed, trailing slash and fragment removed, scheme/host lowercased.
fn canonical_url(url: &str) -> String {
    let url = url.trim();
    let url = url.split('#').next().unwrap_or(url).trim_end_matches('/');
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let (host, path) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
            let host = host.to_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host);
            format!("{}://{}{}", scheme.to_lowercase(), host, path)
        }
        None => url.to_string(),
    }
}
