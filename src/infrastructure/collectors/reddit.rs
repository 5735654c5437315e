use crate::domain::ports::source_collector::{CollectorError, SourceCollector};
use crate::domain::values::raw_candidate::RawCandidate;
use crate::domain::values::source_kind::SourceKind;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
/// Retries after a 429; waits are backoff_base * 1, 2, 4.
const MAX_RETRIES: u32 = 3;

/// Reddit public search. Emits one raw record per post; all filtering
/// happens downstream.
pub struct RedditCollector {
    base_url: String,
    query_delay: Duration,
    backoff_base: Duration,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, serde::Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, serde::Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, serde::Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    created_utc: Option<f64>,
}

impl RedditCollector {
    pub fn new(query_delay: Duration) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, query_delay, Duration::from_secs(2))
    }

    /// Point at another host (a mock server in tests). `backoff_base` is the
    /// first 429 wait; it doubles on each retry.
    pub fn with_base_url(base_url: &str, query_delay: Duration, backoff_base: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            query_delay,
            backoff_base,
            client: reqwest::Client::builder()
                .user_agent("SolarLeadAutomation/1.0")
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn queries(location: &str) -> Vec<String> {
        vec![
            format!("(installer OR repair OR \"not working\" OR broken) {location} subreddit:solar"),
            format!("(installer OR repair OR \"not working\" OR broken) {location} subreddit:SolarDIY"),
            format!("\"solar not working\" {location}"),
            format!("\"solar panel broken\" {location}"),
        ]
    }

    async fn search(&self, query: &str) -> Result<Vec<RawCandidate>, CollectorError> {
        let url = format!("{}/search.json", self.base_url);
        let mut attempt = 0;
        let resp = loop {
            let resp = self
                .client
                .get(&url)
                .query(&[("q", query), ("sort", "new"), ("limit", "25"), ("t", "month")])
                .send()
                .await
                .map_err(|e| CollectorError::Network(e.to_string()))?;

            if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RETRIES {
                let wait = self.backoff_base * 2u32.pow(attempt);
                warn!(wait_ms = wait.as_millis() as u64, "reddit rate limited, backing off");
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }
            break resp;
        };

        if !resp.status().is_success() {
            return Err(CollectorError::Network(format!("reddit returned {}", resp.status())));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| CollectorError::Network(e.to_string()))?;
        parse_listing(&body)
    }
}

/// Turn a search listing into raw records. Deleted authors are dropped.
fn parse_listing(body: &str) -> Result<Vec<RawCandidate>, CollectorError> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| CollectorError::Parse(e.to_string()))?;

    Ok(listing
        .data
        .children
        .into_iter()
        .map(|c| c.data)
        .filter(|p| !p.author.is_empty() && p.author != "[deleted]")
        .map(|p| {
            let mut raw = json!({
                "source": "Reddit",
                "platform": format!("r/{}", p.subreddit),
                "author": p.author,
                "title": p.title,
                "selftext": p.selftext,
                "postUrl": format!("https://reddit.com{}", p.permalink),
                "profileUrl": format!("https://reddit.com/user/{}", p.author),
                "contactFallback": "Reddit DM",
            });
            if let Some(created) = p.created_utc {
                raw["created_utc"] = json!(created);
            }
            RawCandidate::new(raw)
        })
        .collect())
}

#[async_trait]
impl SourceCollector for RedditCollector {
    fn name(&self) -> &str {
        "Reddit"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }

    async fn collect(&self, location: &str) -> Result<Vec<RawCandidate>, CollectorError> {
        let queries = Self::queries(location);
        let mut records = Vec::new();
        let mut failures = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            if i > 0 && !self.query_delay.is_zero() {
                tokio::time::sleep(self.query_delay).await;
            }
            match self.search(query).await {
                Ok(batch) => {
                    debug!(query = %query, count = batch.len(), "reddit query done");
                    records.extend(batch);
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "reddit query failed");
                    failures.push(e.to_string());
                }
            }
        }

        if failures.len() == queries.len() {
            return Err(CollectorError::Network(format!(
                "all {} reddit queries failed: {}",
                queries.len(),
                failures.join("; ")
            )));
        }
        info!(count = records.len(), "reddit collection complete");
        Ok(records)
    }
}
