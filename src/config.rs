use crate::domain::error::DomainError;
use std::path::PathBuf;
use std::time::Duration;

/// Where the run lock lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockBackend {
    File,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_url: String,
    pub api_key: String,
    pub resume_session: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_location: String,
    pub lock_stale_after: chrono::Duration,
    pub source_timeout: Duration,
    pub output_dir: PathBuf,
    pub csv_prefix: String,
    pub db_path: PathBuf,
    pub lock_backend: LockBackend,
    pub lock_path: PathBuf,
    pub report_top_n: usize,
    /// Present only when both the URL and the API key are set.
    pub dashboard: Option<DashboardConfig>,
    pub reddit_query_delay: Duration,
}

/// Load configuration from the environment, reading `.env` first if present.
pub fn load_app_config() -> Result<AppConfig, DomainError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Build configuration from an arbitrary variable lookup.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, DomainError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| DomainError::Config(format!("{var}: {reason}"));

    let parse_u64 = |var: &str, default: &str| -> Result<u64, DomainError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let lock_stale_secs = parse_u64("SOLARLEADS_LOCK_STALE_SECS", "600")?;
    if lock_stale_secs == 0 {
        return Err(invalid("SOLARLEADS_LOCK_STALE_SECS", "must be positive".into()));
    }
    let lock_stale_after = chrono::Duration::try_seconds(lock_stale_secs as i64)
        .ok_or_else(|| invalid("SOLARLEADS_LOCK_STALE_SECS", "out of range".into()))?;

    let source_timeout_secs = parse_u64("SOLARLEADS_SOURCE_TIMEOUT_SECS", "45")?;
    if source_timeout_secs == 0 {
        return Err(invalid("SOLARLEADS_SOURCE_TIMEOUT_SECS", "must be positive".into()));
    }

    let output_dir = PathBuf::from(or_default("SOLARLEADS_OUTPUT_DIR", "output"));
    let lock_backend = match or_default("SOLARLEADS_LOCK_BACKEND", "file").to_lowercase().as_str() {
        "file" => LockBackend::File,
        "sqlite" => LockBackend::Sqlite,
        other => {
            return Err(invalid(
                "SOLARLEADS_LOCK_BACKEND",
                format!("expected 'file' or 'sqlite', got '{other}'"),
            ))
        }
    };
    let lock_path = lookup("SOLARLEADS_LOCK_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| output_dir.join(".run-lock.json"));

    let report_top_n = parse_u64("SOLARLEADS_REPORT_TOP_N", "5")? as usize;
    let reddit_delay_ms = parse_u64("SOLARLEADS_REDDIT_DELAY_MS", "5000")?;

    let api_url = lookup("DASHBOARD_API_URL").ok().filter(|v| !v.trim().is_empty());
    let api_key = lookup("SCRAPER_API_KEY").ok().filter(|v| !v.trim().is_empty());
    let dashboard = match (api_url, api_key) {
        (Some(api_url), Some(api_key)) => {
            let resume_session = match lookup("SCRAPING_SESSION_ID").ok().filter(|v| !v.trim().is_empty()) {
                Some(raw) => Some(
                    raw.trim()
                        .parse::<i64>()
                        .map_err(|e| invalid("SCRAPING_SESSION_ID", e.to_string()))?,
                ),
                None => None,
            };
            Some(DashboardConfig {
                api_url,
                api_key,
                resume_session,
            })
        }
        _ => None,
    };

    Ok(AppConfig {
        default_location: or_default("SOLARLEADS_DEFAULT_LOCATION", "Georgia"),
        lock_stale_after,
        source_timeout: Duration::from_secs(source_timeout_secs),
        output_dir,
        csv_prefix: or_default("SOLARLEADS_CSV_PREFIX", "solar-leads"),
        db_path: PathBuf::from(or_default("SOLARLEADS_DB", "./solarleads.db")),
        lock_backend,
        lock_path,
        report_top_n,
        dashboard,
        reddit_query_delay: Duration::from_millis(reddit_delay_ms),
    })
}
