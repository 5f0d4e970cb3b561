use std::path::PathBuf;

use vel_storage::DEFAULT_USER_AGENTS;

pub const DEFAULT_TARGETS_FILE: &str = "targets.yaml";
pub const DEFAULT_SCRAPE_CRON: &str = "0 0 */6 * * *";
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub database_url: Option<String>,
    pub targets_file: PathBuf,
    pub scheduler_enabled: bool,
    pub scrape_cron: String,
    pub user_agents: Vec<String>,
    pub http_timeout_secs: u64,
    pub match_threshold: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            database_url: non_blank("DATABASE_URL"),
            targets_file: non_blank("VELOCITY_TARGETS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGETS_FILE)),
            scheduler_enabled: non_blank("VELOCITY_SCHEDULER_ENABLED")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            scrape_cron: non_blank("VELOCITY_SCRAPE_CRON")
                .unwrap_or_else(|| DEFAULT_SCRAPE_CRON.to_string()),
            user_agents: non_blank("VELOCITY_USER_AGENTS")
                .map(|v| {
                    v.split('|')
                        .map(|ua| ua.trim().to_string())
                        .filter(|ua| !ua.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| DEFAULT_USER_AGENTS.iter().map(ToString::to_string).collect()),
            http_timeout_secs: non_blank("VELOCITY_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            match_threshold: non_blank("VELOCITY_MATCH_THRESHOLD")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|t| (0.0..=1.0).contains(t))
                .unwrap_or(DEFAULT_MATCH_THRESHOLD),
        }
    }
}
