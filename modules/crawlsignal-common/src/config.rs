use std::time::Duration;

/// Read a required environment variable, panicking with a descriptive message
/// if it is absent. Used only at process start, before any async runtime work
/// begins.
pub fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Run-level tuning knobs. Overridable per run via the CLI's override JSON
/// (`{ concurrency, maxDownloads, maxDepth, outputVerbosity, dbPath, dataDir,
/// plannerVerbosity }`) layered on top of these env defaults.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub database_url: String,
    pub concurrency: usize,
    pub max_downloads: Option<u64>,
    pub max_depth: Option<u32>,
    pub deadline: Option<Duration>,
    pub max_attempts: u32,
    pub max_body_bytes: usize,
    pub host_min_delay: Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub min_article_words: usize,
    pub min_nav_article_links: usize,
    pub min_xpath_text: usize,
    pub min_word_count_for_fingerprint: usize,
    pub cross_domain: bool,
}

impl CrawlConfig {
    /// Load from the process environment. `DATABASE_URL` is required; every
    /// other knob has a sensible default matching spec defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            concurrency: env_parse_or("CRAWL_CONCURRENCY", 2),
            max_downloads: std::env::var("CRAWL_MAX_DOWNLOADS").ok().and_then(|v| v.parse().ok()),
            max_depth: std::env::var("CRAWL_MAX_DEPTH").ok().and_then(|v| v.parse().ok()),
            deadline: std::env::var("CRAWL_DEADLINE_SECS").ok().and_then(|v| v.parse().ok()).map(Duration::from_secs),
            max_attempts: env_parse_or("CRAWL_MAX_ATTEMPTS", 3),
            max_body_bytes: env_parse_or("CRAWL_MAX_BODY_BYTES", 10 * 1024 * 1024),
            host_min_delay: Duration::from_millis(env_parse_or("CRAWL_HOST_MIN_DELAY_MS", 1000)),
            request_timeout: Duration::from_millis(env_parse_or("CRAWL_REQUEST_TIMEOUT_MS", 15_000)),
            connect_timeout: Duration::from_millis(env_parse_or("CRAWL_CONNECT_TIMEOUT_MS", 5_000)),
            min_article_words: env_parse_or("CRAWL_MIN_ARTICLE_WORDS", 300),
            min_nav_article_links: env_parse_or("CRAWL_MIN_NAV_ARTICLE_LINKS", 20),
            min_xpath_text: env_parse_or("CRAWL_MIN_XPATH_TEXT", 200),
            min_word_count_for_fingerprint: env_parse_or("CRAWL_MIN_WORD_COUNT", 50),
            cross_domain: env_parse_or("CRAWL_CROSS_DOMAIN", false),
        }
    }

    /// Log every field except secrets. `database_url` is logged only as a
    /// character count, never in full — the same discipline this workspace
    /// applies to its API keys elsewhere.
    pub fn log_redacted(&self) {
        tracing::info!(
            database_url_len = self.database_url.len(),
            concurrency = self.concurrency,
            max_downloads = ?self.max_downloads,
            max_depth = ?self.max_depth,
            max_attempts = self.max_attempts,
            host_min_delay_ms = self.host_min_delay.as_millis() as u64,
            min_article_words = self.min_article_words,
            "loaded crawl configuration"
        );
    }

    pub fn daemon_bind_addr(&self) -> String {
        env_or("CRAWL_DAEMON_BIND", "0.0.0.0:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_or_falls_back_on_missing() {
        std::env::remove_var("CRAWL_TEST_KEY_ABC");
        assert_eq!(env_parse_or::<usize>("CRAWL_TEST_KEY_ABC", 7), 7);
    }

    #[test]
    fn env_parse_or_uses_set_value() {
        std::env::set_var("CRAWL_TEST_KEY_XYZ", "42");
        assert_eq!(env_parse_or::<usize>("CRAWL_TEST_KEY_XYZ", 7), 42);
        std::env::remove_var("CRAWL_TEST_KEY_XYZ");
    }
}
