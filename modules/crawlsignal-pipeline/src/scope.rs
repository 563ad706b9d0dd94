//! Robots.txt scope predicate. Fetched once per host and cached; the
//! frontier itself holds no robots-parsing logic, only the caller-supplied
//! `allowed` decision this module produces.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;

const USER_AGENT: &str = "crawlsignal";

#[derive(Debug, Clone, Default)]
struct RobotsRules {
    disallow: Vec<String>,
}

impl RobotsRules {
    fn parse(body: &str) -> Self {
        let mut disallow = Vec::new();
        let mut pending_agents: Vec<String> = Vec::new();
        let mut group_open = false;
        let mut group_applies = false;

        for raw_line in body.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else { continue };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if group_open {
                        // A new User-agent line after rules closes the previous group.
                        pending_agents.clear();
                        group_open = false;
                    }
                    pending_agents.push(value.to_lowercase());
                }
                "disallow" => {
                    if !group_open {
                        group_applies = pending_agents.iter().any(|a| a == "*" || a == USER_AGENT);
                        group_open = true;
                    }
                    if group_applies && !value.is_empty() {
                        disallow.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        RobotsRules { disallow }
    }

    fn allows(&self, path: &str) -> bool {
        !self.disallow.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Per-host robots.txt cache, shared read-mostly across workers.
#[derive(Clone)]
pub struct RobotsCache {
    client: Client,
    rules: Arc<RwLock<HashMap<String, RobotsRules>>>,
}

impl RobotsCache {
    pub fn new(client: Client) -> Self {
        RobotsCache { client, rules: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Returns whether `url` may be fetched, fetching and caching the host's
    /// `robots.txt` on first reference. A fetch failure (network error,
    /// non-2xx) is treated as "no restrictions" rather than blocking the job.
    pub async fn allowed(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else { return false };
        let Some(host) = parsed.host_str() else { return false };
        let host = host.to_string();

        if let Some(rules) = self.rules.read().await.get(&host) {
            return rules.allows(parsed.path());
        }

        let robots_url = format!("{}://{}/robots.txt", parsed.scheme(), host);
        let rules = match self.client.get(&robots_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body = resp.text().await.unwrap_or_default();
                RobotsRules::parse(&body)
            }
            Ok(resp) => {
                debug!(host = %host, status = %resp.status(), "robots.txt not available, allowing by default");
                RobotsRules::default()
            }
            Err(err) => {
                debug!(host = %host, error = %err, "robots.txt fetch failed, allowing by default");
                RobotsRules::default()
            }
        };

        let allowed = rules.allows(parsed.path());
        self.rules.write().await.insert(host, rules);
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_disallow_blocks_matching_prefix() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow: /private\n");
        assert!(!rules.allows("/private/page"));
        assert!(rules.allows("/public"));
    }

    #[test]
    fn empty_robots_allows_everything() {
        let rules = RobotsRules::parse("");
        assert!(rules.allows("/anything"));
    }

    #[test]
    fn named_agent_group_is_honoured() {
        let rules = RobotsRules::parse("User-agent: crawlsignal\nDisallow: /no-bots\n");
        assert!(!rules.allows("/no-bots/x"));
    }
}
