use crate::common::error::{Result, ScraperError};
use crate::common::types::CrawlTarget;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// Bounds on listing traversal and article collection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Listing pages followed per seed before giving up on pagination.
    pub max_pages: usize,
    /// Candidate article links taken from a single listing page.
    pub link_limit_per_page: usize,
    /// Hard cap on articles collected across all seeds.
    pub max_articles_total: usize,
    /// Politeness pause between listing-page fetches, in seconds.
    pub request_interval_secs: f64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 3,
            link_limit_per_page: 30,
            max_articles_total: 40,
            request_interval_secs: 1.0,
        }
    }
}

/// Model identity plus the pacing knobs around each extraction call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    /// Proactive pause between model calls, in addition to reactive backoff.
    pub call_interval_secs: f64,
    /// First wait after a rate-limit answer; later waits grow linearly.
    pub retry_base_wait_secs: f64,
    /// Total attempts per chunk, rate-limit retries included.
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.2,
            call_interval_secs: 2.0,
            retry_base_wait_secs: 10.0,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub url: String,
    pub label: String,
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", config_path, e))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Fatal-before-crawl checks. Everything else degrades per unit of work;
    /// a run with nothing to crawl must not start at all.
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(ScraperError::Config(
                "no crawl targets configured (targets = [] in config)".to_string(),
            ));
        }
        for target in &self.targets {
            if url::Url::parse(&target.url).is_err() {
                return Err(ScraperError::Config(format!(
                    "target '{}' has an invalid URL: {}",
                    target.label, target.url
                )));
            }
        }
        Ok(())
    }

    pub fn crawl_targets(&self) -> Vec<CrawlTarget> {
        self.targets
            .iter()
            .map(|t| CrawlTarget {
                url: t.url.clone(),
                label: t.label.clone(),
            })
            .collect()
    }
}
