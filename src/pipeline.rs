use crate::common::constants::{CHUNK_OVERLAP, CHUNK_SIZE, MIN_ARTICLE_CHARS, MIN_CHUNK_CHARS};
use crate::common::error::Result;
use crate::common::types::{ArticleRef, EventRecord, RunCounters};
use crate::config::Config;
use crate::crawler::crawl_listing;
use crate::chunk::chunk_text;
use crate::dedupe::{Deduplicator, ExistingFingerprintSet, Verdict};
use crate::fetch::PageFetcher;
use crate::html::extract_main_text;
use crate::llm::parse::safe_json_parse;
use crate::llm::retry::{extract_with_retry, RetryPolicy};
use crate::llm::ExtractClient;
use crate::metadata::{extract_location, extract_release_date, StructuredLocation};
use crate::normalize::normalize_date;
use crate::rules::rule_for;
use metrics::{counter, histogram};
use scraper::Html;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Everything one article page contributes before the model sees it.
struct ArticleAnalysis {
    release_date: String,
    location: StructuredLocation,
    text: String,
}

/// Result of a complete pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    /// Accepted records, in processing order.
    pub records: Vec<EventRecord>,
    pub counters: RunCounters,
    /// Why a run ended with zero accepted records, when it did.
    pub outcome_hint: Option<String>,
}

pub struct Pipeline<'a> {
    fetcher: &'a dyn PageFetcher,
    extractor: &'a dyn ExtractClient,
    config: &'a Config,
}

/// Parsing happens in one synchronous pass so the DOM never lives across an
/// await point.
fn analyze_article(body: &str, url: &Url) -> ArticleAnalysis {
    let document = Html::parse_document(body);
    let release_date = extract_release_date(&document);
    let location = extract_location(&document);
    drop(document);
    let text = extract_main_text(body, rule_for(url));
    ArticleAnalysis {
        release_date,
        location,
        text,
    }
}

/// Structured data is higher-trust than model guesswork: a non-empty
/// structured field overrides the model's value, an empty one never erases
/// it.
fn merge_metadata(record: &mut EventRecord, analysis: &ArticleAnalysis, article: &ArticleRef) {
    if !analysis.release_date.is_empty() {
        record.release_date = analysis.release_date.clone();
    }
    if !analysis.location.address.is_empty() {
        record.address = analysis.location.address.clone();
    }
    if !analysis.location.latitude.is_empty() {
        record.latitude = analysis.location.latitude.clone();
    }
    if !analysis.location.longitude.is_empty() {
        record.longitude = analysis.location.longitude.clone();
    }
    record.date_info = normalize_date(&record.date_info);
    record.source_label = article.source_label.clone();
    record.source_url = article.url.clone();
}

impl<'a> Pipeline<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        extractor: &'a dyn ExtractClient,
        config: &'a Config,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            config,
        }
    }

    /// Runs crawl → extract → dedupe to completion.
    ///
    /// Only configuration problems abort the run; every other failure is
    /// counted, logged and skipped so the run always finishes with counters
    /// the operator can judge completeness by.
    #[instrument(skip_all)]
    pub async fn run(&self, existing: ExistingFingerprintSet) -> Result<PipelineResult> {
        self.config.validate()?;
        counter!("trend_pipeline_runs_total").increment(1);
        let run_started = std::time::Instant::now();

        // Step 1: listing traversal.
        let targets = self.config.crawl_targets();
        info!(targets = targets.len(), "🚀 starting crawl");
        let mut visited_listings = HashSet::new();
        let mut seen_articles = HashSet::new();
        let mut articles: Vec<ArticleRef> = Vec::new();
        let mut listing_pages_fetched = 0usize;

        for target in &targets {
            listing_pages_fetched += crawl_listing(
                self.fetcher,
                target,
                &self.config.crawl,
                &mut visited_listings,
                &mut seen_articles,
                &mut articles,
            )
            .await;
            if articles.len() >= self.config.crawl.max_articles_total {
                break;
            }
        }
        info!(articles = articles.len(), pages = listing_pages_fetched, "📡 crawl finished");
        histogram!("trend_articles_discovered").record(articles.len() as f64);

        // Step 2: per-article extraction, in discovery order.
        let today = chrono::Local::now().date_naive();
        let retry_policy = RetryPolicy::new(
            self.config.llm.max_attempts,
            self.config.llm.retry_base_wait_secs,
        );
        let llm_pause = Duration::from_secs_f64(self.config.llm.call_interval_secs);
        let mut counters = RunCounters::default();
        let mut dedup = Deduplicator::new(existing);

        for article in &articles {
            counters.articles_seen += 1;
            let Ok(article_url) = Url::parse(&article.url) else {
                counters.fetch_failures += 1;
                continue;
            };
            let Some(body) = self.fetcher.fetch(&article.url).await else {
                counters.fetch_failures += 1;
                counter!("trend_fetch_failures_total").increment(1);
                continue;
            };

            let analysis = analyze_article(&body, &article_url);
            if analysis.text.chars().count() < MIN_ARTICLE_CHARS {
                debug!(url = %article.url, "article text too short, skipping extraction");
                counters.articles_skipped_short += 1;
                continue;
            }

            for chunk in chunk_text(&analysis.text, CHUNK_SIZE, CHUNK_OVERLAP) {
                if chunk.chars().count() < MIN_CHUNK_CHARS {
                    continue;
                }
                let raw =
                    extract_with_retry(self.extractor, &chunk, today, &retry_policy).await;
                match raw {
                    None => {
                        counters.llm_errors += 1;
                        counter!("trend_llm_errors_total").increment(1);
                    }
                    Some(raw) => {
                        for item in safe_json_parse(&raw) {
                            let mut record = EventRecord::from_llm_value(&item);
                            merge_metadata(&mut record, &analysis, article);
                            match dedup.offer(record) {
                                Verdict::Accepted => counters.accepted += 1,
                                Verdict::KnownDuplicate => counters.known_duplicates += 1,
                                Verdict::RunDuplicate => counters.run_duplicates += 1,
                                Verdict::Invalid => {}
                            }
                        }
                    }
                }
                // Proactive pacing, on top of reactive backoff.
                tokio::time::sleep(llm_pause).await;
            }
        }

        counter!("trend_events_accepted_total").increment(counters.accepted as u64);
        histogram!("trend_pipeline_duration_seconds")
            .record(run_started.elapsed().as_secs_f64());

        let outcome_hint = zero_result_hint(&counters, listing_pages_fetched, articles.len());
        if let Some(hint) = &outcome_hint {
            warn!(hint = %hint, "run produced no new records");
        }
        info!(
            accepted = counters.accepted,
            known = counters.known_duplicates,
            in_run = counters.run_duplicates,
            fetch_failures = counters.fetch_failures,
            llm_errors = counters.llm_errors,
            "✅ run complete"
        );

        Ok(PipelineResult {
            records: dedup.into_records(),
            counters,
            outcome_hint,
        })
    }
}

/// Explains an empty run so the operator knows whether to fix seeds, wait
/// out the source site, or accept that everything was already known.
fn zero_result_hint(
    counters: &RunCounters,
    listing_pages_fetched: usize,
    articles_discovered: usize,
) -> Option<String> {
    if counters.accepted > 0 {
        return None;
    }
    if listing_pages_fetched == 0 {
        return Some("no listing pages could be reached".to_string());
    }
    if articles_discovered == 0 {
        return Some("listings were reachable but contained no article links".to_string());
    }
    let extractable = counters
        .articles_seen
        .saturating_sub(counters.fetch_failures + counters.articles_skipped_short);
    if extractable == 0 {
        return Some("no article text was extractable".to_string());
    }
    if counters.known_duplicates + counters.run_duplicates > 0 {
        return Some("all extracted events were already known or duplicated".to_string());
    }
    if counters.llm_errors > 0 {
        return Some("extraction calls failed; see llm_errors".to_string());
    }
    Some("articles were processed but the model returned no usable events".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_distinguishes_unreachable_listings_from_known_events() {
        let mut counters = RunCounters::default();
        assert_eq!(
            zero_result_hint(&counters, 0, 0).as_deref(),
            Some("no listing pages could be reached")
        );

        counters.articles_seen = 3;
        counters.known_duplicates = 3;
        assert_eq!(
            zero_result_hint(&counters, 2, 3).as_deref(),
            Some("all extracted events were already known or duplicated")
        );

        counters.accepted = 1;
        assert!(zero_result_hint(&counters, 2, 3).is_none());
    }

    #[test]
    fn hint_reports_unextractable_text() {
        let counters = RunCounters {
            articles_seen: 2,
            fetch_failures: 1,
            articles_skipped_short: 1,
            ..RunCounters::default()
        };
        assert_eq!(
            zero_result_hint(&counters, 1, 2).as_deref(),
            Some("no article text was extractable")
        );
    }
}
