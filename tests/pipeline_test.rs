use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Cursor;

use trend_scraper::config::Config;
use trend_scraper::dedupe::ExistingFingerprintSet;
use trend_scraper::fetch::PageFetcher;
use trend_scraper::llm::{ExtractClient, LlmError};
use trend_scraper::pipeline::Pipeline;

struct MapFetcher {
    pages: HashMap<String, String>,
}

#[async_trait::async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        self.pages.get(url).cloned()
    }
}

/// Answers per chunk based on which article marker the chunk contains, the
/// way a real model would answer per article body.
struct MarkerExtractor;

#[async_trait::async_trait]
impl ExtractClient for MarkerExtractor {
    async fn extract(&self, chunk: &str, _today: NaiveDate) -> std::result::Result<String, LlmError> {
        if chunk.contains("記事A") {
            // Wrapped in fences, as models tend to do despite instructions.
            return Ok("```json\n[{\"name\":\"秋祭り\",\"place\":\"渋谷\",\"date_info\":\"2025/9/15\"}]\n```".to_string());
        }
        if chunk.contains("記事B") {
            // Same event, full-width trailing space in the place.
            return Ok("[{\"name\":\"秋祭り\",\"place\":\"渋谷　\"}]".to_string());
        }
        Ok("[]".to_string())
    }
}

fn article_page(marker: &str, with_metadata: bool) -> String {
    let filler = "地域のイベント詳細情報をお伝えします。".repeat(30);
    let head = if with_metadata {
        r#"<meta property="article:published_time" content="2025-8-1">
           <script type="application/ld+json">
           {"@type":"Event","location":{"@type":"Place",
            "address":{"addressRegion":"東京都","addressLocality":"渋谷区"},
            "geo":{"latitude":35.6595,"longitude":139.6982}}}
           </script>"#
    } else {
        ""
    };
    format!(
        r#"<html><head>{head}</head><body>
           <nav>ホーム &gt; ニュース</nav>
           <div class="rbody"><p>{marker} 秋祭りが開催されます。{filler}</p></div>
           <div class="sidebar">ランキング</div>
           </body></html>"#
    )
}

fn test_pages() -> HashMap<String, String> {
    let mut pages = HashMap::new();
    pages.insert(
        "https://prtimes.jp/list".to_string(),
        r#"<a href="/main/html/rd/p/a.html">記事A</a>
           <a href="/main/html/rd/p/b.html">記事B</a>"#
            .to_string(),
    );
    pages.insert(
        "https://prtimes.jp/main/html/rd/p/a.html".to_string(),
        article_page("記事A", true),
    );
    pages.insert(
        "https://prtimes.jp/main/html/rd/p/b.html".to_string(),
        article_page("記事B", false),
    );
    pages
}

fn test_config() -> Config {
    toml::from_str(
        r#"
        [[targets]]
        url = "https://prtimes.jp/list"
        label = "PR TIMES"

        [crawl]
        max_pages = 2
        request_interval_secs = 0.0

        [llm]
        call_interval_secs = 0.0
        retry_base_wait_secs = 0.0
        "#,
    )
    .expect("test config parses")
}

#[tokio::test]
async fn same_event_across_articles_is_emitted_once() -> Result<()> {
    let fetcher = MapFetcher { pages: test_pages() };
    let config = test_config();
    let pipeline = Pipeline::new(&fetcher, &MarkerExtractor, &config);

    let result = pipeline.run(ExistingFingerprintSet::empty()).await?;

    assert_eq!(result.counters.accepted, 1);
    assert_eq!(result.counters.run_duplicates, 1);
    assert_eq!(result.records.len(), 1);
    let record = &result.records[0];
    assert_eq!(record.name, "秋祭り");
    assert_eq!(record.source_label, "PR TIMES");
    assert_eq!(record.source_url, "https://prtimes.jp/main/html/rd/p/a.html");
    Ok(())
}

#[tokio::test]
async fn structured_metadata_overrides_model_guesses() -> Result<()> {
    let fetcher = MapFetcher { pages: test_pages() };
    let config = test_config();
    let pipeline = Pipeline::new(&fetcher, &MarkerExtractor, &config);

    let result = pipeline.run(ExistingFingerprintSet::empty()).await?;

    let record = &result.records[0];
    assert_eq!(record.release_date, "2025-08-01");
    assert_eq!(record.address, "東京都渋谷区");
    assert_eq!(record.latitude, "35.6595");
    assert_eq!(record.longitude, "139.6982");
    // Model-provided date_info is normalized with zero padding.
    assert_eq!(record.date_info, "2025/09/15");
    Ok(())
}

#[tokio::test]
async fn known_csv_fingerprints_exclude_fresh_extractions() -> Result<()> {
    let existing =
        ExistingFingerprintSet::from_reader(Cursor::new("イベント名,場所\n秋 祭 り,渋谷\n"))?;
    let fetcher = MapFetcher { pages: test_pages() };
    let config = test_config();
    let pipeline = Pipeline::new(&fetcher, &MarkerExtractor, &config);

    let result = pipeline.run(existing).await?;

    assert_eq!(result.counters.accepted, 0);
    assert_eq!(result.counters.known_duplicates, 2);
    assert!(result.records.is_empty());
    assert_eq!(
        result.outcome_hint.as_deref(),
        Some("all extracted events were already known or duplicated")
    );
    Ok(())
}

#[tokio::test]
async fn fetch_failures_and_short_articles_are_counted_not_fatal() -> Result<()> {
    let mut pages = HashMap::new();
    pages.insert(
        "https://prtimes.jp/list".to_string(),
        r#"<a href="/main/html/rd/p/dead.html">落ちている記事</a>
           <a href="/main/html/rd/p/short.html">短い記事</a>"#
            .to_string(),
    );
    pages.insert(
        "https://prtimes.jp/main/html/rd/p/short.html".to_string(),
        "<div class=\"rbody\"><p>短文</p></div>".to_string(),
    );

    let fetcher = MapFetcher { pages };
    let config = test_config();
    let pipeline = Pipeline::new(&fetcher, &MarkerExtractor, &config);

    let result = pipeline.run(ExistingFingerprintSet::empty()).await?;

    assert_eq!(result.counters.fetch_failures, 1);
    assert_eq!(result.counters.articles_skipped_short, 1);
    assert_eq!(result.counters.accepted, 0);
    assert_eq!(result.outcome_hint.as_deref(), Some("no article text was extractable"));
    Ok(())
}

#[tokio::test]
async fn unreachable_listings_explain_the_empty_run() -> Result<()> {
    let fetcher = MapFetcher { pages: HashMap::new() };
    let config = test_config();
    let pipeline = Pipeline::new(&fetcher, &MarkerExtractor, &config);

    let result = pipeline.run(ExistingFingerprintSet::empty()).await?;

    assert_eq!(result.counters.accepted, 0);
    assert_eq!(result.outcome_hint.as_deref(), Some("no listing pages could be reached"));
    Ok(())
}

#[tokio::test]
async fn rate_limited_chunks_degrade_to_llm_error_counts() -> Result<()> {
    struct AlwaysLimited;

    #[async_trait::async_trait]
    impl ExtractClient for AlwaysLimited {
        async fn extract(
            &self,
            _chunk: &str,
            _today: NaiveDate,
        ) -> std::result::Result<String, LlmError> {
            Err(LlmError::RateLimited)
        }
    }

    let fetcher = MapFetcher { pages: test_pages() };
    let config = test_config();
    let pipeline = Pipeline::new(&fetcher, &AlwaysLimited, &config);

    let result = pipeline.run(ExistingFingerprintSet::empty()).await?;

    assert_eq!(result.counters.accepted, 0);
    assert_eq!(result.counters.llm_errors, 2);
    assert_eq!(result.outcome_hint.as_deref(), Some("extraction calls failed; see llm_errors"));
    Ok(())
}

#[tokio::test]
async fn empty_target_list_is_a_fatal_configuration_error() -> Result<()> {
    let config: Config = toml::from_str("")?;
    let fetcher = MapFetcher { pages: HashMap::new() };
    let pipeline = Pipeline::new(&fetcher, &MarkerExtractor, &config);

    assert!(pipeline.run(ExistingFingerprintSet::empty()).await.is_err());
    Ok(())
}
