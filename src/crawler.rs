use crate::common::types::{ArticleRef, CrawlTarget};
use crate::config::CrawlConfig;
use crate::fetch::PageFetcher;
use crate::rules::{is_article, rule_for, SiteRule, GENERIC_NEXT_TOKENS};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static LINK_REL_NEXT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel="next"]"#).unwrap());

/// What one listing page contributes: candidate article URLs (resolved,
/// same-domain, rule-approved) and the next pagination URL, if any.
struct ListingPage {
    article_urls: Vec<String>,
    next_url: Option<String>,
}

fn resolve_same_host(base: &Url, href: &str) -> Option<Url> {
    let resolved = base.join(href.trim()).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    // Off-site pagination and links are never followed.
    if resolved.host_str() != base.host_str() {
        return None;
    }
    Some(resolved)
}

fn anchor_matches_next_hint(text: &str, classes: &str, tokens: &[&str]) -> bool {
    let text = text.trim().to_lowercase();
    let classes = classes.to_lowercase();
    tokens
        .iter()
        .any(|token| text.contains(&token.to_lowercase()) || classes.contains(&token.to_lowercase()))
}

/// Next-page discovery, in priority order: `<link rel="next">`, an anchor
/// whose rel contains "next", then an anchor whose visible text or class
/// matches a hint token. Candidates resolving off-host are discarded.
fn find_next_url(document: &Html, base: &Url, rule: Option<&SiteRule>) -> Option<String> {
    if let Some(link) = document.select(&LINK_REL_NEXT_SELECTOR).next() {
        if let Some(href) = link.value().attr("href") {
            if let Some(resolved) = resolve_same_host(base, href) {
                return Some(resolved.into());
            }
        }
    }

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let rel = anchor.value().attr("rel").unwrap_or_default();
        if rel.to_lowercase().contains("next") {
            if let Some(href) = anchor.value().attr("href") {
                if let Some(resolved) = resolve_same_host(base, href) {
                    return Some(resolved.into());
                }
            }
        }
    }

    let tokens = rule.map(|r| r.next_page_hint_tokens).unwrap_or(GENERIC_NEXT_TOKENS);
    for anchor in document.select(&ANCHOR_SELECTOR) {
        let text = anchor.text().collect::<String>();
        let classes = anchor.value().attr("class").unwrap_or_default();
        if anchor_matches_next_hint(&text, classes, tokens) {
            if let Some(href) = anchor.value().attr("href") {
                if let Some(resolved) = resolve_same_host(base, href) {
                    return Some(resolved.into());
                }
            }
        }
    }

    None
}

/// Parses one listing page. Done synchronously so the parsed DOM never lives
/// across an await point.
fn parse_listing(body: &str, base: &Url, link_limit: usize) -> ListingPage {
    let document = Html::parse_document(body);
    let rule = rule_for(base);

    let mut article_urls = Vec::new();
    for anchor in document.select(&ANCHOR_SELECTOR) {
        if article_urls.len() >= link_limit {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.to_lowercase().starts_with("javascript:")
        {
            continue;
        }
        let Some(resolved) = resolve_same_host(base, href) else {
            continue;
        };
        if !is_article(&resolved, rule_for(&resolved)) {
            continue;
        }
        article_urls.push(resolved.into());
    }

    let next_url = find_next_url(&document, base, rule);
    ListingPage { article_urls, next_url }
}

/// Walks one listing target's pagination, appending newly discovered article
/// refs to `out` in discovery order. Returns the number of listing pages
/// actually fetched, so the caller can tell "no listings reachable" apart
/// from "listings had no usable links".
///
/// `visited_listings` is the run-wide pagination cycle guard: revisiting a
/// listing URL terminates this target. `seen_articles` deduplicates article
/// URLs exactly across all targets, first label wins.
#[instrument(skip_all, fields(label = %target.label))]
pub async fn crawl_listing(
    fetcher: &dyn PageFetcher,
    target: &CrawlTarget,
    config: &CrawlConfig,
    visited_listings: &mut HashSet<String>,
    seen_articles: &mut HashSet<String>,
    out: &mut Vec<ArticleRef>,
) -> usize {
    let mut current = target.url.clone();
    let mut pages_fetched = 0usize;

    for page_index in 0..config.max_pages {
        if !visited_listings.insert(current.clone()) {
            debug!(url = %current, "pagination cycle detected, stopping target");
            break;
        }

        let Ok(base) = Url::parse(&current) else {
            warn!(url = %current, "listing URL failed to parse, stopping target");
            break;
        };

        let Some(body) = fetcher.fetch(&current).await else {
            warn!(url = %current, "listing fetch failed, stopping target");
            break;
        };
        pages_fetched += 1;

        let listing = parse_listing(&body, &base, config.link_limit_per_page);

        let mut added = 0usize;
        for article_url in listing.article_urls {
            if out.len() >= config.max_articles_total {
                break;
            }
            if seen_articles.insert(article_url.clone()) {
                out.push(ArticleRef {
                    url: article_url,
                    source_label: target.label.clone(),
                });
                added += 1;
            }
        }
        info!(page = page_index + 1, added, total = out.len(), "listing page crawled");

        if out.len() >= config.max_articles_total {
            debug!("global article cap reached");
            break;
        }
        let Some(next) = listing.next_url else {
            break;
        };
        current = next;
        tokio::time::sleep(Duration::from_secs_f64(config.request_interval_secs)).await;
    }

    pages_fetched
}
