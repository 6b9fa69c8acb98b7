use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Crawl policy for one domain. Defined statically at startup, never mutated.
/// Adding a site is a data addition here, not a code change.
#[derive(Debug)]
pub struct SiteRule {
    /// Substring matched against a URL's host.
    pub domain_match: &'static str,
    /// A path must match this to be treated as an article.
    pub article_path_pattern: Regex,
    /// Path prefixes that disqualify a URL even when the pattern matches.
    pub deny_path_prefixes: &'static [&'static str],
    /// Selectors tried in order to locate the article body.
    pub content_selectors: &'static [&'static str],
    /// Anchor-text/class substrings meaning "go to the next listing page".
    pub next_page_hint_tokens: &'static [&'static str],
}

pub static SITE_RULES: Lazy<Vec<SiteRule>> = Lazy::new(|| {
    vec![
        SiteRule {
            domain_match: "prtimes.jp",
            article_path_pattern: Regex::new(r"^/main/html/rd/p/").unwrap(),
            deny_path_prefixes: &["/ranking", "/magazine", "/story"],
            content_selectors: &["div.rbody", "div.content", "article"],
            next_page_hint_tokens: &["次へ", "次の", "next"],
        },
        SiteRule {
            domain_match: "fashion-press.net",
            article_path_pattern: Regex::new(r"^/news/\d+").unwrap(),
            deny_path_prefixes: &["/brands", "/collections", "/words"],
            content_selectors: &["div.pg_contents", "div.news_main", "article"],
            next_page_hint_tokens: &["次へ", "next", "もっと見る"],
        },
    ]
});

/// Next-page hints applied when the domain has no rule of its own.
pub static GENERIC_NEXT_TOKENS: &[&str] = &["次へ", "次のページ", "next", "もっと見る", "»"];

/// Paths that are never articles, applied to unruled domains only.
static GENERIC_DENY_PREFIXES: &[&str] = &["/login", "/signup", "/search", "/tag/", "/category/"];

/// First rule whose domain substring matches the URL's host, if any.
pub fn rule_for(url: &Url) -> Option<&'static SiteRule> {
    let host = url.host_str()?;
    SITE_RULES.iter().find(|rule| host.contains(rule.domain_match))
}

/// Whether a URL should be treated as an article page.
///
/// With a rule: deny prefixes first, then the article-path pattern. Without
/// one the domain is unconstrained apart from a small generic denylist.
pub fn is_article(url: &Url, rule: Option<&SiteRule>) -> bool {
    let path = url.path();
    match rule {
        Some(rule) => {
            if rule.deny_path_prefixes.iter().any(|p| path.starts_with(p)) {
                return false;
            }
            rule.article_path_pattern.is_match(path)
        }
        None => !GENERIC_DENY_PREFIXES.iter().any(|p| path.starts_with(p)),
    }
}
