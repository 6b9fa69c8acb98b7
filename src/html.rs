use crate::rules::SiteRule;
use scraper::node::Element;
use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};

/// Structural tags that never carry article content.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "iframe", "noscript", "svg", "aside", "form",
];

/// Class substrings associated with non-article chrome. An element whose
/// joined class string contains any of these is skipped with its subtree.
const NOISE_CLASS_TOKENS: &[&str] = &[
    "sidebar", "ranking", "recommend", "widget", "ad", "breadcrumb", "banner", "menu", "share",
    "sns", "modal",
];

/// Tags that delimit one logical line of visible text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article", "table", "tr",
    "td", "th", "ul", "ol", "dl", "dt", "dd", "br", "blockquote", "figcaption",
];

fn is_noise_element(element: &Element) -> bool {
    if NOISE_TAGS.contains(&element.name()) {
        return true;
    }
    // Class may be absent or multi-valued; join and substring-match.
    let classes = element.classes().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
    if classes.is_empty() {
        return false;
    }
    NOISE_CLASS_TOKENS.iter().any(|token| classes.contains(token))
}

fn flush(buf: &mut String, lines: &mut Vec<String>) {
    let collapsed = buf.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        lines.push(collapsed);
    }
    buf.clear();
}

fn walk(node: NodeRef<Node>, lines: &mut Vec<String>, buf: &mut String) {
    match node.value() {
        Node::Text(text) => buf.push_str(&text.text),
        Node::Element(element) => {
            if is_noise_element(&element) {
                return;
            }
            let block = BLOCK_TAGS.contains(&element.name());
            if block {
                flush(buf, lines);
            }
            for child in node.children() {
                walk(child, lines, buf);
            }
            if block {
                flush(buf, lines);
            }
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                walk(child, lines, buf);
            }
        }
        _ => {}
    }
}

fn text_below(node: NodeRef<Node>) -> String {
    let mut lines = Vec::new();
    let mut buf = String::new();
    walk(node, &mut lines, &mut buf);
    flush(&mut buf, &mut lines);
    lines.join("\n")
}

/// Visible text of the whole document, one trimmed line per block-level run,
/// with boilerplate containers and chrome-classed elements stripped out.
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    text_below(document.tree.root())
}

/// Article body text. With a site rule, its content selectors are tried in
/// order and the first non-empty match wins; otherwise (or when none match)
/// the stripped full-document text is the fallback.
pub fn extract_main_text(html: &str, rule: Option<&SiteRule>) -> String {
    let document = Html::parse_document(html);
    if let Some(rule) = rule {
        for raw_selector in rule.content_selectors {
            let Ok(selector) = Selector::parse(raw_selector) else {
                continue;
            };
            if let Some(element) = document.select(&selector).next() {
                let text = text_below(*element);
                if !text.trim().is_empty() {
                    return text;
                }
            }
        }
    }
    text_below(document.tree.root())
}
