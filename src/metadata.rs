use crate::normalize::normalize_date;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Meta keys commonly carrying an article publish date, tried in order
/// against both `property` and `name` attributes.
const META_DATE_KEYS: &[&str] = &[
    "article:published_time",
    "og:published_time",
    "pubdate",
    "publishdate",
    "date",
    "dc.date",
    "datePublished",
];

static TIME_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static LD_JSON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

/// Location fields recovered from embedded structured data. Higher-trust
/// than model guesses: a non-empty field here overrides the model's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredLocation {
    pub address: String,
    pub latitude: String,
    pub longitude: String,
}

impl StructuredLocation {
    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.latitude.is_empty() && self.longitude.is_empty()
    }
}

/// Article publish date from `<meta>`/`<time>` tags, normalized. Empty when
/// nothing is found.
pub fn extract_release_date(document: &Html) -> String {
    for key in META_DATE_KEYS {
        for attr in ["property", "name"] {
            let raw = format!(r#"meta[{attr}="{key}"]"#);
            let Ok(selector) = Selector::parse(&raw) else {
                continue;
            };
            for element in document.select(&selector) {
                if let Some(content) = element.value().attr("content") {
                    if !content.trim().is_empty() {
                        return normalize_date(content.trim());
                    }
                }
            }
        }
    }

    if let Some(time) = document.select(&TIME_SELECTOR).next() {
        if let Some(datetime) = time.value().attr("datetime") {
            if !datetime.trim().is_empty() {
                return normalize_date(datetime.trim());
            }
        }
        let text = time.text().collect::<String>();
        if !text.trim().is_empty() {
            return normalize_date(text.trim());
        }
    }

    String::new()
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Assembles a display address from either a plain string or a
/// PostalAddress-like object (region, locality, street, postal code,
/// country, concatenated in that order).
fn address_from(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(_) => ["addressRegion", "addressLocality", "streetAddress", "postalCode", "addressCountry"]
            .iter()
            .filter_map(|key| value.get(key))
            .map(value_as_string)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

fn location_from_node(node: &Value) -> StructuredLocation {
    if !node.is_object() {
        return StructuredLocation::default();
    }
    // schema.org Event carries a location/place sub-object; a bare Place has
    // address/geo at the top level.
    let place = node.get("location").or_else(|| node.get("place")).unwrap_or(node);

    let mut result = StructuredLocation::default();
    if let Some(address) = place.get("address") {
        result.address = address_from(address);
    }
    if let Some(geo) = place.get("geo") {
        result.latitude = geo.get("latitude").map(value_as_string).unwrap_or_default();
        result.longitude = geo.get("longitude").map(value_as_string).unwrap_or_default();
    }
    result
}

fn candidate_nodes(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => {
            let mut nodes = vec![value];
            if let Some(Value::Array(graph)) = value.get("@graph") {
                nodes.extend(graph.iter());
            }
            nodes
        }
        _ => Vec::new(),
    }
}

/// Location from `application/ld+json` blocks. Malformed JSON is skipped
/// silently; the first node yielding any populated field wins.
pub fn extract_location(document: &Html) -> StructuredLocation {
    for script in document.select(&LD_JSON_SELECTOR) {
        let raw = script.text().collect::<String>();
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "skipping malformed JSON-LD block");
                continue;
            }
        };
        for node in candidate_nodes(&value) {
            let location = location_from_node(node);
            if !location.is_empty() {
                return location;
            }
        }
    }
    StructuredLocation::default()
}
