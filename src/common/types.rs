use serde::{Deserialize, Serialize};

/// A seed listing URL plus the human-readable label attached to everything
/// discovered through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub url: String,
    pub label: String,
}

/// An article URL discovered during listing traversal, tagged with the label
/// of the seed it came from. Exact-URL duplicates keep the first label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef {
    pub url: String,
    pub source_label: String,
}

/// The canonical output unit of a run.
///
/// `latitude`/`longitude` stay free-form strings: they may come from JSON-LD
/// structured data or from model guesswork, and neither is guaranteed numeric.
/// `release_date` is the article publish date, independent of the event date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub place: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub date_info: String,
    pub description: String,
    pub release_date: String,
    pub source_label: String,
    pub source_url: String,
}

impl EventRecord {
    /// Coerce one item of a model response into a record, field by field.
    /// Model output is semi-structured at best: keys go missing, numbers come
    /// back where strings were asked for. Every absent field defaults to "".
    pub fn from_llm_value(value: &serde_json::Value) -> Self {
        EventRecord {
            name: field_string(value, "name"),
            place: field_string(value, "place"),
            address: field_string(value, "address"),
            latitude: field_string(value, "latitude"),
            longitude: field_string(value, "longitude"),
            date_info: field_string(value, "date_info"),
            description: field_string(value, "description"),
            ..EventRecord::default()
        }
    }

    /// A record without a name is noise, not an event.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

fn field_string(value: &serde_json::Value, key: &str) -> String {
    match value.get(key) {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Run-level counters surfaced to the caller so the operator can judge how
/// complete a run's output is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunCounters {
    /// Records accepted into the final output.
    pub accepted: usize,
    /// Records skipped because their fingerprint was in the known-events CSV.
    pub known_duplicates: usize,
    /// Records skipped as duplicates of something accepted earlier this run.
    pub run_duplicates: usize,
    /// Article or listing pages that could not be fetched.
    pub fetch_failures: usize,
    /// Model calls that failed past the retry bound.
    pub llm_errors: usize,
    /// Article pages handed to the extraction stage.
    pub articles_seen: usize,
    /// Articles whose stripped body text was too short to extract from.
    pub articles_skipped_short: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn llm_value_coercion_defaults_missing_fields() {
        let record = EventRecord::from_llm_value(&json!({
            "name": " 秋祭り ",
            "latitude": 35.6595,
        }));
        assert_eq!(record.name, "秋祭り");
        assert_eq!(record.latitude, "35.6595");
        assert_eq!(record.place, "");
        assert_eq!(record.date_info, "");
    }

    #[test]
    fn record_without_name_is_invalid() {
        let record = EventRecord::from_llm_value(&json!({"place": "渋谷"}));
        assert!(!record.is_valid());
        let blank = EventRecord::from_llm_value(&json!({"name": "   "}));
        assert!(!blank.is_valid());
    }
}
