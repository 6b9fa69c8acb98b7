use serde_json::Value;

/// Best-effort recovery of a JSON array from a model response.
///
/// Model output is routinely wrapped in markdown fences, prefixed with
/// prose, or truncated mid-array at the output-length limit. Salvage order:
/// whole string, then the first-`[`..last-`]` slice, then the first-`{`..
/// last-`}` slice wrapped as a one-element list. Anything unrecoverable
/// yields an empty vec, never an error.
pub fn safe_json_parse(raw: &str) -> Vec<Value> {
    let cleaned = strip_fences(raw);
    let trimmed = cleaned.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return into_list(value);
    }

    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return into_list(value);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return vec![value];
            }
        }
    }

    Vec::new()
}

fn strip_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}
