//! Field extractors shared by the normalizers
//!
//! Tag lookup, tag rendering, timestamp formatting and dot-path access into
//! raw API responses. Every helper is total: null, missing or oddly-typed
//! input degrades to `None` or passes through instead of panicking.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::fmt::Write;

/// Default date pattern for report columns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Pattern for columns that keep the time of day
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Value of the `Name` tag
pub fn extract_name_value(tags: &Value) -> Option<&str> {
    extract_tag_value(tags, "Name")
}

/// Value of the first tag whose `Key` equals `key`
pub fn extract_tag_value<'a>(tags: &'a Value, key: &str) -> Option<&'a str> {
    tags.as_array()?
        .iter()
        .find(|tag| tag.get("Key").and_then(Value::as_str) == Some(key))
        .and_then(|tag| tag.get("Value"))
        .and_then(Value::as_str)
}

/// Render a tag list as `Key<pair_sep>Value` items joined by `item_sep`
///
/// Returns `None` when there are no tags.
pub fn join_tags(tags: &Value, pair_sep: &str, item_sep: &str) -> Option<String> {
    let pairs: Vec<String> = tags
        .as_array()?
        .iter()
        .filter_map(|tag| {
            let key = tag.get("Key").and_then(Value::as_str)?;
            let value = tag.get("Value").and_then(Value::as_str).unwrap_or("");
            Some(format!("{}{}{}", key, pair_sep, value))
        })
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join(item_sep))
    }
}

/// Format a timestamp-like JSON value with `pattern`
///
/// Null and non-string values pass through. Strings that do not parse as an
/// ISO-8601 date or date-time, or a pattern chrono rejects, return the input.
pub fn format_timestamp(value: &Value, pattern: &str) -> Value {
    let Value::String(text) = value else {
        return value.clone();
    };

    parse_timestamp(text)
        .and_then(|dt| render(&dt, pattern))
        .map(Value::String)
        .unwrap_or_else(|| value.clone())
}

/// Format a native date-time with `pattern`
pub fn format_datetime(dt: &NaiveDateTime, pattern: &str) -> String {
    render(dt, pattern).unwrap_or_else(|| dt.to_string())
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    // Offsets keep the wall-clock time of the offset they carry
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, pattern) {
            return Some(dt.naive_local());
        }
    }
    for pattern in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn render(dt: &NaiveDateTime, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", dt.format(pattern)).ok()?;
    Some(out)
}

/// Look up a dot-separated path; numeric segments index arrays
///
/// Explicit nulls are treated as absent.
pub fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;
    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(idx) => current.get(idx)?,
            Err(_) => current.get(part)?,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// String at `path`
pub fn str_at<'a>(item: &'a Value, path: &str) -> Option<&'a str> {
    lookup(item, path).and_then(Value::as_str)
}

/// String at `path`, or `default`
pub fn text_or(item: &Value, path: &str, default: &str) -> String {
    str_at(item, path).unwrap_or(default).to_string()
}

/// Array at `key`, empty when missing or not an array
pub fn items<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// String elements of the array at `path`
pub fn string_list(item: &Value, path: &str) -> Vec<String> {
    lookup(item, path)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_name_value() {
        assert_eq!(extract_name_value(&json!([])), None);
        assert_eq!(extract_name_value(&Value::Null), None);
        let tags = json!([{"Key": "Name", "Value": "x"}, {"Key": "Env", "Value": "y"}]);
        assert_eq!(extract_name_value(&tags), Some("x"));
        assert_eq!(extract_tag_value(&tags, "Env"), Some("y"));
        assert_eq!(extract_tag_value(&tags, "Owner"), None);
    }

    #[test]
    fn test_extract_tag_value_tolerates_malformed_entries() {
        let tags = json!([{"Value": "orphan"}, "junk", {"Key": "Name"}]);
        assert_eq!(extract_name_value(&tags), None);
        assert_eq!(extract_name_value(&json!({"Key": "Name"})), None);
    }

    #[test]
    fn test_join_tags() {
        let tags = json!([{"Key": "Env", "Value": "prod"}, {"Key": "Team", "Value": "ops"}]);
        assert_eq!(join_tags(&tags, "=", "; ").as_deref(), Some("Env=prod; Team=ops"));
        assert_eq!(join_tags(&tags, ":", ", ").as_deref(), Some("Env:prod, Team:ops"));
        assert_eq!(join_tags(&json!([]), "=", ";"), None);
        assert_eq!(join_tags(&Value::Null, "=", ";"), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(&Value::Null, DATE_FORMAT), Value::Null);
        assert_eq!(
            format_timestamp(&json!("2023-05-15T12:30:45Z"), DATE_FORMAT),
            json!("2023-05-15")
        );
        assert_eq!(
            format_timestamp(&json!("not-a-datetime"), DATE_FORMAT),
            json!("not-a-datetime")
        );
        assert_eq!(format_timestamp(&json!(42), DATE_FORMAT), json!(42));
    }

    #[test]
    fn test_format_timestamp_variants() {
        assert_eq!(
            format_timestamp(&json!("2023-05-15T12:30:45.123+09:00"), "%Y-%m-%d %H:%M"),
            json!("2023-05-15 12:30")
        );
        assert_eq!(
            format_timestamp(&json!("2023-05-15 12:30:45"), DATE_FORMAT),
            json!("2023-05-15")
        );
        assert_eq!(
            format_timestamp(&json!("2023-05-15"), "%d/%m/%Y"),
            json!("15/05/2023")
        );
    }

    #[test]
    fn test_invalid_pattern_returns_input() {
        assert_eq!(
            format_timestamp(&json!("2023-05-15T12:30:45Z"), "%Q"),
            json!("2023-05-15T12:30:45Z")
        );
    }

    #[test]
    fn test_format_datetime() {
        let dt = NaiveDate::from_ymd_opt(2023, 5, 15)
            .unwrap()
            .and_hms_opt(12, 30, 45)
            .unwrap();
        assert_eq!(format_datetime(&dt, "%Y/%m/%d %H:%M"), "2023/05/15 12:30");
        assert_eq!(format_datetime(&dt, DATE_FORMAT), "2023-05-15");
    }

    #[test]
    fn test_lookup_paths() {
        let item = json!({"Endpoint": {"Address": "db.local", "Port": 5432}, "Ids": ["a", "b"], "Gone": null});
        assert_eq!(str_at(&item, "Endpoint.Address"), Some("db.local"));
        assert_eq!(lookup(&item, "Endpoint.Port"), Some(&json!(5432)));
        assert_eq!(str_at(&item, "Ids.1"), Some("b"));
        assert_eq!(lookup(&item, "Gone"), None);
        assert_eq!(lookup(&item, "Endpoint.Missing"), None);
        assert_eq!(string_list(&item, "Ids"), vec!["a", "b"]);
        assert_eq!(text_or(&item, "Missing", "N/A"), "N/A");
    }

    #[test]
    fn test_items_defaults_to_empty() {
        assert!(items(&json!({}), "Vpcs").is_empty());
        assert!(items(&json!({"Vpcs": "nope"}), "Vpcs").is_empty());
        assert_eq!(items(&json!({"Vpcs": [1, 2]}), "Vpcs").len(), 2);
    }
}
