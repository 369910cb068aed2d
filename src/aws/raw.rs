//! Raw response shaping
//!
//! SDK outputs are typed; the collectors work on the API-shaped JSON the
//! services document (PascalCase member names, ISO-8601 timestamps). These
//! helpers convert individual members. Generated models expose a required
//! member as `&T` and an optional one as `Option<&T>`, so every helper
//! accepts both.

use aws_sdk_ec2::primitives::{DateTime, DateTimeFormat};
use serde_json::{Map, Value};

/// String-like members (strings and SDK enums)
pub trait RawText {
    fn into_raw(self) -> Value;
}

impl<T: AsRef<str> + ?Sized> RawText for &T {
    fn into_raw(self) -> Value {
        Value::String(self.as_ref().to_string())
    }
}

impl<T: AsRef<str> + ?Sized> RawText for Option<&T> {
    fn into_raw(self) -> Value {
        self.map(|v| Value::String(v.as_ref().to_string()))
            .unwrap_or(Value::Null)
    }
}

/// Timestamp members
pub trait RawTime {
    fn into_raw(self) -> Value;
}

impl RawTime for &DateTime {
    fn into_raw(self) -> Value {
        self.fmt(DateTimeFormat::DateTime)
            .map(Value::String)
            .unwrap_or(Value::Null)
    }
}

impl RawTime for Option<&DateTime> {
    fn into_raw(self) -> Value {
        self.map(RawTime::into_raw).unwrap_or(Value::Null)
    }
}

/// Nested structure members
pub trait Member<'a, T> {
    fn member(self) -> Option<&'a T>;
}

impl<'a, T> Member<'a, T> for &'a T {
    fn member(self) -> Option<&'a T> {
        Some(self)
    }
}

impl<'a, T> Member<'a, T> for Option<&'a T> {
    fn member(self) -> Option<&'a T> {
        self
    }
}

pub fn text(value: impl RawText) -> Value {
    value.into_raw()
}

pub fn time(value: impl RawTime) -> Value {
    value.into_raw()
}

pub fn opt<'a, T>(value: impl Member<'a, T>) -> Option<&'a T> {
    value.member()
}

/// Build an object, dropping absent (null) members like the API does
pub fn obj<I>(fields: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    let map: Map<String, Value> = fields
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    Value::Object(map)
}

/// Convert a list member element by element
pub fn list<T>(items: &[T], convert: impl Fn(&T) -> Value) -> Value {
    Value::Array(items.iter().map(convert).collect())
}

pub fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
}

/// `{"Key": .., "Value": ..}` tag pair
pub fn tag(key: impl RawText, value: impl RawText) -> Value {
    obj([("Key", text(key)), ("Value", text(value))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_accepts_required_and_optional() {
        let required: &str = "vpc-1";
        let optional: Option<&str> = None;
        assert_eq!(text(required), json!("vpc-1"));
        assert_eq!(text(optional), Value::Null);
    }

    #[test]
    fn test_time_renders_iso8601() {
        let dt = DateTime::from_secs(1_684_153_845);
        assert_eq!(time(&dt), json!("2023-05-15T12:30:45Z"));
        assert_eq!(time(None::<&DateTime>), Value::Null);
    }

    #[test]
    fn test_obj_drops_nulls() {
        let value = obj([("A", json!(1)), ("B", Value::Null)]);
        assert_eq!(value, json!({"A": 1}));
    }

    #[test]
    fn test_tag_pair() {
        assert_eq!(
            tag("Name", Some("web")),
            json!({"Key": "Name", "Value": "web"})
        );
    }
}
