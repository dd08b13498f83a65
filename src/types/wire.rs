//! Lenient deserializers for record fields as the backend actually sends them.
//!
//! List fields arrive either as JSON arrays or as comma-joined strings, ids
//! arrive as numbers or numeric strings, and dates arrive as RFC 3339
//! timestamps, bare `YYYY-MM-DD` dates, empty strings or `null`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum ListRepr {
    List(Vec<String>),
    Joined(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(i64),
    Text(String),
}

/// Parse a timestamp in any of the formats the backend emits.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    // Date-only values mean midnight UTC.
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Split a comma-joined list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn join_list(items: &[String]) -> String {
    items.join(",")
}

pub fn list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ListRepr>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ListRepr::List(items)) => items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(ListRepr::Joined(raw)) => split_list(&raw),
    })
}

pub fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IdRepr>::deserialize(deserializer)? {
        None => None,
        Some(IdRepr::Number(id)) => Some(id),
        Some(IdRepr::Text(raw)) => raw.trim().parse().ok(),
    })
}

/// Unparseable dates become `None` so the record drops out of date buckets
/// instead of failing the whole fetch.
pub fn optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|value| {
        let parsed = parse_datetime(value);
        if parsed.is_none() && !value.trim().is_empty() {
            tracing::debug!("Ignoring unparseable date {value:?}");
        }
        parsed
    }))
}

pub fn datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}")))
}

/// Decode rows one at a time. A row that does not decode is skipped with a
/// warning and the rest of the list survives.
pub fn decode_records<T: DeserializeOwned>(rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("Id").or_else(|| row.get("id")).cloned();
            match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(id = ?id, "Skipping malformed record: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Record list field decoded with [`decode_records`]; `null` is empty.
pub fn records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let rows = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(decode_records(rows.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "list")]
        labels: Vec<String>,
        #[serde(default, deserialize_with = "optional_id")]
        parent: Option<i64>,
        #[serde(default, deserialize_with = "optional_datetime")]
        due: Option<DateTime<Utc>>,
    }

    #[test]
    fn list_accepts_both_shapes() {
        let joined: Sample = serde_json::from_str(r#"{"labels": "ui, backend,,"}"#).unwrap();
        assert_eq!(joined.labels, vec!["ui", "backend"]);

        let array: Sample = serde_json::from_str(r#"{"labels": ["ui", " "]}"#).unwrap();
        assert_eq!(array.labels, vec!["ui"]);

        let null: Sample = serde_json::from_str(r#"{"labels": null}"#).unwrap();
        assert!(null.labels.is_empty());
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        let number: Sample = serde_json::from_str(r#"{"parent": 7}"#).unwrap();
        assert_eq!(number.parent, Some(7));

        let text: Sample = serde_json::from_str(r#"{"parent": "12"}"#).unwrap();
        assert_eq!(text.parent, Some(12));

        let empty: Sample = serde_json::from_str(r#"{"parent": ""}"#).unwrap();
        assert_eq!(empty.parent, None);
    }

    #[test]
    fn dates_in_every_backend_format() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        assert_eq!(parse_datetime("2024-03-09"), Some(midnight));
        assert_eq!(parse_datetime("2024-03-09T00:00:00Z"), Some(midnight));
        assert_eq!(parse_datetime("2024-03-09T00:00:00.000"), Some(midnight));
        assert_eq!(
            parse_datetime("2024-03-09T02:00:00+02:00"),
            Some(midnight)
        );
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("next tuesday"), None);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let rows = vec![
            serde_json::json!({"Id": 1, "issueId": 4, "createdDate": "2024-03-09"}),
            serde_json::json!({"Id": 2, "issueId": 4, "createdDate": "soon"}),
            serde_json::json!({"Id": 3, "issueId": 4, "createdDate": "2024-03-10T08:00:00Z"}),
        ];

        let comments: Vec<crate::types::Comment> = decode_records(rows);
        let ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn malformed_dates_are_dropped() {
        let sample: Sample = serde_json::from_str(r#"{"due": "soon"}"#).unwrap();
        assert_eq!(sample.due, None);
    }
}
