use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display-ready representation of one remote commit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub message: String,
    #[serde(rename = "authorName")]
    pub author_name: String,
    #[serde(rename = "authoredAt")]
    pub authored_at: Option<DateTime<Utc>>,
    /// Epoch milliseconds of `authored_at`, `None` when the date is missing or unparseable.
    #[serde(rename = "sortKey")]
    pub sort_key: Option<i64>,
}

impl CommitEntry {
    fn from_payload(payload: &Value) -> Self {
        let author = payload.get("author");
        let author_field = |name: &str| author.and_then(|a| a.get(name)).and_then(Value::as_str);

        let authored_at = author_field("date")
            .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
            .map(|date| date.with_timezone(&Utc));

        Self {
            message: payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            author_name: author_field("name").unwrap_or_default().to_string(),
            authored_at,
            sort_key: authored_at.map(|date| date.timestamp_millis()),
        }
    }
}

/// Turns the body of a commit-list response into display entries.
///
/// A body that is not an array yields an empty list. Elements without an object-valued
/// `commit` payload are skipped. Input order is kept as-is; `sort_key` is not used for ordering.
pub fn normalize_commits(body: &Value) -> Vec<CommitEntry> {
    let Some(items) = body.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.get("commit").filter(|commit| commit.is_object()))
        .map(CommitEntry::from_payload)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_normalize_drops_entries_without_commit_payload() {
        let body = json!([
            {"commit": {"message": "fix bug", "author": {"name": "Ann", "date": "2024-01-01T10:00:00Z"}}},
            {"foo": 1},
            {"commit": {"message": "", "author": {"name": "", "date": null}}}
        ]);

        let entries = normalize_commits(&body);

        let authored_at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(
            entries,
            vec![
                CommitEntry {
                    message: "fix bug".to_string(),
                    author_name: "Ann".to_string(),
                    authored_at: Some(authored_at),
                    sort_key: Some(authored_at.timestamp_millis()),
                },
                CommitEntry {
                    message: String::new(),
                    author_name: String::new(),
                    authored_at: None,
                    sort_key: None,
                },
            ]
        );
    }

    #[test]
    fn test_normalize_keeps_input_order() {
        // 新しい順に並べ替えないこと
        let body = json!([
            {"commit": {"message": "older", "author": {"name": "a", "date": "2020-01-01T00:00:00Z"}}},
            null,
            {"commit": {"message": "newer", "author": {"name": "b", "date": "2024-01-01T00:00:00Z"}}},
            {"commit": null},
            {"commit": {"message": "oldest", "author": {"name": "c", "date": "2010-01-01T00:00:00Z"}}}
        ]);

        let messages: Vec<String> = normalize_commits(&body)
            .into_iter()
            .map(|entry| entry.message)
            .collect();

        assert_eq!(messages, vec!["older", "newer", "oldest"]);
    }

    #[test]
    fn test_normalize_tolerates_missing_author_and_bad_dates() {
        let body = json!([
            {"commit": {"message": "no author"}},
            {"commit": {"author": {"name": "Bob", "date": "not a date"}}},
            {"commit": {"message": "offset", "author": {"date": "2024-03-05T09:30:00+09:00"}}}
        ]);

        let entries = normalize_commits(&body);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].author_name, "");
        assert_eq!(entries[0].authored_at, None);
        assert_eq!(entries[1].message, "");
        assert_eq!(entries[1].author_name, "Bob");
        assert_eq!(entries[1].sort_key, None);
        assert_eq!(
            entries[2].authored_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_normalize_non_array_body_is_empty() {
        assert!(normalize_commits(&json!({"message": "Not Found"})).is_empty());
        assert!(normalize_commits(&Value::Null).is_empty());
    }
}
