//! Session and message models.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::query::SourceRef;

/// A backend-tracked conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// A single transcript entry. Append-only per session from the client's
/// perspective; optimistic entries carry a locally generated temporary id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_loose_id"
    )]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_sources"
    )]
    pub sources: Option<Vec<SourceRef>>,
    /// Model label attributed to an assistant reply, e.g. `"llama @ groq"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Message {
    /// Optimistic local user message, shown before the backend confirms.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Some(format!("temp-{}", uuid::Uuid::new_v4())),
            role: Role::User,
            content: content.into(),
            created_at: Some(Utc::now()),
            sources: None,
            model: None,
        }
    }

    /// Assistant reply built from a query response.
    pub fn assistant(
        content: impl Into<String>,
        sources: Option<Vec<SourceRef>>,
        model: Option<String>,
    ) -> Self {
        Self {
            id: Some(format!("temp-{}", uuid::Uuid::new_v4())),
            role: Role::Assistant,
            content: content.into(),
            created_at: Some(Utc::now()),
            sources,
            model,
        }
    }

    /// Inline system notice (errors, ingestion progress).
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: Some(format!("temp-{}", uuid::Uuid::new_v4())),
            role: Role::System,
            content: content.into(),
            created_at: Some(Utc::now()),
            sources: None,
            model: None,
        }
    }
}

/// Response body of the session clone endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CloneResponse {
    pub session_id: String,
}

// The backend emits message ids as either strings or integers.
fn de_loose_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(de)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// Timestamps arrive as RFC 3339 or as naive Python isoformat strings; a
// value that parses as neither is dropped rather than failing the whole
// message list.
pub(super) fn de_timestamp<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(de)?;
    Ok(value.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// `sources` is an array of objects in newer sessions, an array of bare
// strings in older ones, and sometimes a JSON-encoded string of either.
fn de_sources<'de, D>(de: D) -> Result<Option<Vec<SourceRef>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(de)?;
    Ok(value.and_then(sources_from_value))
}

fn sources_from_value(value: serde_json::Value) -> Option<Vec<SourceRef>> {
    match value {
        serde_json::Value::String(s) => {
            serde_json::from_str::<serde_json::Value>(&s)
                .ok()
                .and_then(sources_from_value)
        }
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(text) => Some(SourceRef {
                        page: None,
                        text: Some(text),
                        score: None,
                    }),
                    other => serde_json::from_value(other).ok(),
                })
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let role: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(role, Role::System);
    }

    #[test]
    fn test_optimistic_user_message_has_temp_id() {
        let msg = Message::user("hello");
        assert!(msg.id.as_deref().unwrap().starts_with("temp-"));
        assert_eq!(msg.role, Role::User);
    }

    #[test]
    fn test_message_with_numeric_id() {
        let msg: Message =
            serde_json::from_str(r#"{"id": 7, "role": "user", "content": "hi"}"#).unwrap();
        assert_eq!(msg.id.as_deref(), Some("7"));
    }

    #[test]
    fn test_naive_timestamp_accepted() {
        let msg: Message = serde_json::from_str(
            r#"{"role": "assistant", "content": "x", "created_at": "2024-03-01T09:30:00.123456"}"#,
        )
        .unwrap();
        assert!(msg.created_at.is_some());
    }

    #[test]
    fn test_unparseable_timestamp_dropped() {
        let msg: Message = serde_json::from_str(
            r#"{"role": "assistant", "content": "x", "created_at": "yesterday"}"#,
        )
        .unwrap();
        assert!(msg.created_at.is_none());
    }

    #[test]
    fn test_sources_as_objects() {
        let msg: Message = serde_json::from_str(
            r#"{"role": "assistant", "content": "x",
                "sources": [{"page": 3, "text": "quoted", "score": 0.91}]}"#,
        )
        .unwrap();
        let sources = msg.sources.unwrap();
        assert_eq!(sources[0].page, Some(3));
        assert_eq!(sources[0].score, Some(0.91));
    }

    #[test]
    fn test_sources_as_json_encoded_string() {
        let msg: Message = serde_json::from_str(
            r#"{"role": "assistant", "content": "x",
                "sources": "[{\"page\": 1, \"text\": \"t\", \"score\": 0.5}]"}"#,
        )
        .unwrap();
        assert_eq!(msg.sources.unwrap()[0].page, Some(1));
    }

    #[test]
    fn test_sources_as_bare_strings() {
        let msg: Message = serde_json::from_str(
            r#"{"role": "assistant", "content": "x", "sources": ["chapter 2"]}"#,
        )
        .unwrap();
        assert_eq!(msg.sources.unwrap()[0].text.as_deref(), Some("chapter 2"));
    }
}
