//! Query endpoint models.

use serde::{Deserialize, Serialize};

use super::task::Task;

/// How the orchestrator should answer: a single agent or the swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Standard,
    Swarm,
}

/// Body of `POST /api/v1/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub query_text: String,
    /// Document scope; `"all"` queries the whole knowledge base.
    pub pdf_id: String,
    pub mode: QueryMode,
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag_mode: Option<String>,
}

impl QueryRequest {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            pdf_id: "all".to_string(),
            mode: QueryMode::Standard,
            session_id: None,
            model: None,
            provider: None,
            repo_context: None,
            rag_mode: None,
        }
    }
}

/// A retrieval citation attached to an assistant answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SourceRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Which model/provider actually served the answer (the router may fall
/// back to a different one than requested).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Response of `POST /api/v1/query`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<SourceRef>>,
    /// Present when the backend created or re-keyed the session.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<ResponseMetadata>,
    /// Updated roadmap, when the answer changed the plan.
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
}

impl QueryResponse {
    /// Displayable model label, folding in the provider when known.
    pub fn model_label(&self, requested_model: &str, requested_provider: &str) -> String {
        let metadata = self.metadata.as_ref();
        let model = metadata
            .and_then(|m| m.model.as_deref())
            .unwrap_or(requested_model);
        let provider = metadata
            .and_then(|m| m.provider.as_deref())
            .unwrap_or(requested_provider);
        if provider.is_empty() || provider == "unknown" {
            model.to_string()
        } else {
            format!("{} @ {}", model, provider)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_serializes_null_session() {
        let req = QueryRequest::new("hello");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["session_id"], serde_json::Value::Null);
        assert_eq!(json["mode"], "standard");
        assert_eq!(json["pdf_id"], "all");
    }

    #[test]
    fn test_model_label_prefers_metadata() {
        let resp: QueryResponse = serde_json::from_str(
            r#"{"answer": "hi", "metadata": {"model": "llama-70b", "provider": "groq"}}"#,
        )
        .unwrap();
        assert_eq!(resp.model_label("other", "sambanova"), "llama-70b @ groq");
    }

    #[test]
    fn test_model_label_hides_unknown_provider() {
        let resp = QueryResponse::default();
        assert_eq!(resp.model_label("m", "unknown"), "m");
    }
}
