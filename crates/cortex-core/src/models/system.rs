//! System endpoint models: mode switching, sync, backup, health.

use serde::{Deserialize, Serialize};

/// Where the backend runs its database and LLM routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemMode {
    #[default]
    Local,
    Cloud,
}

impl SystemMode {
    pub fn toggled(&self) -> Self {
        match self {
            SystemMode::Local => SystemMode::Cloud,
            SystemMode::Cloud => SystemMode::Local,
        }
    }
}

impl std::fmt::Display for SystemMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemMode::Local => write!(f, "LOCAL"),
            SystemMode::Cloud => write!(f, "CLOUD"),
        }
    }
}

/// Response of `GET /api/v1/system/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemStatus {
    pub mode: SystemMode,
}

/// Body of `POST /api/v1/system/mode`.
#[derive(Debug, Clone, Serialize)]
pub struct ModeRequest {
    pub mode: SystemMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncDirection {
    Push,
    Pull,
}

/// Body of `POST /api/v1/system/sync`. The backend treats every sync as a
/// merge; the strategy field is fixed.
#[derive(Debug, Clone, Serialize)]
pub struct SyncRequest {
    pub direction: SyncDirection,
    pub strategy: &'static str,
}

impl SyncRequest {
    pub fn merge(direction: SyncDirection) -> Self {
        Self {
            direction,
            strategy: "MERGE",
        }
    }
}

/// Response of `POST /api/v1/system/backup`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupResponse {
    #[serde(default)]
    pub path: Option<String>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wire_format() {
        assert_eq!(
            serde_json::to_string(&SystemMode::Cloud).unwrap(),
            "\"CLOUD\""
        );
        let status: SystemStatus = serde_json::from_str(r#"{"mode": "LOCAL"}"#).unwrap();
        assert_eq!(status.mode, SystemMode::Local);
    }

    #[test]
    fn test_sync_request_is_always_merge() {
        let req = SyncRequest::merge(SyncDirection::Push);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["strategy"], "MERGE");
        assert_eq!(json["direction"], "PUSH");
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(SystemMode::Local.toggled(), SystemMode::Cloud);
        assert_eq!(SystemMode::Cloud.toggled(), SystemMode::Local);
    }
}
