//! Roadmap task models. Externally owned; polled read-only.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

/// A roadmap entry assigned to an agent by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        let task: Task = serde_json::from_str(
            r#"{"id": "t1", "title": "Scaffold", "status": "IN_PROGRESS", "assigned_agent": "architect"}"#,
        )
        .unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(!task.status.is_done());
    }
}
