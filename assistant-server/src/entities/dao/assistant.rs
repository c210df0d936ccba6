use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of an assistant's `tools` column, e.g. `{"type": "code_interpreter"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: String,
}

/// A row in the `assistants` table.
///
/// `tools` and `metadata` are stored as JSON text.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantRecord {
    pub id: String,
    pub external_id: String,
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub model: String,
    pub tools: Vec<Tool>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of an assistant; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct AssistantPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub model: Option<String>,
    pub tools: Option<Vec<Tool>>,
    pub metadata: Option<Value>,
}
