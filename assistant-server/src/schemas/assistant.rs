use crate::entities::{AssistantPatch, AssistantRecord, Tool};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// A tool enabled for an assistant, e.g. `{"type": "retrieval"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ToolBody {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    #[schema(example = "code_interpreter")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_metadata"))]
pub struct CreateAssistantRequest {
    #[validate(length(min = 1, max = 255))]
    pub external_id: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub instructions: String,
    #[validate(length(min = 1, max = 64))]
    #[schema(example = "gpt-4")]
    pub model: String,
    #[validate(custom(function = "validate_uuid"))]
    #[schema(format = Uuid)]
    pub project_id: String,
    #[validate(nested)]
    pub tools: Vec<ToolBody>,
    /// Arbitrary JSON object; defaults to `{}`.
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_metadata"))]
pub struct UpdateAssistantRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub model: Option<String>,
    #[validate(nested)]
    pub tools: Option<Vec<ToolBody>>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    pub id: String,
    pub external_id: String,
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub model: String,
    pub tools: Vec<ToolBody>,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub created_at: String,
    pub updated_at: String,
}

fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("uuid").with_message("must be a UUID".into()))
}

fn metadata_is_object(metadata: Option<&Value>) -> Result<(), ValidationError> {
    match metadata {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(ValidationError::new("metadata").with_message("metadata must be a JSON object".into())),
    }
}

fn validate_create_metadata(req: &CreateAssistantRequest) -> Result<(), ValidationError> {
    metadata_is_object(req.metadata.as_ref())
}

fn validate_update_metadata(req: &UpdateAssistantRequest) -> Result<(), ValidationError> {
    metadata_is_object(req.metadata.as_ref())
}

impl From<ToolBody> for Tool {
    fn from(body: ToolBody) -> Self {
        Tool { kind: body.kind }
    }
}

impl Tool {
    pub fn to_response(&self) -> ToolBody {
        ToolBody {
            kind: self.kind.clone(),
        }
    }
}

impl AssistantRecord {
    pub fn to_response(&self) -> AssistantResponse {
        AssistantResponse {
            id: self.id.clone(),
            external_id: self.external_id.clone(),
            project_id: self.project_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            instructions: self.instructions.clone(),
            model: self.model.clone(),
            tools: self.tools.iter().map(Tool::to_response).collect(),
            metadata: self.metadata.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl From<UpdateAssistantRequest> for AssistantPatch {
    fn from(req: UpdateAssistantRequest) -> Self {
        AssistantPatch {
            name: req.name,
            description: req.description,
            instructions: req.instructions,
            model: req.model,
            tools: req.tools.map(|tools| tools.into_iter().map(Tool::from).collect()),
            metadata: req.metadata,
        }
    }
}
