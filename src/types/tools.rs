use serde::{Deserialize, Serialize};

use super::history::RouteType;

/// Input for the code explainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub code: String,
    pub language: String,
    #[serde(default = "default_explain_tone")]
    pub tone: String,
}

fn default_explain_tone() -> String {
    "technical".to_string()
}

/// Input for the code quiz generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub language: String,
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub question_count: String,
}

/// Input for the email assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub mode: String,
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// A document to upload for summarization or resume optimization.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Per-tool usage counters shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureUsage {
    pub route_type: RouteType,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub last_used: Option<String>,
}
