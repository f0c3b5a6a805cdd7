//! AI tool requests: code explainer, quiz generator, email assistant,
//! document summarizer and resume optimizer.
//!
//! Every successful call is recorded server-side as a history entry, so
//! callers refresh the history store afterwards if it is mounted.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::client::{field, ApiClient};
use crate::types::errors::ToolError;
use crate::types::tools::{EmailRequest, ExplainRequest, QuizRequest, UploadFile};

const DEFAULT_SUMMARY_TONE: &str = "neutral";

pub struct ToolsService {
    api: Arc<ApiClient>,
}

impl ToolsService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn explain_code(&self, request: &ExplainRequest) -> Result<String, ToolError> {
        if request.code.trim().is_empty() {
            return Err(ToolError::MissingField("code"));
        }
        let body = self
            .api
            .send_json(self.api.request(Method::POST, "/explain/explain").json(request))
            .await?;
        info!(language = %request.language, "code explained");
        required(&body, "explanation", "No explanation returned from the service")
    }

    pub async fn generate_quiz(&self, request: &QuizRequest) -> Result<Value, ToolError> {
        if request.language.trim().is_empty() {
            return Err(ToolError::MissingField("language"));
        }
        let body = self
            .api
            .send_json(self.api.request(Method::POST, "/codequiz/generate").json(request))
            .await?;
        info!(language = %request.language, difficulty = %request.difficulty, "quiz generated");
        required(&body, "quiz", "No quiz generated from the service")
    }

    pub async fn assist_email(&self, request: &EmailRequest) -> Result<String, ToolError> {
        if request.input.trim().is_empty() {
            return Err(ToolError::MissingField("input"));
        }
        let body = self
            .api
            .send_json(self.api.request(Method::POST, "/email/email-assist").json(request))
            .await?;
        info!(mode = %request.mode, "email generated");
        required(&body, "response", "No email generated from the service")
    }

    /// Uploads a document for summarization. `tone` defaults to "neutral".
    pub async fn summarize(&self, file: UploadFile, tone: Option<&str>) -> Result<String, ToolError> {
        let tone = tone
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_SUMMARY_TONE)
            .to_string();
        let form = Form::new().part("file", file_part(file)?).text("tone", tone);
        let body = self
            .api
            .send_json(
                self.api
                    .request(Method::POST, "/summarizer/upload/authenticated")
                    .multipart(form),
            )
            .await?;
        info!("document summarized");
        required(&body, "summary", "No summary returned from the service")
    }

    /// Uploads a resume together with the job description it should target.
    pub async fn optimize_resume(&self, resume: UploadFile, job_text: &str) -> Result<Value, ToolError> {
        if job_text.trim().is_empty() {
            return Err(ToolError::MissingField("jobText"));
        }
        let form = Form::new()
            .part("resume", file_part(resume)?)
            .text("jobText", job_text.to_string());
        let body = self
            .api
            .send_json(self.api.request(Method::POST, "/resume/optimize").multipart(form))
            .await?;
        info!("resume optimized");
        required(&body, "data", "No optimization returned from the service")
    }
}

fn required<T: DeserializeOwned>(body: &Value, key: &str, empty: &str) -> Result<T, ToolError> {
    field(body, key)?.ok_or_else(|| ToolError::EmptyResult(empty.to_string()))
}

fn file_part(file: UploadFile) -> Result<Part, ToolError> {
    Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&file.mime_type)
        .map_err(|e| ToolError::File(format!("invalid mime type: {}", e)))
}

/// Guesses the upload MIME type from the file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        Some("txt") | Some("md") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Reads a local document into an [`UploadFile`].
pub fn read_upload(path: &Path) -> Result<UploadFile, ToolError> {
    let bytes = fs::read(path).map_err(|e| ToolError::File(format!("{}: {}", path.display(), e)))?;
    if bytes.is_empty() {
        return Err(ToolError::File(format!("{}: file is empty", path.display())));
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    debug!(file = %file_name, size = bytes.len(), "upload read");
    Ok(UploadFile {
        file_name,
        mime_type: mime_for(path).to_string(),
        bytes,
    })
}
