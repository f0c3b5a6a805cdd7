use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Which AI tool produced a history entry.
///
/// Unknown tags are kept verbatim so newer server-side tools still render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RouteType {
    ResumeOptimizer,
    Summarizer,
    CodeExplainer,
    EmailAssistant,
    CodeQuiz,
    Other(String),
}

impl RouteType {
    /// Canonical tag used on the wire and in analytics paths.
    pub fn as_str(&self) -> &str {
        match self {
            RouteType::ResumeOptimizer => "resume-optimizer",
            RouteType::Summarizer => "summarizer",
            RouteType::CodeExplainer => "code-explainer",
            RouteType::EmailAssistant => "email-assistant",
            RouteType::CodeQuiz => "code-quiz",
            RouteType::Other(tag) => tag,
        }
    }

    /// Human-readable tool name.
    pub fn display_name(&self) -> &str {
        match self {
            RouteType::ResumeOptimizer => "Resume Optimizer",
            RouteType::Summarizer => "Document Summarizer",
            RouteType::CodeExplainer => "Code Explainer",
            RouteType::EmailAssistant => "Email Assistant",
            RouteType::CodeQuiz => "Code Quiz Generator",
            RouteType::Other(tag) => tag,
        }
    }
}

impl From<String> for RouteType {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "resume-optimizer" | "resume" | "resumeoptimizer" => RouteType::ResumeOptimizer,
            "summarizer" | "summary" | "summarize" => RouteType::Summarizer,
            "code-explainer" | "explain" | "codeexplainer" => RouteType::CodeExplainer,
            "email-assistant" | "email" | "emailassistant" => RouteType::EmailAssistant,
            "code-quiz" | "codequiz" | "quiz" => RouteType::CodeQuiz,
            _ => RouteType::Other(tag),
        }
    }
}

impl From<&str> for RouteType {
    fn from(tag: &str) -> Self {
        RouteType::from(tag.to_string())
    }
}

impl From<RouteType> for String {
    fn from(route: RouteType) -> Self {
        match route {
            RouteType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single metadata value. Keys and value types vary per tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Number(serde_json::Number),
    Other(serde_json::Value),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => f.write_str(s),
            MetadataValue::Number(n) => write!(f, "{}", n),
            MetadataValue::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Creation time as sent by the server: ISO 8601 text or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(i64),
    Iso(String),
}

/// One recorded use of an AI tool. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub route_type: RouteType,
    #[serde(default)]
    pub input_data: String,
    #[serde(default)]
    pub output_data: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
    pub created_at: Timestamp,
}

impl HistoryEntry {
    /// Input text cut to `max_chars` characters for display.
    pub fn input_preview(&self, max_chars: usize) -> String {
        preview(&self.input_data, max_chars)
    }

    /// Output text cut to `max_chars` characters for display.
    pub fn output_preview(&self, max_chars: usize) -> String {
        preview(&self.output_data, max_chars)
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// One fetch unit of history.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
    pub entries: Vec<HistoryEntry>,
    /// Number of entries the server returned, before duplicate filtering.
    pub fetched: usize,
    pub has_more: bool,
}

impl Page {
    /// Builds a page from a server response. A short page is the last page.
    pub fn new(offset: usize, limit: usize, entries: Vec<HistoryEntry>) -> Self {
        let fetched = entries.len();
        Self {
            offset,
            limit,
            entries,
            fetched,
            has_more: fetched == limit,
        }
    }

    /// Offset of the page that follows this one.
    pub fn next_offset(&self) -> usize {
        self.offset + self.fetched
    }
}

/// Everything the rendering layer needs to draw the history list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySnapshot {
    pub entries: Vec<HistoryEntry>,
    pub loading: bool,
    pub loading_more: bool,
    pub mutating: bool,
    pub error: Option<String>,
    pub has_more: bool,
}

impl HistorySnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }
}
