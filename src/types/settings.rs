use serde::{Deserialize, Serialize};

/// Client configuration persisted as `settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL of the SkillForge API, without a trailing slash.
    pub api_base_url: String,
    /// Entries per history page; fixed for one browsing session.
    pub history_page_size: usize,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Intersection ratio at which the scroll sentinel counts as visible.
    pub scroll_threshold: f64,
    /// Characters of input/output shown per history entry.
    pub preview_chars: usize,
    /// Overrides the session file location.
    pub session_file: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            history_page_size: 3,
            request_timeout_secs: 30,
            connect_timeout_secs: 5,
            scroll_threshold: 1.0,
            preview_chars: 280,
            session_file: None,
        }
    }
}

impl ClientSettings {
    /// Checks the values that would otherwise break pagination or scrolling.
    pub fn validate(&self) -> Result<(), String> {
        if self.history_page_size == 0 {
            return Err("history_page_size must be at least 1".to_string());
        }
        if !(self.scroll_threshold > 0.0 && self.scroll_threshold <= 1.0) {
            return Err(format!(
                "scroll_threshold must be in (0, 1], got {}",
                self.scroll_threshold
            ));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(format!(
                "api_base_url must start with http:// or https://, got {}",
                self.api_base_url
            ));
        }
        Ok(())
    }
}
