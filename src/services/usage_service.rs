//! Dashboard usage statistics.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::api::client::{field, ApiClient};
use crate::types::errors::ApiError;
use crate::types::history::RouteType;
use crate::types::tools::FeatureUsage;

pub struct UsageService {
    api: Arc<ApiClient>,
}

impl UsageService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Per-tool usage counters. A response without `data` is an empty list.
    pub async fn feature_usage(&self) -> Result<Vec<FeatureUsage>, ApiError> {
        let body = self
            .api
            .send_json(self.api.request(Method::GET, "/user/feature-usage"))
            .await?;
        let usage: Vec<FeatureUsage> = field(&body, "data")?.unwrap_or_default();
        debug!(tools = usage.len(), "feature usage loaded");
        Ok(usage)
    }

    /// Analytics for one tool. The payload shape is tool specific.
    pub async fn analytics(&self, route_type: &RouteType) -> Result<Value, ApiError> {
        let tag = route_type.as_str();
        if tag.trim().is_empty() || tag == "." || tag == ".." {
            return Err(ApiError::Decode("route type is required".to_string()));
        }
        let request = self
            .api
            .request_segments(Method::GET, &["user", "analytics", tag])?;
        let body = self.api.send_json(request).await?;
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }
}
