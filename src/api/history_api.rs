//! Remote history operations consumed by the history store.

use std::future::Future;

use reqwest::Method;
use serde_json::Value;

use super::client::{error_message, ApiClient};
use crate::types::errors::ApiError;
use crate::types::history::HistoryEntry;

/// The remote history collaborator.
///
/// Implemented over HTTP by [`ApiClient`]; tests substitute scripted fakes.
pub trait HistoryApi: Send + Sync + 'static {
    /// Fetches up to `limit` entries starting at `offset`.
    fn fetch_page(
        &self,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<Vec<HistoryEntry>, ApiError>> + Send;

    /// Deletes one entry. Fails with `NotFound` if the id no longer exists.
    fn delete_one(&self, id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Deletes every entry of the signed-in user.
    fn clear_all(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Rejects envelopes that explicitly report `success: false`.
fn check_success(body: &Value) -> Result<(), ApiError> {
    if body.get("success").and_then(|v| v.as_bool()) == Some(false) {
        return Err(ApiError::Server {
            status: 200,
            message: error_message(body).unwrap_or_else(|| "Failed to fetch history".to_string()),
        });
    }
    Ok(())
}

/// Refuses ids that cannot name a single item path segment.
///
/// Dot segments are dropped by URL path normalization, which would turn the
/// item route into the collection route.
fn check_item_id(id: &str) -> Result<(), ApiError> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(ApiError::NotFound(format!("no history item with id {:?}", id)));
    }
    Ok(())
}

impl HistoryApi for ApiClient {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<HistoryEntry>, ApiError> {
        let request = self
            .request(Method::GET, "/user/history")
            .query(&[("limit", limit), ("offset", offset)]);
        let body = self.send_json(request).await?;

        if body.get("success").and_then(|v| v.as_bool()) != Some(true) {
            return Err(ApiError::Server {
                status: 200,
                message: error_message(&body)
                    .unwrap_or_else(|| "Failed to fetch history".to_string()),
            });
        }

        let data = body
            .get("data")
            .cloned()
            .ok_or_else(|| ApiError::Decode("missing 'data' in history response".to_string()))?;
        serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn delete_one(&self, id: &str) -> Result<(), ApiError> {
        check_item_id(id)?;
        let request = self.request_segments(Method::DELETE, &["user", "history", id])?;
        let body = self.send_json(request).await?;
        check_success(&body)
    }

    async fn clear_all(&self) -> Result<(), ApiError> {
        let body = self
            .send_json(self.request(Method::DELETE, "/user/history"))
            .await?;
        check_success(&body)
    }
}
