//! RPC method handler for the SkillForge JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches one call to the managers and services held by
//! [`App`]. Destructive history operations are only reachable through the
//! confirmation gate (`history.request_*` then `history.confirm`).
//!
//! [`forward_snapshots`] turns history store updates into
//! `{"event":"history.snapshot"}` lines, so the shell sees `loading` and
//! `loadingMore` while a request is still being served.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch, Mutex};

use crate::app::App;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::tools_service::read_upload;
use crate::types::history::{HistorySnapshot, RouteType};
use crate::types::session::{Credentials, RegisterRequest};
use crate::types::tools::{EmailRequest, ExplainRequest, QuizRequest};

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, String> {
    serde_json::from_value(params.clone()).map_err(|e| format!("invalid params: {}", e))
}

/// Rendering-layer view of a snapshot, with display previews per entry.
pub fn snapshot_json(snapshot: &HistorySnapshot, preview_chars: usize) -> Value {
    let entries: Vec<Value> = snapshot
        .entries
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "routeType": e.route_type,
                "tool": e.route_type.display_name(),
                "inputPreview": e.input_preview(preview_chars),
                "outputPreview": e.output_preview(preview_chars),
                "metadata": e.metadata,
                "createdAt": e.created_at,
            })
        })
        .collect();
    json!({
        "entries": entries,
        "loading": snapshot.loading,
        "loadingMore": snapshot.loading_more,
        "mutating": snapshot.mutating,
        "error": snapshot.error,
        "hasMore": snapshot.has_more,
        "isEmpty": snapshot.is_empty(),
    })
}

/// Sends a `history.snapshot` event for every store update until the store
/// or the event consumer goes away.
pub async fn forward_snapshots(
    mut updates: watch::Receiver<HistorySnapshot>,
    preview_chars: usize,
    events: mpsc::UnboundedSender<Value>,
) {
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        let event = json!({
            "event": "history.snapshot",
            "snapshot": snapshot_json(&snapshot, preview_chars),
        });
        if events.send(event).is_err() {
            break;
        }
    }
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Session ───
        "session.login" => {
            let credentials: Credentials = parse_params(params)?;
            let mut a = app.lock().await;
            let user = a
                .session_manager
                .login(&credentials)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"user": user}))
        }
        "session.register" => {
            let request: RegisterRequest = parse_params(params)?;
            let a = app.lock().await;
            a.session_manager
                .register(&request)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "session.restore" => {
            let mut a = app.lock().await;
            let user = a
                .session_manager
                .restore()
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"authenticated": user.is_some(), "user": user}))
        }
        "session.logout" => {
            let mut a = app.lock().await;
            a.unmount_history();
            a.session_manager.logout().await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "session.status" => {
            let a = app.lock().await;
            Ok(json!({
                "authenticated": a.session_manager.is_authenticated(),
                "user": a.session_manager.user(),
            }))
        }
        "session.change_password" => {
            let current = str_param(params, "current_password")?;
            let new = str_param(params, "new_password")?;
            let confirm = str_param(params, "confirm_password")?;
            let a = app.lock().await;
            a.session_manager
                .change_password(current, new, confirm)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── History ───
        "history.mount" => {
            let mut a = app.lock().await;
            let chars = a.preview_chars();
            // A failed first load is reported through the snapshot's error field.
            let _ = a.mount_history().await;
            Ok(snapshot_json(&a.history.snapshot(), chars))
        }
        "history.unmount" => {
            let mut a = app.lock().await;
            a.unmount_history();
            Ok(json!({"ok": true}))
        }
        "history.snapshot" => {
            let a = app.lock().await;
            Ok(snapshot_json(&a.history.snapshot(), a.preview_chars()))
        }
        "history.load_more" => {
            let mut a = app.lock().await;
            let chars = a.preview_chars();
            let _ = a.load_more_history().await;
            Ok(snapshot_json(&a.history.snapshot(), chars))
        }
        "history.reload" => {
            let mut a = app.lock().await;
            let chars = a.preview_chars();
            let _ = a.refresh_history().await;
            Ok(snapshot_json(&a.history.snapshot(), chars))
        }
        "history.intersect" => {
            let ratio = params
                .get("ratio")
                .and_then(|v| v.as_f64())
                .ok_or("missing ratio")?;
            if !(0.0..=1.0).contains(&ratio) {
                return Err("invalid ratio: must be between 0 and 1".to_string());
            }
            let mut a = app.lock().await;
            let chars = a.preview_chars();
            let outcome = a.intersect(ratio).await;
            Ok(json!({
                "outcome": outcome.as_ref().ok(),
                "error": outcome.as_ref().err().map(|e| e.to_string()),
                "snapshot": snapshot_json(&a.history.snapshot(), chars),
            }))
        }
        "history.request_delete" => {
            let id = match params.get("id") {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return Err("missing id".to_string()),
            };
            let mut a = app.lock().await;
            if !a.history.is_mounted() {
                return Err("history view is not open".to_string());
            }
            a.gate.request_delete(id);
            Ok(json!(a.gate.request()))
        }
        "history.request_clear" => {
            let mut a = app.lock().await;
            if !a.history.is_mounted() {
                return Err("history view is not open".to_string());
            }
            a.gate.request_clear();
            Ok(json!(a.gate.request()))
        }
        "history.confirm" => {
            let mut a = app.lock().await;
            let chars = a.preview_chars();
            let notification = a.confirm().await;
            Ok(json!({
                "notification": notification,
                "snapshot": snapshot_json(&a.history.snapshot(), chars),
            }))
        }
        "history.cancel" => {
            let mut a = app.lock().await;
            let cancelled = a.gate.cancel();
            Ok(json!({"cancelled": cancelled}))
        }
        "history.dialog" => {
            let a = app.lock().await;
            Ok(json!(a.gate.request()))
        }

        // ─── Usage ───
        "usage.features" => {
            let a = app.lock().await;
            let usage = a.usage.feature_usage().await.map_err(|e| e.to_string())?;
            Ok(json!(usage))
        }
        "usage.analytics" => {
            let route = RouteType::from(str_param(params, "route_type")?);
            let a = app.lock().await;
            a.usage.analytics(&route).await.map_err(|e| e.to_string())
        }

        // ─── AI tools ───
        "tools.explain" => {
            let request: ExplainRequest = parse_params(params)?;
            let a = app.lock().await;
            let explanation = a.tools.explain_code(&request).await.map_err(|e| e.to_string())?;
            Ok(json!({"explanation": explanation}))
        }
        "tools.quiz" => {
            let request: QuizRequest = parse_params(params)?;
            let a = app.lock().await;
            let quiz = a.tools.generate_quiz(&request).await.map_err(|e| e.to_string())?;
            Ok(json!({"quiz": quiz}))
        }
        "tools.email" => {
            let request: EmailRequest = parse_params(params)?;
            let a = app.lock().await;
            let response = a.tools.assist_email(&request).await.map_err(|e| e.to_string())?;
            Ok(json!({"response": response}))
        }
        "tools.summarize" => {
            let path = str_param(params, "path")?;
            let tone = params.get("tone").and_then(|v| v.as_str());
            let upload = read_upload(Path::new(path)).map_err(|e| e.to_string())?;
            let a = app.lock().await;
            let summary = a.tools.summarize(upload, tone).await.map_err(|e| e.to_string())?;
            Ok(json!({"summary": summary}))
        }
        "tools.optimize_resume" => {
            let path = str_param(params, "path")?;
            let job_text = str_param(params, "job_text")?;
            let upload = read_upload(Path::new(path)).map_err(|e| e.to_string())?;
            let a = app.lock().await;
            let data = a
                .tools
                .optimize_resume(upload, job_text)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"data": data}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().await;
            serde_json::to_value(a.settings_engine.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().await;
            a.settings_engine
                .set_value(key, value)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "applies_on_restart": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
