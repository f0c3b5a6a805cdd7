//! SkillForge RPC Server: JSON-RPC over stdin/stdout for the desktop shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"history.mount", "params":{}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"ready", ...} once, then {"event":"history.snapshot", ...}
//!           whenever the history view changes.

use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use skillforge::app::App;
use skillforge::logging;
use skillforge::rpc_handler::{forward_snapshots, handle_method};

/// Env var pointing at an alternate `settings.json`.
const CONFIG_ENV: &str = "SKILLFORGE_CONFIG";

/// Fixed one-second window limiter.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self {
            window_start: Instant::now(),
            request_count: 0,
            max_per_second,
        }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

async fn emit(stdout: &mut Stdout, message: &Value) -> io::Result<()> {
    let mut line = message.to_string();
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() {
    logging::init();

    let config_path = std::env::var(CONFIG_ENV).ok();
    let mut app = match App::new(config_path) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to initialize SkillForge");
            std::process::exit(1);
        }
    };
    app.startup().await;
    let updates = app.history.subscribe();
    let preview_chars = app.preview_chars();
    let app = Mutex::new(app);

    // Responses and events share one writer so lines never interleave.
    let (out, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(message) = out_rx.recv().await {
            if let Err(e) = emit(&mut stdout, &message).await {
                warn!(error = %e, "stdout write failed");
                break;
            }
        }
    });

    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    if out.send(ready).is_err() {
        return;
    }
    tokio::spawn(forward_snapshots(updates, preview_chars, out.clone()));
    info!("rpc server ready");

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Err(e) => json!({"id": null, "error": format!("parse error: {}", e)}),
            Ok(req) => {
                let id = req.get("id").cloned().unwrap_or(Value::Null);
                if !rate_limiter.check() {
                    json!({"id": id, "error": "rate limit exceeded"})
                } else {
                    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                    let params = req.get("params").cloned().unwrap_or_else(|| json!({}));
                    match handle_method(&app, method, &params).await {
                        Ok(val) => json!({"id": id, "result": val}),
                        Err(err) => json!({"id": id, "error": err}),
                    }
                }
            }
        };

        if out.send(response).is_err() {
            break;
        }
    }

    info!("stdin closed, shutting down");
    // Dropping the app closes the snapshot stream; the writer drains what is queued.
    drop(app);
    drop(out);
    if let Err(e) = writer.await {
        error!(error = %e, "stdout writer task failed");
    }
}
