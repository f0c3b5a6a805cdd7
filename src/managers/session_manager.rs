//! Session Manager for SkillForge.
//!
//! Explicit owner of the signed-in session: it logs in and out, restores a
//! saved session on startup, installs the bearer token on the shared
//! [`ApiClient`], and is the only component that touches the session file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::client::{error_message, field, ApiClient};
use crate::services::token_vault::TokenVault;
use crate::types::errors::{ApiError, SessionError};
use crate::types::session::{Credentials, PersistedSession, RegisterRequest, UserProfile};

/// Session context shared by reference with whatever needs the current user.
pub struct SessionManager {
    api: Arc<ApiClient>,
    vault: TokenVault,
    session_path: PathBuf,
    user: Option<UserProfile>,
    authenticated: bool,
}

impl SessionManager {
    pub fn new(api: Arc<ApiClient>, session_path: impl Into<PathBuf>) -> Self {
        Self {
            api,
            vault: TokenVault::new(),
            session_path: session_path.into(),
            user: None,
            authenticated: false,
        }
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Signs in and persists the session.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<UserProfile, SessionError> {
        let request = self.api.request(Method::POST, "/auth/login").json(&json!({
            "email": credentials.email,
            "password": credentials.password,
        }));
        let body = match self.api.send_json(request).await {
            Ok(body) => body,
            Err(ApiError::Server { message, .. }) | Err(ApiError::NotFound(message)) => {
                return Err(SessionError::Rejected(message));
            }
            Err(ApiError::Unauthorized) => {
                return Err(SessionError::Rejected("Invalid email or password".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let token: Option<String> = field(&body, "token")?;
        let user: Option<UserProfile> = field(&body, "user")?;
        let (token, user) = match (token, user) {
            (Some(token), Some(user)) => (token, user),
            _ => {
                let message = error_message(&body).unwrap_or_else(|| "Login failed".to_string());
                return Err(SessionError::Rejected(message));
            }
        };

        self.persist(&token, Some(&user))?;
        self.api.set_bearer_token(Some(token));
        self.user = Some(user.clone());
        self.authenticated = true;
        info!(user = user.display_name(), "logged in");
        Ok(user)
    }

    /// Creates an account. The user still has to log in afterwards.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), SessionError> {
        let http = self.api.request(Method::POST, "/auth/register").json(&json!({
            "username": request.username,
            "email": request.email,
            "password": request.password,
        }));
        let body = match self.api.send_json(http).await {
            Ok(body) => body,
            Err(ApiError::Server { message, .. }) => return Err(SessionError::Rejected(message)),
            Err(e) => return Err(e.into()),
        };

        let message = body.get("message").and_then(|v| v.as_str()).unwrap_or("");
        if body.get("user").is_some() || message.contains("successful") {
            info!("registration succeeded");
            Ok(())
        } else {
            Err(SessionError::Rejected(
                error_message(&body).unwrap_or_else(|| "Registration failed".to_string()),
            ))
        }
    }

    /// Restores a saved session and verifies it with the server.
    ///
    /// Returns `Ok(None)` when nothing is saved or the saved token was
    /// rejected; in the latter case the saved session is removed.
    pub async fn restore(&mut self) -> Result<Option<UserProfile>, SessionError> {
        let saved = match self.read_saved()? {
            Some(saved) => saved,
            None => return Ok(None),
        };
        let token = match self.vault.open(&saved.token) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "saved session unreadable, discarding");
                self.clear_local()?;
                return Ok(None);
            }
        };

        // Show the cached user while verification is pending.
        self.user = saved.user;
        self.api.set_bearer_token(Some(token));

        let verified = self
            .api
            .send_json(self.api.request(Method::GET, "/auth/profile"))
            .await
            .and_then(|body| field::<UserProfile>(&body, "user"));

        match verified {
            Ok(Some(user)) => {
                self.user = Some(user.clone());
                self.authenticated = true;
                debug!(user = user.display_name(), "session restored");
                Ok(Some(user))
            }
            Ok(None) | Err(_) => {
                warn!("saved token rejected, clearing session");
                self.clear_local()?;
                Ok(None)
            }
        }
    }

    /// Signs out. Local state is cleared even if the server call fails.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        if let Err(e) = self
            .api
            .send_json(self.api.request(Method::POST, "/auth/logout"))
            .await
        {
            warn!(error = %e, "logout request failed");
        }
        self.clear_local()?;
        info!("logged out");
        Ok(())
    }

    /// Changes the password of the signed-in user.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), SessionError> {
        if new_password != confirm_password {
            return Err(SessionError::PasswordMismatch);
        }
        if !self.authenticated {
            return Err(SessionError::NotAuthenticated);
        }
        let request = self.api.request(Method::PUT, "/auth/password").json(&json!({
            "currentPassword": current_password,
            "newPassword": new_password,
        }));
        match self.api.send_json(request).await {
            Ok(_) => {
                info!("password updated");
                Ok(())
            }
            Err(ApiError::Server { message, .. }) => Err(SessionError::Rejected(message)),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, token: &str, user: Option<&UserProfile>) -> Result<(), SessionError> {
        let record = PersistedSession {
            token: self.vault.seal(token)?,
            user: user.cloned(),
        };
        if let Some(parent) = self.session_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SessionError::Storage(format!("create session dir: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        fs::write(&self.session_path, json)
            .map_err(|e| SessionError::Storage(format!("write session: {}", e)))?;
        restrict_permissions(&self.session_path);
        Ok(())
    }

    fn read_saved(&self) -> Result<Option<PersistedSession>, SessionError> {
        if !self.session_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.session_path)
            .map_err(|e| SessionError::Storage(format!("read session: {}", e)))?;
        match serde_json::from_str(&content) {
            Ok(saved) => Ok(Some(saved)),
            Err(e) => {
                warn!(error = %e, "malformed session file, discarding");
                self.remove_file()?;
                Ok(None)
            }
        }
    }

    fn remove_file(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.session_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Storage(format!("remove session: {}", e))),
        }
    }

    fn clear_local(&mut self) -> Result<(), SessionError> {
        self.api.set_bearer_token(None);
        self.user = None;
        self.authenticated = false;
        self.remove_file()
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!(error = %e, "could not restrict session file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
