use std::fmt;

// === ApiError ===

/// Errors returned by the remote SkillForge API.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The server could not be reached or the connection failed mid-request.
    Network(String),
    /// The server answered with a failure status or `success: false`.
    Server { status: u16, message: String },
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// The bearer token is missing, expired, or rejected (HTTP 401).
    Unauthorized,
    /// The response body did not have the expected shape.
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            ApiError::NotFound(what) => write!(f, "Not found: {}", what),
            ApiError::Unauthorized => write!(f, "Not authorized"),
            ApiError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

// === HistoryError ===

/// Errors surfaced by the history store.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// A page load failed. Previously loaded pages are kept.
    Fetch(String),
    /// A delete or clear-all request failed.
    Mutation(String),
    /// A response was dropped because it could not be applied safely.
    ConsistencyViolation(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Fetch(msg) => write!(f, "Failed to fetch history: {}", msg),
            HistoryError::Mutation(msg) => write!(f, "History update failed: {}", msg),
            HistoryError::ConsistencyViolation(msg) => {
                write!(f, "History response dropped: {}", msg)
            }
        }
    }
}

impl std::error::Error for HistoryError {}

// === SessionError ===

/// Errors related to login, logout, and session persistence.
#[derive(Debug)]
pub enum SessionError {
    /// The server rejected the credentials or the registration.
    Rejected(String),
    /// The request could not be completed.
    Api(ApiError),
    /// The persisted session file could not be read or written.
    Storage(String),
    /// The sealed token could not be opened.
    Vault(VaultError),
    /// The new password and its confirmation differ.
    PasswordMismatch,
    /// The operation needs a logged-in user.
    NotAuthenticated,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Rejected(msg) => write!(f, "{}", msg),
            SessionError::Api(err) => write!(f, "Session request failed: {}", err),
            SessionError::Storage(msg) => write!(f, "Session storage error: {}", msg),
            SessionError::Vault(err) => write!(f, "Session token error: {}", err),
            SessionError::PasswordMismatch => write!(f, "New passwords do not match"),
            SessionError::NotAuthenticated => write!(f, "Not logged in"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Api(err) => Some(err),
            SessionError::Vault(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        SessionError::Api(err)
    }
}

impl From<VaultError> for SessionError {
    fn from(err: VaultError) -> Self {
        SessionError::Vault(err)
    }
}

// === VaultError ===

/// Errors related to sealing and opening the persisted token.
#[derive(Debug, Clone, PartialEq)]
pub enum VaultError {
    /// Failed to derive the sealing key.
    KeyDerivation(String),
    /// Sealing failed.
    Seal(String),
    /// Opening failed: wrong key, tampered bytes, or bad encoding.
    Open(String),
    /// The system random source failed.
    RandomGeneration(String),
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultError::KeyDerivation(msg) => write!(f, "Key derivation failed: {}", msg),
            VaultError::Seal(msg) => write!(f, "Sealing failed: {}", msg),
            VaultError::Open(msg) => write!(f, "Opening failed: {}", msg),
            VaultError::RandomGeneration(msg) => {
                write!(f, "Random generation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for VaultError {}

// === SettingsError ===

/// Errors related to client settings.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === ToolError ===

/// Errors related to AI tool requests.
#[derive(Debug)]
pub enum ToolError {
    /// The request could not be completed.
    Api(ApiError),
    /// The service answered without a result.
    EmptyResult(String),
    /// A local file could not be read for upload.
    File(String),
    /// A required field was left empty.
    MissingField(&'static str),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Api(err) => write!(f, "{}", err),
            ToolError::EmptyResult(msg) => write!(f, "{}", msg),
            ToolError::File(msg) => write!(f, "Upload file error: {}", msg),
            ToolError::MissingField(field) => write!(f, "Missing required field: {}", field),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for ToolError {
    fn from(err: ApiError) -> Self {
        ToolError::Api(err)
    }
}
