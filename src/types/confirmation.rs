use serde::Serialize;

/// A destructive action waiting for the user's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Delete { target_id: String },
    Clear,
}

impl ConfirmAction {
    pub fn title(&self) -> &'static str {
        match self {
            ConfirmAction::Delete { .. } => "Delete History Item",
            ConfirmAction::Clear => "Clear All History",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ConfirmAction::Delete { .. } => "Are you sure you want to delete this history item?",
            ConfirmAction::Clear => {
                "Are you sure you want to clear all history? This action cannot be undone."
            }
        }
    }

    pub(crate) fn success_message(&self) -> &'static str {
        match self {
            ConfirmAction::Delete { .. } => "History item deleted successfully",
            ConfirmAction::Clear => "All history cleared successfully",
        }
    }
}

/// State of the confirmation gate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Idle,
    AwaitingConfirmation(ConfirmAction),
}

/// Which kind of action a confirmation dialog is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    None,
    Delete,
    Clear,
}

/// Flat dialog view of [`GateState`] for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub is_open: bool,
    pub action: ActionKind,
    pub target_id: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
}

impl From<&GateState> for ConfirmationRequest {
    fn from(state: &GateState) -> Self {
        match state {
            GateState::Idle => Self {
                is_open: false,
                action: ActionKind::None,
                target_id: None,
                title: None,
                message: None,
            },
            GateState::AwaitingConfirmation(action) => {
                let (kind, target_id) = match action {
                    ConfirmAction::Delete { target_id } => {
                        (ActionKind::Delete, Some(target_id.clone()))
                    }
                    ConfirmAction::Clear => (ActionKind::Clear, None),
                };
                Self {
                    is_open: true,
                    action: kind,
                    target_id,
                    title: Some(action.title().to_string()),
                    message: Some(action.message().to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient user-visible message emitted after a confirmed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}
