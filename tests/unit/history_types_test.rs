//! Unit tests for history, confirmation and session data types.

use rstest::rstest;
use serde_json::json;

use skillforge::types::confirmation::{
    ActionKind, ConfirmAction, ConfirmationRequest, GateState, Notification, NotificationLevel,
};
use skillforge::types::history::{
    HistoryEntry, HistorySnapshot, MetadataValue, Page, RouteType, Timestamp,
};
use skillforge::types::session::UserProfile;

fn sample_entry() -> serde_json::Value {
    json!({
        "id": "65f1c2",
        "routeType": "email-assistant",
        "inputData": "Ask for a deadline extension",
        "outputData": "Dear Professor,",
        "metadata": {"tone": "formal", "wordCount": 120, "flags": ["draft"]},
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

// ─── HistoryEntry ───

#[test]
fn test_entry_deserializes_camel_case() {
    let entry: HistoryEntry = serde_json::from_value(sample_entry()).unwrap();
    assert_eq!(entry.id, "65f1c2");
    assert_eq!(entry.route_type, RouteType::EmailAssistant);
    assert_eq!(entry.input_data, "Ask for a deadline extension");
    assert_eq!(entry.created_at, Timestamp::Iso("2024-05-01T10:00:00Z".to_string()));
}

#[test]
fn test_entry_metadata_tolerates_open_schema() {
    let entry: HistoryEntry = serde_json::from_value(sample_entry()).unwrap();
    assert_eq!(entry.metadata["tone"], MetadataValue::Text("formal".to_string()));
    assert!(matches!(entry.metadata["wordCount"], MetadataValue::Number(_)));
    assert!(matches!(entry.metadata["flags"], MetadataValue::Other(_)));
    assert_eq!(entry.metadata["wordCount"].to_string(), "120");
}

#[test]
fn test_entry_numeric_id_and_epoch_timestamp() {
    let entry: HistoryEntry = serde_json::from_value(json!({
        "id": 17,
        "routeType": "summarizer",
        "createdAt": 1714557600000i64
    }))
    .unwrap();
    assert_eq!(entry.id, "17");
    assert_eq!(entry.created_at, Timestamp::Epoch(1714557600000));
    assert!(entry.metadata.is_empty());
    assert!(entry.input_data.is_empty());
}

#[test]
fn test_entry_preview_truncates_display_only() {
    let mut entry: HistoryEntry = serde_json::from_value(sample_entry()).unwrap();
    entry.input_data = "é".repeat(10);
    assert_eq!(entry.input_preview(4), "éééé…");
    assert_eq!(entry.input_preview(10), "é".repeat(10));
    assert_eq!(entry.input_data.chars().count(), 10);
}

// ─── RouteType ───

#[rstest]
#[case("resume-optimizer", RouteType::ResumeOptimizer)]
#[case("summarizer", RouteType::Summarizer)]
#[case("code-explainer", RouteType::CodeExplainer)]
#[case("email-assistant", RouteType::EmailAssistant)]
#[case("code-quiz", RouteType::CodeQuiz)]
#[case("quiz", RouteType::CodeQuiz)]
#[case("Email", RouteType::EmailAssistant)]
fn test_route_type_parsing(#[case] tag: &str, #[case] expected: RouteType) {
    assert_eq!(RouteType::from(tag), expected);
}

#[test]
fn test_unknown_route_type_kept_verbatim() {
    let route = RouteType::from("image-captioner");
    assert_eq!(route, RouteType::Other("image-captioner".to_string()));
    assert_eq!(serde_json::to_value(&route).unwrap(), json!("image-captioner"));
    assert_eq!(route.display_name(), "image-captioner");
}

#[test]
fn test_route_type_serializes_canonical_tag() {
    assert_eq!(
        serde_json::to_value(RouteType::CodeExplainer).unwrap(),
        json!("code-explainer")
    );
    assert_eq!(RouteType::CodeQuiz.display_name(), "Code Quiz Generator");
}

// ─── Page / Snapshot ───

#[test]
fn test_page_next_offset_counts_fetched() {
    let entries: Vec<HistoryEntry> = (0..3)
        .map(|i| {
            let mut v = sample_entry();
            v["id"] = json!(i);
            serde_json::from_value(v).unwrap()
        })
        .collect();
    let page = Page::new(6, 3, entries);
    assert!(page.has_more);
    assert_eq!(page.next_offset(), 9);
}

#[test]
fn test_default_snapshot_is_empty() {
    let snapshot = HistorySnapshot::default();
    assert!(snapshot.is_empty());
    assert!(!snapshot.loading);
    assert!(!snapshot.has_more);
}

// ─── Confirmation ───

#[test]
fn test_idle_request_is_closed() {
    let request = ConfirmationRequest::from(&GateState::Idle);
    assert!(!request.is_open);
    assert_eq!(request.action, ActionKind::None);
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({"isOpen": false, "action": "none", "targetId": null, "title": null, "message": null})
    );
}

#[test]
fn test_clear_request_has_no_target() {
    let request = ConfirmationRequest::from(&GateState::AwaitingConfirmation(ConfirmAction::Clear));
    assert_eq!(request.action, ActionKind::Clear);
    assert!(request.target_id.is_none());
    assert_eq!(
        request.message.as_deref(),
        Some("Are you sure you want to clear all history? This action cannot be undone.")
    );
}

#[test]
fn test_notification_serializes_level() {
    let note = Notification::error("Operation failed. Please try again.");
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(
        serde_json::to_value(&note).unwrap(),
        json!({"level": "error", "message": "Operation failed. Please try again."})
    );
}

// ─── Session ───

#[test]
fn test_user_profile_accepts_mongo_id() {
    let user: UserProfile =
        serde_json::from_value(json!({"_id": "u1", "email": "ada@example.com"})).unwrap();
    assert_eq!(user.id.as_deref(), Some("u1"));
    assert_eq!(user.display_name(), "ada@example.com");
}
