//! Integration tests for the history store: pagination, in-flight guards,
//! stale-response handling and error retention.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use skillforge::managers::history_store::HistoryStore;
use skillforge::types::errors::{ApiError, HistoryError};
use support::{entries, entry, FakeHistoryApi};

fn setup(total: usize) -> (Arc<FakeHistoryApi>, HistoryStore<FakeHistoryApi>) {
    let api = Arc::new(FakeHistoryApi::with_entries(entries(total)));
    let store = HistoryStore::new(Arc::clone(&api), 3);
    (api, store)
}

fn ids(store: &HistoryStore<FakeHistoryApi>) -> Vec<String> {
    store.entries().into_iter().map(|e| e.id).collect()
}

// ─── First page ───

#[tokio::test]
async fn test_first_page_replaces_collection() {
    let (api, store) = setup(5);
    store.load_first_page().await.unwrap();

    assert_eq!(ids(&store), vec!["1", "2", "3"]);
    assert!(store.has_more());
    assert!(!store.is_loading());
    assert_eq!(api.fetches(), vec![(3, 0)]);
}

#[tokio::test]
async fn test_first_page_short_means_no_more() {
    let (_api, store) = setup(2);
    store.load_first_page().await.unwrap();
    assert_eq!(ids(&store), vec!["1", "2"]);
    assert!(!store.has_more());
}

#[tokio::test]
async fn test_empty_history_has_no_more() {
    let (_api, store) = setup(0);
    store.load_first_page().await.unwrap();
    let snapshot = store.snapshot();
    assert!(snapshot.is_empty());
    assert!(!snapshot.has_more);
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn test_first_page_failure_keeps_previous_pages() {
    let (api, store) = setup(5);
    store.load_first_page().await.unwrap();

    api.fail_fetch(true);
    let err = store.refresh().await.unwrap_err();
    assert!(matches!(err, HistoryError::Fetch(_)));
    assert_eq!(ids(&store), vec!["1", "2", "3"]);
    assert!(store.error().unwrap().contains("connection refused"));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_oversized_first_page_is_dropped() {
    let (api, store) = setup(5);
    api.script(Ok(entries(4)));

    let err = store.load_first_page().await.unwrap_err();
    assert!(matches!(err, HistoryError::ConsistencyViolation(_)));
    assert!(store.entries().is_empty());
    assert!(!store.is_loading());
}

// ─── Next page ───

/// Validates: a page of exactly `limit` entries keeps `has_more`, a short one clears it.
#[tokio::test]
async fn test_next_page_appends_until_short_page() {
    let (api, store) = setup(5);
    store.load_first_page().await.unwrap();
    store.load_next_page().await.unwrap();

    assert_eq!(ids(&store), vec!["1", "2", "3", "4", "5"]);
    assert!(!store.has_more());
    assert_eq!(store.page_count(), 2);

    // Nothing more to load: no request is issued.
    store.load_next_page().await.unwrap();
    assert_eq!(api.fetches(), vec![(3, 0), (3, 3)]);
}

#[tokio::test]
async fn test_exactly_full_last_page_costs_one_empty_request() {
    let (api, store) = setup(6);
    store.load_first_page().await.unwrap();
    store.load_next_page().await.unwrap();
    assert!(store.has_more());

    store.load_next_page().await.unwrap();
    assert!(!store.has_more());
    assert_eq!(store.entries().len(), 6);
    assert_eq!(api.fetches(), vec![(3, 0), (3, 3), (3, 6)]);
}

#[tokio::test]
async fn test_next_page_before_first_load_is_noop() {
    let (api, store) = setup(5);
    assert!(!store.load_next_page().await.unwrap());
    assert_eq!(api.fetch_count(), 0);
}

/// Validates: a second `load_next_page` while one is in flight issues no request.
#[tokio::test]
async fn test_concurrent_next_page_calls_fetch_once() {
    let (api, store) = setup(9);
    store.load_first_page().await.unwrap();

    let (a, b) = tokio::join!(store.load_next_page(), store.load_next_page());
    assert_eq!((a, b), (Ok(true), Ok(false)));

    assert_eq!(api.fetches(), vec![(3, 0), (3, 3)]);
    assert_eq!(ids(&store), vec!["1", "2", "3", "4", "5", "6"]);
}

#[tokio::test]
async fn test_next_page_while_first_page_loading_is_noop() {
    let (api, store) = setup(9);
    store.load_first_page().await.unwrap();

    let (first, next) = tokio::join!(store.refresh(), store.load_next_page());
    assert!(first.is_ok() && next.is_ok());
    assert_eq!(api.fetches(), vec![(3, 0), (3, 0)]);
    assert_eq!(store.entries().len(), 3);
}

#[tokio::test]
async fn test_next_page_failure_keeps_pages_and_allows_retry() {
    let (api, store) = setup(5);
    store.load_first_page().await.unwrap();

    api.fail_fetch(true);
    assert!(matches!(
        store.load_next_page().await,
        Err(HistoryError::Fetch(_))
    ));
    assert_eq!(ids(&store), vec!["1", "2", "3"]);
    assert!(store.has_more());
    assert!(!store.is_loading_more());

    api.fail_fetch(false);
    store.load_next_page().await.unwrap();
    assert_eq!(store.entries().len(), 5);
    assert!(store.error().is_none());
}

#[tokio::test]
async fn test_duplicate_ids_skipped_but_offset_advances() {
    let (api, store) = setup(9);
    store.load_first_page().await.unwrap();

    api.script(Ok(vec![entry("3"), entry("4"), entry("5")]));
    store.load_next_page().await.unwrap();
    assert_eq!(ids(&store), vec!["1", "2", "3", "4", "5"]);
    assert!(store.has_more());

    store.load_next_page().await.unwrap();
    assert_eq!(api.fetches().last(), Some(&(3, 6)));
}

#[tokio::test]
async fn test_server_error_surfaces_message() {
    let (api, store) = setup(5);
    api.script(Err(ApiError::Server {
        status: 200,
        message: "Failed to fetch history".to_string(),
    }));
    assert!(store.load_first_page().await.is_err());
    assert!(store.error().unwrap().contains("Failed to fetch history"));
}

// ─── Lifecycle ───

#[tokio::test]
async fn test_response_after_unmount_is_discarded() {
    let (api, store) = setup(5);
    api.hold_fetches(true);

    let (result, _) = tokio::join!(store.load_first_page(), async {
        tokio::task::yield_now().await;
        store.unmount();
        api.release(1);
    });

    assert!(result.is_ok());
    assert!(!store.is_mounted());
    assert!(store.entries().is_empty());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_remount_ignores_previous_view_response() {
    let (api, store) = setup(5);
    api.hold_fetches(true);

    let _ = tokio::join!(store.load_first_page(), async {
        tokio::task::yield_now().await;
        store.mount();
        api.release(1);
    });
    assert!(store.entries().is_empty());

    api.hold_fetches(false);
    store.load_first_page().await.unwrap();
    assert_eq!(store.entries().len(), 3);
}

#[tokio::test]
async fn test_unmounted_store_does_not_fetch() {
    let (api, store) = setup(5);
    store.unmount();
    store.load_first_page().await.unwrap();
    store.load_next_page().await.unwrap();
    assert_eq!(api.fetch_count(), 0);
}

#[tokio::test]
async fn test_subscribers_see_loaded_snapshot() {
    let (_api, store) = setup(5);
    let mut rx = store.subscribe();
    store.load_first_page().await.unwrap();

    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.ids(), vec!["1", "2", "3"]);
    assert!(snapshot.has_more);
    assert!(!snapshot.loading);
}

#[test]
fn test_zero_page_size_is_raised_to_one() {
    let api = Arc::new(FakeHistoryApi::with_entries(entries(2)));
    let store = HistoryStore::new(api, 0);
    assert_eq!(store.page_size(), 1);
}
