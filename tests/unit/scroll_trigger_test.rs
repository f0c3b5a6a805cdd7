//! Integration tests for the infinite scroll trigger.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use rstest::rstest;
use skillforge::managers::history_store::HistoryStore;
use skillforge::managers::scroll_trigger::{InfiniteScroll, TriggerOutcome};
use support::{entries, FakeHistoryApi};

async fn setup(total: usize) -> (
    Arc<FakeHistoryApi>,
    Arc<HistoryStore<FakeHistoryApi>>,
    InfiniteScroll<FakeHistoryApi>,
) {
    let api = Arc::new(FakeHistoryApi::with_entries(entries(total)));
    let store = Arc::new(HistoryStore::new(Arc::clone(&api), 3));
    store.load_first_page().await.unwrap();
    let scroll = InfiniteScroll::new(Arc::clone(&store), 1.0);
    (api, store, scroll)
}

#[tokio::test]
async fn test_rising_edge_loads_once() {
    let (api, store, scroll) = setup(9).await;
    let mut observer = scroll.observe().unwrap();

    assert_eq!(observer.on_intersection(1.0).await.unwrap(), TriggerOutcome::Triggered);
    // Still visible on following frames: no further loads.
    assert_eq!(observer.on_intersection(1.0).await.unwrap(), TriggerOutcome::Ignored);
    assert_eq!(observer.on_intersection(1.0).await.unwrap(), TriggerOutcome::Ignored);

    assert_eq!(api.fetch_count(), 2);
    assert_eq!(store.entries().len(), 6);
}

#[tokio::test]
async fn test_leaving_and_reentering_viewport_loads_again() {
    let (api, _store, scroll) = setup(9).await;
    let mut observer = scroll.observe().unwrap();

    observer.on_intersection(1.0).await.unwrap();
    assert_eq!(observer.on_intersection(0.2).await.unwrap(), TriggerOutcome::Ignored);
    assert_eq!(observer.on_intersection(1.0).await.unwrap(), TriggerOutcome::Triggered);
    assert_eq!(api.fetches(), vec![(3, 0), (3, 3), (3, 6)]);
}

#[rstest]
#[case(0.0)]
#[case(0.5)]
#[case(0.99)]
#[tokio::test]
async fn test_partial_visibility_below_threshold_is_ignored(#[case] ratio: f64) {
    let (api, _store, scroll) = setup(9).await;
    let mut observer = scroll.observe().unwrap();
    assert_eq!(observer.on_intersection(ratio).await.unwrap(), TriggerOutcome::Ignored);
    assert_eq!(api.fetch_count(), 1);
}

#[tokio::test]
async fn test_custom_threshold() {
    let api = Arc::new(FakeHistoryApi::with_entries(entries(9)));
    let store = Arc::new(HistoryStore::new(Arc::clone(&api), 3));
    store.load_first_page().await.unwrap();
    let scroll = InfiniteScroll::new(Arc::clone(&store), 0.5);

    let mut observer = scroll.observe().unwrap();
    assert_eq!(observer.on_intersection(0.6).await.unwrap(), TriggerOutcome::Triggered);
}

#[tokio::test]
async fn test_edge_while_store_busy_is_suppressed_and_stays_armed() {
    let (api, store, scroll) = setup(9).await;
    let mut observer = scroll.observe().unwrap();

    let (refresh, outcome) = tokio::join!(store.refresh(), observer.on_intersection(1.0));
    assert!(refresh.is_ok());
    assert_eq!(outcome.unwrap(), TriggerOutcome::Suppressed);

    // The sentinel never left the viewport, yet the next report fires.
    assert_eq!(observer.on_intersection(1.0).await.unwrap(), TriggerOutcome::Triggered);
    assert_eq!(api.fetches(), vec![(3, 0), (3, 0), (3, 3)]);
}

/// Validates: `Triggered` is reported only for reports that sent a page request.
#[tokio::test]
async fn test_triggered_only_when_a_page_was_requested() {
    let (api, store, scroll) = setup(30).await;
    let mut observer = scroll.observe().unwrap();
    let mut triggered = 0;

    for _ in 0..3 {
        let (next, outcome) = tokio::join!(store.load_next_page(), observer.on_intersection(1.0));
        assert_eq!(next, Ok(true));
        let outcome = outcome.unwrap();
        assert_ne!(outcome, TriggerOutcome::Triggered);
        if observer.on_intersection(1.0).await.unwrap() == TriggerOutcome::Triggered {
            triggered += 1;
        }
        observer.on_intersection(0.0).await.unwrap();
    }

    let next_page_fetches = api.fetches().iter().filter(|(_, offset)| *offset > 0).count();
    assert_eq!(triggered, 3);
    assert_eq!(next_page_fetches, 3 + triggered);
    assert_eq!(store.entries().len(), 21);
}

#[tokio::test]
async fn test_exhausted_when_no_more_pages() {
    let (api, store, scroll) = setup(5).await;
    let mut observer = scroll.observe().unwrap();

    assert_eq!(observer.on_intersection(1.0).await.unwrap(), TriggerOutcome::Triggered);
    assert!(!store.has_more());
    assert!(!observer.is_live());
    assert_eq!(observer.on_intersection(0.0).await.unwrap(), TriggerOutcome::Exhausted);
    assert_eq!(observer.on_intersection(1.0).await.unwrap(), TriggerOutcome::Exhausted);
    assert_eq!(api.fetch_count(), 2);
}

#[tokio::test]
async fn test_observe_refused_without_more_pages() {
    let (_api, _store, scroll) = setup(2).await;
    assert!(scroll.observe().is_none());
    assert_eq!(scroll.active_observers(), 0);
}

#[tokio::test]
async fn test_dropping_observer_releases_observation() {
    let (_api, _store, scroll) = setup(9).await;
    let first = scroll.observe().unwrap();
    let second = scroll.observe().unwrap();
    assert_eq!(scroll.active_observers(), 2);

    drop(first);
    assert_eq!(scroll.active_observers(), 1);
    drop(second);
    assert_eq!(scroll.active_observers(), 0);
}

#[tokio::test]
async fn test_observer_released_on_early_return() {
    let (_api, _store, scroll) = setup(9).await;

    async fn use_and_bail(scroll: &InfiniteScroll<FakeHistoryApi>) -> Option<()> {
        let _observer = scroll.observe()?;
        None::<()>?;
        Some(())
    }

    assert!(use_and_bail(&scroll).await.is_none());
    assert_eq!(scroll.active_observers(), 0);
}
