//! Directory browsing end to end: reqwest adapter, fake backend, and the
//! `BrowsePage` controller with its follow-status fan-out.

use std::sync::Arc;

use dp_controllers::{BrowsePage, NoticeBoard, Refresh};
use dp_core::{Credential, FollowState, SortKey};
use dp_http_reqwest::{HttpBackend, DEFAULT_USER_AGENT};
use integration_tests::{count, FakeBackend, BROKEN_CHARITY, BROKEN_TERM, TEST_TOKEN};

async fn page_with(backend: &FakeBackend, credential: Option<Credential>) -> (BrowsePage, Arc<NoticeBoard>) {
    let http = Arc::new(HttpBackend::new(backend.base_url(), DEFAULT_USER_AGENT).unwrap());
    let board = Arc::new(NoticeBoard::new());
    let page = BrowsePage::new(http.clone(), http, credential, board.clone());
    (page, board)
}

#[tokio::test]
async fn paging_through_the_directory_resolves_follow_status_per_page() {
    let backend = FakeBackend::start().await;
    let (page, board) = page_with(&backend, Some(Credential::new(TEST_TOKEN))).await;

    assert_eq!(page.load().await, Refresh::Applied);
    let (state, follows) = page.snapshot().await;
    assert_eq!(state.page.items.len(), 6);
    assert_eq!(state.page.total_pages, 2);
    assert_eq!(state.page.total_count, 7);
    assert!(state.page.has_next());
    assert_eq!(state.item_ids(), vec![3, 2, 1, 4, 5, 7]);
    assert_eq!(follows.len(), 6);
    assert_eq!(follows.state(2), FollowState::Following);
    assert_eq!(follows.state(1), FollowState::NotFollowing);
    // A failed lookup degrades to "not following" instead of failing the page.
    assert_eq!(follows.state(BROKEN_CHARITY), FollowState::NotFollowing);
    assert!(board.errors().is_empty());

    assert_eq!(page.go_to_page(2).await, Refresh::Applied);
    let (state, follows) = page.snapshot().await;
    assert_eq!(state.item_ids(), vec![6]);
    assert!(!state.page.has_next());
    assert_eq!(follows.len(), 1);
    assert_eq!(follows.state(6), FollowState::NotFollowing);
    assert_eq!(follows.state(2), FollowState::Unknown);
    assert_eq!(count(&backend.counters().follow_status), 7);

    assert_eq!(page.go_to_page(1).await, Refresh::Applied);
    let (state, follows) = page.snapshot().await;
    assert_eq!(state.item_ids(), vec![3, 2, 1, 4, 5, 7]);
    assert_eq!(follows.len(), 6);
    assert_eq!(follows.state(6), FollowState::Unknown);
}

#[tokio::test]
async fn filters_reset_the_page_and_serialize_only_what_is_set() {
    let backend = FakeBackend::start().await;
    let (page, _) = page_with(&backend, None).await;
    page.load().await;
    page.go_to_page(2).await;

    assert_eq!(page.set_category("education").await, Refresh::Applied);
    let (state, _) = page.snapshot().await;
    assert_eq!(state.query.page, 1);
    assert_eq!(state.item_ids(), vec![3, 6]);

    let last = backend.state.store().charity_queries.last().cloned().unwrap();
    assert_eq!(last.get("page").map(String::as_str), Some("1"));
    assert_eq!(last.get("category").map(String::as_str), Some("education"));
    assert_eq!(last.get("sort").map(String::as_str), Some("name"));
    assert!(!last.contains_key("q"));
    assert!(!last.contains_key("region"));

    assert_eq!(page.set_sort(SortKey::Newest).await, Refresh::Applied);
    assert_eq!(page.snapshot().await.0.item_ids(), vec![6, 3]);
}

#[tokio::test]
async fn setting_an_unchanged_filter_does_not_refetch() {
    let backend = FakeBackend::start().await;
    let (page, _) = page_with(&backend, None).await;
    page.load().await;
    page.set_region("north").await;
    let before = count(&backend.counters().list_charities);

    assert_eq!(page.set_region("north").await, Refresh::Skipped);
    assert_eq!(count(&backend.counters().list_charities), before);
}

#[tokio::test]
async fn failed_fetch_clears_list_facets_and_follow_statuses() {
    let backend = FakeBackend::start().await;
    let (page, board) = page_with(&backend, Some(Credential::new(TEST_TOKEN))).await;
    page.load().await;
    assert!(!page.snapshot().await.1.is_empty());

    assert!(matches!(page.set_search_term(BROKEN_TERM).await, Refresh::Failed(_)));
    let (state, follows) = page.snapshot().await;
    assert!(state.page.items.is_empty());
    assert!(state.facets.is_empty());
    assert_eq!(state.error.as_deref(), Some("Search is temporarily unavailable"));
    assert!(follows.is_empty());
    assert_eq!(board.errors(), vec!["Search is temporarily unavailable".to_string()]);

    // Recovering replaces the error with data again.
    assert_eq!(page.set_search_term("water").await, Refresh::Applied);
    let (state, _) = page.snapshot().await;
    assert_eq!(state.item_ids(), vec![1]);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn signed_out_browsing_never_asks_for_follow_status() {
    let backend = FakeBackend::start().await;
    let (page, _) = page_with(&backend, None).await;

    assert_eq!(page.load().await, Refresh::Applied);
    let (state, follows) = page.snapshot().await;
    assert_eq!(state.page.items.len(), 6);
    assert!(follows.is_empty());
    assert_eq!(count(&backend.counters().follow_status), 0);
}
