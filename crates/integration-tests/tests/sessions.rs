//! Session revocation against the fake backend.

use std::sync::Arc;

use dp_controllers::{NoticeBoard, PendingRevocation, SessionManager};
use dp_core::Credential;
use dp_http_reqwest::{HttpBackend, DEFAULT_USER_AGENT};
use integration_tests::{FakeBackend, TEST_TOKEN};

fn manager(backend: &FakeBackend, board: Arc<NoticeBoard>) -> SessionManager {
    let http = Arc::new(HttpBackend::new(backend.base_url(), DEFAULT_USER_AGENT).unwrap());
    SessionManager::new(http, Credential::new(TEST_TOKEN), board)
}

#[tokio::test]
async fn revoke_all_signs_out_every_other_session() {
    let backend = FakeBackend::start().await;
    let board = Arc::new(NoticeBoard::new());
    let manager = manager(&backend, board.clone());
    manager.load().await;

    let state = manager.snapshot().await;
    assert_eq!(state.sessions.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 1, 3, 4]);
    assert!(manager.request_revoke(2).await.is_err());

    manager.request_revoke_all().await.unwrap();
    assert_eq!(
        manager.snapshot().await.pending,
        Some(PendingRevocation::AllOthers { count: 3 })
    );
    assert_eq!(manager.confirm().await, Ok(3));

    let state = manager.snapshot().await;
    assert_eq!(state.sessions.len(), 1);
    assert!(state.sessions[0].is_current);
    assert!(!state.can_revoke_all());
    assert_eq!(
        board.snapshot().last().map(|n| n.message.clone()),
        Some("Signed out of 3 other sessions.".to_string())
    );
}

#[tokio::test]
async fn revoking_one_session_leaves_the_rest() {
    let backend = FakeBackend::start().await;
    let manager = manager(&backend, Arc::new(NoticeBoard::new()));
    manager.load().await;

    manager.request_revoke(3).await.unwrap();
    assert_eq!(manager.confirm().await, Ok(1));
    let ids: Vec<i64> = manager.snapshot().await.sessions.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![2, 1, 4]);
}
