//! # ListBrowser
//!
//! Filterable, sortable, paginated charity directory.
//!
//! Every change to the query issues exactly one fetch. Responses are ticketed
//! (see [`crate::sequencer`]) so a slow response for an outdated query never
//! overwrites the result of a newer one. A failed fetch clears both the items
//! and the facets; the screen never shows stale items next to an error.

use std::sync::Arc;

use dp_core::{
    Charity, CharityDirectory, CharityFacets, CharityId, ListQuery, Notice, Notifier, PageResult,
    SortKey,
};
use tokio::sync::RwLock;

use crate::sequencer::{Refresh, RequestSequencer};

const LOAD_FAILED: &str = "We couldn't load charities. Please try again.";

/// Snapshot of everything the directory screen renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowserState {
    pub query: ListQuery,
    pub page: PageResult<Charity>,
    pub facets: CharityFacets,
    /// Message of the last failed fetch, cleared by the next successful one
    pub error: Option<String>,
    /// Bumped whenever `page` is replaced (by data or by the empty state)
    pub generation: u64,
}

impl BrowserState {
    pub fn item_ids(&self) -> Vec<CharityId> {
        self.page.items.iter().map(|c| c.id).collect()
    }
}

pub struct ListBrowser {
    directory: Arc<dyn CharityDirectory>,
    notifier: Arc<dyn Notifier>,
    sequencer: RequestSequencer,
    state: RwLock<BrowserState>,
}

impl ListBrowser {
    pub fn new(directory: Arc<dyn CharityDirectory>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_query(directory, notifier, ListQuery::default())
    }

    /// Starts from a pre-filled query (e.g. parsed from a deep link).
    pub fn with_query(
        directory: Arc<dyn CharityDirectory>,
        notifier: Arc<dyn Notifier>,
        query: ListQuery,
    ) -> Self {
        Self {
            directory,
            notifier,
            sequencer: RequestSequencer::new(),
            state: RwLock::new(BrowserState {
                query,
                ..Default::default()
            }),
        }
    }

    pub async fn snapshot(&self) -> BrowserState {
        self.state.read().await.clone()
    }

    pub async fn query(&self) -> ListQuery {
        self.state.read().await.query.clone()
    }

    /// Initial load; also usable as an explicit retry.
    pub async fn load(&self) -> Refresh {
        self.update(|_| true).await
    }

    pub async fn set_search_term(&self, term: impl Into<String>) -> Refresh {
        let term = term.into();
        self.update(move |q| replace_filter(&mut q.search_term, term, &mut q.page))
            .await
    }

    pub async fn set_category(&self, category: impl Into<String>) -> Refresh {
        let category = category.into();
        self.update(move |q| replace_filter(&mut q.category, category, &mut q.page))
            .await
    }

    pub async fn set_region(&self, region: impl Into<String>) -> Refresh {
        let region = region.into();
        self.update(move |q| replace_filter(&mut q.region, region, &mut q.page))
            .await
    }

    pub async fn set_sort(&self, sort: SortKey) -> Refresh {
        self.update(move |q| replace_filter(&mut q.sort, sort, &mut q.page))
            .await
    }

    /// Navigates to `page`, clamped to the bounds of the last result.
    pub async fn go_to_page(&self, page: u32) -> Refresh {
        let target = self.state.read().await.page.clamp_page(page);
        self.update(move |q| {
            if q.page == target {
                return false;
            }
            q.page = target;
            true
        })
        .await
    }

    pub async fn next_page(&self) -> Refresh {
        let current = self.state.read().await.query.page;
        self.go_to_page(current.saturating_add(1)).await
    }

    pub async fn previous_page(&self) -> Refresh {
        let current = self.state.read().await.query.page;
        self.go_to_page(current.saturating_sub(1)).await
    }

    /// Restores every filter to its default and goes back to page 1.
    pub async fn reset_filters(&self) -> Refresh {
        self.update(|q| {
            let fresh = ListQuery::default();
            if *q == fresh {
                return false;
            }
            *q = fresh;
            true
        })
        .await
    }

    /// Applies `mutate` to the query and, if it reports a change, fetches.
    async fn update<F>(&self, mutate: F) -> Refresh
    where
        F: FnOnce(&mut ListQuery) -> bool,
    {
        let (ticket, query) = {
            let mut state = self.state.write().await;
            if !mutate(&mut state.query) {
                return Refresh::Skipped;
            }
            (self.sequencer.issue(), state.query.clone())
        };

        tracing::debug!(?ticket, page = query.page, sort = %query.sort, "fetching charities");
        let result = self.directory.list_charities(&query).await;

        let mut state = self.state.write().await;
        if !self.sequencer.is_latest(ticket) {
            tracing::debug!(?ticket, "discarding superseded charity page");
            return Refresh::Superseded;
        }
        state.generation += 1;

        match result {
            Ok(response) => {
                let page = response.page.normalized();
                state.query.page = page.current_page;
                state.page = page;
                state.facets = response.facets;
                state.error = None;
                Refresh::Applied
            }
            Err(err) => {
                tracing::warn!(error = %err, "charity list fetch failed");
                let message = err.user_message(LOAD_FAILED);
                state.page = PageResult::empty();
                state.facets = CharityFacets::default();
                state.error = Some(message.clone());
                drop(state);
                self.notifier.notify(Notice::error(message));
                Refresh::Failed(err)
            }
        }
    }
}

/// Replaces a filter field and resets the page when the value changed.
fn replace_filter<T: PartialEq>(slot: &mut T, value: T, page: &mut u32) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    *page = 1;
    true
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use dp_core::{AppError, CharityPage, MockCharityDirectory};
    use tokio::sync::oneshot;

    use super::*;
    use crate::notify::NoticeBoard;

    fn charity(id: i64) -> Charity {
        Charity {
            id,
            name: format!("Charity {id}"),
            description: None,
            category: Some("health".into()),
            region: Some("north".into()),
            logo_url: None,
            total_received: None,
            created_at: None,
            verified: false,
        }
    }

    fn page_of(ids: &[i64], current: u32, total: u32) -> CharityPage {
        CharityPage {
            page: PageResult {
                items: ids.iter().copied().map(charity).collect(),
                current_page: current,
                total_pages: total,
                total_count: ids.len() as u64,
            },
            facets: CharityFacets {
                categories: vec!["health".into()],
                regions: vec!["north".into()],
            },
        }
    }

    #[tokio::test]
    async fn filter_change_resets_page_before_fetch() {
        let mut directory = MockCharityDirectory::new();
        directory
            .expect_list_charities()
            .withf(|q| q.page == 1 && q.category == "all")
            .times(1)
            .returning(|_| Ok(page_of(&[1, 2], 1, 3)));
        directory
            .expect_list_charities()
            .withf(|q| q.page == 3)
            .times(1)
            .returning(|_| Ok(page_of(&[5], 3, 3)));
        directory
            .expect_list_charities()
            .withf(|q| q.page == 1 && q.category == "health")
            .times(1)
            .returning(|_| Ok(page_of(&[1], 1, 1)));

        let browser = ListBrowser::new(Arc::new(directory), Arc::new(NoticeBoard::new()));
        assert!(browser.load().await.is_applied());
        assert!(browser.go_to_page(3).await.is_applied());
        assert!(browser.set_category("health").await.is_applied());
        assert_eq!(browser.query().await.page, 1);
    }

    #[tokio::test]
    async fn unchanged_filter_issues_no_fetch() {
        let mut directory = MockCharityDirectory::new();
        directory
            .expect_list_charities()
            .times(1)
            .returning(|_| Ok(page_of(&[1], 1, 1)));
        let browser = ListBrowser::new(Arc::new(directory), Arc::new(NoticeBoard::new()));
        browser.load().await;
        assert_eq!(browser.set_region("all").await, Refresh::Skipped);
        assert_eq!(browser.reset_filters().await, Refresh::Skipped);
    }

    #[tokio::test]
    async fn page_navigation_is_clamped() {
        let mut directory = MockCharityDirectory::new();
        directory
            .expect_list_charities()
            .withf(|q| q.page == 1)
            .returning(|_| Ok(page_of(&[1, 2], 1, 2)));
        directory
            .expect_list_charities()
            .withf(|q| q.page == 2)
            .times(1)
            .returning(|_| Ok(page_of(&[3], 2, 2)));
        let browser = ListBrowser::new(Arc::new(directory), Arc::new(NoticeBoard::new()));
        browser.load().await;
        assert!(browser.go_to_page(99).await.is_applied());
        assert_eq!(browser.query().await.page, 2);
        assert_eq!(browser.next_page().await, Refresh::Skipped);
        assert_eq!(browser.go_to_page(0).await, Refresh::Applied);
        assert_eq!(browser.query().await.page, 1);
    }

    #[tokio::test]
    async fn failed_fetch_clears_items_and_facets() {
        let mut directory = MockCharityDirectory::new();
        directory
            .expect_list_charities()
            .withf(|q| q.search_term.is_empty())
            .returning(|_| Ok(page_of(&[1, 2, 3], 1, 1)));
        directory
            .expect_list_charities()
            .withf(|q| q.search_term == "boom")
            .returning(|_| {
                Err(AppError::Status {
                    status: 503,
                    message: None,
                })
            });

        let board = Arc::new(NoticeBoard::new());
        let browser = ListBrowser::new(Arc::new(directory), board.clone());
        browser.load().await;
        assert_eq!(browser.snapshot().await.page.items.len(), 3);

        let outcome = browser.set_search_term("boom").await;
        assert!(matches!(outcome, Refresh::Failed(AppError::Status { status: 503, .. })));

        let state = browser.snapshot().await;
        assert!(state.page.items.is_empty());
        assert!(state.facets.is_empty());
        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED));
        assert_eq!(board.errors(), vec![LOAD_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn reset_filters_restores_defaults_in_one_fetch() {
        let mut directory = MockCharityDirectory::new();
        directory
            .expect_list_charities()
            .returning(|q| Ok(page_of(&[1], q.page, 4)));
        let browser = ListBrowser::with_query(
            Arc::new(directory),
            Arc::new(NoticeBoard::new()),
            ListQuery {
                search_term: "water".into(),
                category: "health".into(),
                region: "north".into(),
                sort: SortKey::Newest,
                page: 3,
            },
        );
        browser.load().await;
        assert!(browser.reset_filters().await.is_applied());
        assert_eq!(browser.query().await, ListQuery::default());
        assert_eq!(browser.snapshot().await.generation, 2);
    }

    /// Directory whose responses are released by the test, per search term.
    struct GatedDirectory {
        gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl CharityDirectory for GatedDirectory {
        async fn list_charities(&self, query: &ListQuery) -> dp_core::Result<CharityPage> {
            let gate = self.gates.lock().unwrap().remove(&query.search_term);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let id = if query.search_term == "slow" { 1 } else { 2 };
            Ok(page_of(&[id], 1, 1))
        }
    }

    #[tokio::test]
    async fn late_response_for_outdated_query_is_discarded() {
        let (release_slow, slow_gate) = oneshot::channel();
        let (release_fast, fast_gate) = oneshot::channel();
        let directory = GatedDirectory {
            gates: Mutex::new(HashMap::from([
                ("slow".to_string(), slow_gate),
                ("fast".to_string(), fast_gate),
            ])),
        };
        let browser = ListBrowser::new(Arc::new(directory), Arc::new(NoticeBoard::new()));

        let (slow, fast, _) = tokio::join!(
            browser.set_search_term("slow"),
            browser.set_search_term("fast"),
            async {
                release_fast.send(()).unwrap();
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                release_slow.send(()).unwrap();
            }
        );

        assert_eq!(fast, Refresh::Applied);
        assert_eq!(slow, Refresh::Superseded);
        let state = browser.snapshot().await;
        assert_eq!(state.query.search_term, "fast");
        assert_eq!(state.item_ids(), vec![2]);
    }
}
