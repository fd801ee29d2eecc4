//! # BrowsePage
//!
//! The charity directory screen: a [`ListBrowser`] plus the follow statuses
//! of whatever it currently shows. Each time the list is replaced the status
//! fan-out re-runs over the new ids; when the list falls back to its empty
//! state the statuses are dropped with it.

use std::sync::Arc;

use dp_core::{
    AppError, CharityDirectory, CharityId, Credential, FollowApi, FollowState, FollowStatusMap,
    ListQuery, Notifier, SortKey,
};

use crate::follow_status::FollowStatusAggregator;
use crate::list_browser::{BrowserState, ListBrowser};
use crate::sequencer::Refresh;

pub struct BrowsePage {
    browser: ListBrowser,
    follows: FollowStatusAggregator,
}

impl BrowsePage {
    pub fn new(
        directory: Arc<dyn CharityDirectory>,
        follow_api: Arc<dyn FollowApi>,
        credential: Option<Credential>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_query(directory, follow_api, credential, notifier, ListQuery::default())
    }

    pub fn with_query(
        directory: Arc<dyn CharityDirectory>,
        follow_api: Arc<dyn FollowApi>,
        credential: Option<Credential>,
        notifier: Arc<dyn Notifier>,
        query: ListQuery,
    ) -> Self {
        Self {
            browser: ListBrowser::with_query(directory, notifier.clone(), query),
            follows: FollowStatusAggregator::new(follow_api, credential, notifier),
        }
    }

    pub fn browser(&self) -> &ListBrowser {
        &self.browser
    }

    pub async fn snapshot(&self) -> (BrowserState, FollowStatusMap) {
        (self.browser.snapshot().await, self.follows.statuses().await)
    }

    pub async fn load(&self) -> Refresh {
        let outcome = self.browser.load().await;
        self.sync_follows(&outcome).await;
        outcome
    }

    pub async fn set_search_term(&self, term: impl Into<String>) -> Refresh {
        let outcome = self.browser.set_search_term(term).await;
        self.sync_follows(&outcome).await;
        outcome
    }

    pub async fn set_category(&self, category: impl Into<String>) -> Refresh {
        let outcome = self.browser.set_category(category).await;
        self.sync_follows(&outcome).await;
        outcome
    }

    pub async fn set_region(&self, region: impl Into<String>) -> Refresh {
        let outcome = self.browser.set_region(region).await;
        self.sync_follows(&outcome).await;
        outcome
    }

    pub async fn set_sort(&self, sort: SortKey) -> Refresh {
        let outcome = self.browser.set_sort(sort).await;
        self.sync_follows(&outcome).await;
        outcome
    }

    pub async fn go_to_page(&self, page: u32) -> Refresh {
        let outcome = self.browser.go_to_page(page).await;
        self.sync_follows(&outcome).await;
        outcome
    }

    pub async fn reset_filters(&self) -> Refresh {
        let outcome = self.browser.reset_filters().await;
        self.sync_follows(&outcome).await;
        outcome
    }

    /// Toggles following `charity`, then re-runs the statuses of whatever
    /// the page shows once the change has gone through.
    pub async fn toggle_follow(&self, charity: CharityId) -> Result<FollowState, AppError> {
        let state = self.follows.toggle(charity).await?;
        self.refresh_visible().await;
        Ok(state)
    }

    async fn refresh_visible(&self) -> Refresh {
        self.follows
            .refresh_from(async { self.browser.snapshot().await.item_ids() })
            .await
    }

    async fn sync_follows(&self, outcome: &Refresh) {
        match outcome {
            Refresh::Applied => {
                self.refresh_visible().await;
            }
            Refresh::Failed(_) => self.follows.clear().await,
            Refresh::Superseded | Refresh::Skipped => {}
        }
    }
}
