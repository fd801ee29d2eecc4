//! # FollowStatusAggregator
//!
//! Fans out one follow-status request per listed charity, waits for all of
//! them, then commits the whole map at once. A failed lookup counts as "not
//! following" for that charity only. Without a credential nothing is fetched
//! and every charity reads as [`FollowState::Unknown`].

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use dp_core::{
    AppError, CharityId, Credential, FollowApi, FollowState, FollowStatusMap, Notice, Notifier,
};
use tokio::sync::RwLock;

use crate::scatter::scatter_gather;
use crate::sequencer::{Refresh, RequestSequencer};

pub struct FollowStatusAggregator {
    api: Arc<dyn FollowApi>,
    credential: Option<Credential>,
    notifier: Arc<dyn Notifier>,
    sequencer: RequestSequencer,
    statuses: RwLock<FollowStatusMap>,
}

impl FollowStatusAggregator {
    pub fn new(
        api: Arc<dyn FollowApi>,
        credential: Option<Credential>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            credential,
            notifier,
            sequencer: RequestSequencer::new(),
            statuses: RwLock::new(FollowStatusMap::default()),
        }
    }

    pub async fn statuses(&self) -> FollowStatusMap {
        self.statuses.read().await.clone()
    }

    pub async fn state(&self, charity: CharityId) -> FollowState {
        self.statuses.read().await.state(charity)
    }

    /// Drops every status, e.g. after the underlying list failed to load.
    pub async fn clear(&self) {
        // Invalidate in-flight fan-outs too.
        self.sequencer.issue();
        *self.statuses.write().await = FollowStatusMap::default();
    }

    /// Re-resolves the status of exactly `ids`, replacing the previous map.
    pub async fn refresh(&self, ids: &[CharityId]) -> Refresh {
        self.refresh_from(std::future::ready(ids.to_vec())).await
    }

    /// Like [`refresh`](Self::refresh), but the ticket is taken before `ids`
    /// resolves. A list replaced after that point issues a newer fan-out,
    /// which supersedes this one.
    pub async fn refresh_from<F>(&self, ids: F) -> Refresh
    where
        F: Future<Output = Vec<CharityId>>,
    {
        let Some(credential) = self.credential.clone() else {
            self.clear().await;
            return Refresh::Skipped;
        };

        let ticket = self.sequencer.issue();
        let unique: BTreeSet<CharityId> = ids.await.into_iter().collect();
        tracing::debug!(?ticket, count = unique.len(), "fanning out follow-status lookups");

        let api = &self.api;
        let credential = &credential;
        let settled = scatter_gather(
            unique,
            |id| async move { api.follow_status(credential, id).await },
            |id, err| {
                tracing::warn!(charity = id, error = %err, "follow-status lookup failed");
                false
            },
        )
        .await;

        let mut statuses = self.statuses.write().await;
        if !self.sequencer.is_latest(ticket) {
            tracing::debug!(?ticket, "discarding superseded follow statuses");
            return Refresh::Superseded;
        }
        *statuses = settled.into_iter().collect();
        Refresh::Applied
    }

    /// Follows or unfollows `charity` depending on its current status and
    /// returns the status after the change. A charity missing from the map is
    /// looked up first. The map itself is left for the caller to re-run.
    pub async fn toggle(&self, charity: CharityId) -> Result<FollowState, AppError> {
        let Some(credential) = self.credential.as_ref() else {
            let err = AppError::Unauthorized("Sign in to follow charities.".into());
            self.notifier.notify(Notice::error(err.user_message("")));
            return Err(err);
        };

        let following = match self.state(charity).await {
            FollowState::Following => true,
            FollowState::NotFollowing => false,
            FollowState::Unknown => match self.api.follow_status(credential, charity).await {
                Ok(following) => following,
                Err(err) => {
                    tracing::warn!(charity, error = %err, "follow-status lookup before toggle failed");
                    self.notifier.notify(Notice::error(
                        err.user_message("Couldn't check whether you follow this charity."),
                    ));
                    return Err(err);
                }
            },
        };

        let result = if following {
            self.api.unfollow(credential, charity).await
        } else {
            self.api.follow(credential, charity).await
        };

        if let Err(err) = result {
            tracing::warn!(charity, error = %err, "follow toggle failed");
            let fallback = if following {
                "Couldn't unfollow this charity."
            } else {
                "Couldn't follow this charity."
            };
            self.notifier.notify(Notice::error(err.user_message(fallback)));
            return Err(err);
        }

        tracing::info!(charity, following = !following, "follow status changed");
        self.notifier.notify(Notice::success(if following {
            "You're no longer following this charity."
        } else {
            "You're now following this charity."
        }));

        Ok(if following {
            FollowState::NotFollowing
        } else {
            FollowState::Following
        })
    }
}
