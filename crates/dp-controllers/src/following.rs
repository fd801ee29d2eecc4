//! "Charities you follow": list plus unfollow, re-fetched after each change.

use std::sync::Arc;

use dp_core::{AppError, Credential, FollowApi, FollowId, FollowedCharity, Notice, Notifier};
use tokio::sync::RwLock;

use crate::sequencer::{Refresh, RequestSequencer};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowingState {
    pub follows: Vec<FollowedCharity>,
    pub error: Option<String>,
}

pub struct FollowingList {
    api: Arc<dyn FollowApi>,
    credential: Credential,
    notifier: Arc<dyn Notifier>,
    sequencer: RequestSequencer,
    state: RwLock<FollowingState>,
}

impl FollowingList {
    pub fn new(api: Arc<dyn FollowApi>, credential: Credential, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            credential,
            notifier,
            sequencer: RequestSequencer::new(),
            state: RwLock::new(FollowingState::default()),
        }
    }

    pub async fn snapshot(&self) -> FollowingState {
        self.state.read().await.clone()
    }

    pub async fn load(&self) -> Refresh {
        let ticket = self.sequencer.issue();
        let result = self.api.list_following(&self.credential).await;

        let mut state = self.state.write().await;
        if !self.sequencer.is_latest(ticket) {
            return Refresh::Superseded;
        }
        match result {
            Ok(follows) => {
                *state = FollowingState { follows, error: None };
                Refresh::Applied
            }
            Err(err) => {
                let message = err.user_message("We couldn't load the charities you follow.");
                *state = FollowingState {
                    follows: Vec::new(),
                    error: Some(message.clone()),
                };
                drop(state);
                self.notifier.notify(Notice::error(message));
                Refresh::Failed(err)
            }
        }
    }

    /// Removes one follow relationship and reloads the list.
    pub async fn unfollow(&self, follow: FollowId) -> Result<(), AppError> {
        let name = self
            .state
            .read()
            .await
            .follows
            .iter()
            .find(|f| f.id == follow)
            .map(|f| f.charity.name.clone());

        if let Err(err) = self.api.remove_follow(&self.credential, follow).await {
            tracing::warn!(follow, error = %err, "unfollow failed");
            self.notifier
                .notify(Notice::error(err.user_message("Couldn't unfollow this charity.")));
            return Err(err);
        }

        tracing::info!(follow, "unfollowed");
        self.notifier.notify(Notice::success(match name {
            Some(name) => format!("You unfollowed {name}."),
            None => "Charity unfollowed.".to_string(),
        }));
        self.load().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dp_core::{Charity, MockFollowApi};
    use mockall::predicate::{always, eq};

    use super::*;
    use crate::notify::NoticeBoard;

    fn followed(id: i64, name: &str) -> FollowedCharity {
        FollowedCharity {
            id,
            charity: Charity {
                id: id * 100,
                name: name.into(),
                description: None,
                category: None,
                region: None,
                logo_url: None,
                total_received: None,
                created_at: None,
                verified: false,
            },
            followed_at: None,
        }
    }

    #[tokio::test]
    async fn unfollow_reloads_from_the_server() {
        let mut api = MockFollowApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_list_following()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![followed(1, "Ocean Aid"), followed(2, "Book Bus")]));
        api.expect_remove_follow()
            .with(always(), eq(1))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        api.expect_list_following()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![followed(2, "Book Bus")]));

        let board = Arc::new(NoticeBoard::new());
        let list = FollowingList::new(Arc::new(api), Credential::new("t"), board.clone());
        list.load().await;
        list.unfollow(1).await.unwrap();

        assert_eq!(list.snapshot().await.follows.len(), 1);
        assert_eq!(
            board.snapshot().last().map(|n| n.message.clone()),
            Some("You unfollowed Ocean Aid.".to_string())
        );
    }

    #[tokio::test]
    async fn failed_unfollow_leaves_list_intact() {
        let mut api = MockFollowApi::new();
        api.expect_list_following()
            .times(1)
            .returning(|_| Ok(vec![followed(1, "Ocean Aid")]));
        api.expect_remove_follow()
            .returning(|_, _| Err(AppError::Transport("timeout".into())));

        let board = Arc::new(NoticeBoard::new());
        let list = FollowingList::new(Arc::new(api), Credential::new("t"), board.clone());
        list.load().await;
        assert!(list.unfollow(1).await.is_err());
        assert_eq!(list.snapshot().await.follows.len(), 1);
        assert_eq!(board.errors(), vec!["Couldn't unfollow this charity.".to_string()]);
    }
}
