//! # SessionManager
//!
//! Lists the donor's signed-in sessions and revokes them behind an explicit
//! confirmation step. The current session is never revocable, and
//! "sign out everywhere else" is only offered while another session exists.
//! After every revocation the list is re-fetched instead of spliced locally.

use std::sync::Arc;

use dp_core::{AppError, Credential, Notice, Notifier, Session, SessionApi, SessionId};
use tokio::sync::RwLock;

use crate::sequencer::{Refresh, RequestSequencer};

/// A revocation waiting for the donor to confirm it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRevocation {
    One(SessionId),
    AllOthers { count: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub sessions: Vec<Session>,
    pub pending: Option<PendingRevocation>,
    pub error: Option<String>,
}

impl SessionState {
    pub fn other_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_revocable()).count()
    }

    pub fn can_revoke_all(&self) -> bool {
        self.other_sessions() > 0
    }
}

pub struct SessionManager {
    api: Arc<dyn SessionApi>,
    credential: Credential,
    notifier: Arc<dyn Notifier>,
    sequencer: RequestSequencer,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn SessionApi>, credential: Credential, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            credential,
            notifier,
            sequencer: RequestSequencer::new(),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn load(&self) -> Refresh {
        let ticket = self.sequencer.issue();
        let result = self.api.list_sessions(&self.credential).await;

        let mut state = self.state.write().await;
        if !self.sequencer.is_latest(ticket) {
            return Refresh::Superseded;
        }
        match result {
            Ok(mut sessions) => {
                // Current session first, then most recently active.
                sessions.sort_by(|a, b| {
                    b.is_current
                        .cmp(&a.is_current)
                        .then(b.last_active_at.cmp(&a.last_active_at))
                });
                state.sessions = sessions;
                state.error = None;
                Refresh::Applied
            }
            Err(err) => {
                let message = err.user_message("We couldn't load your active sessions.");
                state.sessions.clear();
                state.pending = None;
                state.error = Some(message.clone());
                drop(state);
                self.notifier.notify(Notice::error(message));
                Refresh::Failed(err)
            }
        }
    }

    /// Opens the confirmation for revoking one session.
    pub async fn request_revoke(&self, id: SessionId) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let session = state
            .sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::Validation(format!("No active session with id {id}.")))?;
        if !session.is_revocable() {
            return Err(AppError::Validation(
                "You can't sign out the session you're using right now.".into(),
            ));
        }
        state.pending = Some(PendingRevocation::One(id));
        Ok(())
    }

    /// Opens the confirmation for revoking every other session.
    pub async fn request_revoke_all(&self) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let count = state.other_sessions();
        if count == 0 {
            return Err(AppError::Validation("There are no other sessions to sign out.".into()));
        }
        state.pending = Some(PendingRevocation::AllOthers { count });
        Ok(())
    }

    pub async fn cancel(&self) {
        self.state.write().await.pending = None;
    }

    /// Carries out the pending revocation and reloads the list.
    ///
    /// Returns how many sessions the backend revoked.
    pub async fn confirm(&self) -> Result<u32, AppError> {
        let pending = {
            let mut state = self.state.write().await;
            let pending = state
                .pending
                .take()
                .ok_or_else(|| AppError::Validation("Nothing to confirm.".into()))?;
            if let PendingRevocation::AllOthers { .. } = pending {
                if !state.can_revoke_all() {
                    return Err(AppError::Validation(
                        "There are no other sessions to sign out.".into(),
                    ));
                }
            }
            pending
        };

        let result = match pending {
            PendingRevocation::One(id) => self
                .api
                .revoke_session(&self.credential, id)
                .await
                .map(|()| 1),
            PendingRevocation::AllOthers { .. } => self
                .api
                .revoke_all_sessions(&self.credential)
                .await
                .map(|outcome| outcome.revoked_count),
        };

        match result {
            Ok(revoked) => {
                tracing::info!(?pending, revoked, "sessions revoked");
                self.notifier.notify(Notice::success(match pending {
                    PendingRevocation::One(_) => "Session signed out.".to_string(),
                    PendingRevocation::AllOthers { .. } => format!(
                        "Signed out of {revoked} other session{}.",
                        if revoked == 1 { "" } else { "s" }
                    ),
                }));
                self.load().await;
                Ok(revoked)
            }
            Err(err) => {
                tracing::warn!(?pending, error = %err, "session revocation failed");
                self.notifier.notify(Notice::error(
                    err.user_message("We couldn't sign out that session. Please try again."),
                ));
                Err(err)
            }
        }
    }
}
