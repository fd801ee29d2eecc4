//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Authenticated operations take the [`Credential`] explicitly; no port
//! reaches for a process-wide token.

use async_trait::async_trait;

use crate::credential::Credential;
use crate::error::Result;
use crate::models::{
    CharityId, CharityPage, Conversation, ExportKind, ExportPayload, FollowId, FollowedCharity,
    ListQuery, Message, NewMessage, Notice, NotificationPreferences, RevokeAllOutcome, SavedFile,
    Session, SessionId, TaxInfo, UserId,
};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Public, unauthenticated charity directory.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CharityDirectory: Send + Sync {
    async fn list_charities(&self, query: &ListQuery) -> Result<CharityPage>;
}

/// Follow relationships between the donor and charities.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait FollowApi: Send + Sync {
    async fn follow_status(&self, credential: &Credential, charity: CharityId) -> Result<bool>;
    async fn follow(&self, credential: &Credential, charity: CharityId) -> Result<()>;
    async fn unfollow(&self, credential: &Credential, charity: CharityId) -> Result<()>;

    // "Following" page
    async fn list_following(&self, credential: &Credential) -> Result<Vec<FollowedCharity>>;
    async fn remove_follow(&self, credential: &Credential, follow: FollowId) -> Result<()>;
}

/// Donor ↔ charity messaging.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn list_conversations(&self, credential: &Credential) -> Result<Vec<Conversation>>;
    async fn conversation(&self, credential: &Credential, partner: UserId) -> Result<Vec<Message>>;
    async fn send_message(&self, credential: &Credential, message: &NewMessage) -> Result<Message>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PreferencesApi: Send + Sync {
    async fn load_preferences(&self, credential: &Credential) -> Result<NotificationPreferences>;
    /// Replaces the whole set; returns what the backend stored.
    async fn save_preferences(
        &self,
        credential: &Credential,
        preferences: &NotificationPreferences,
    ) -> Result<NotificationPreferences>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn list_sessions(&self, credential: &Credential) -> Result<Vec<Session>>;
    async fn revoke_session(&self, credential: &Credential, session: SessionId) -> Result<()>;
    /// Revokes every session except the caller's own.
    async fn revoke_all_sessions(&self, credential: &Credential) -> Result<RevokeAllOutcome>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TaxInfoApi: Send + Sync {
    /// `None` when the donor has never filed tax information.
    async fn load_tax_info(&self, credential: &Credential) -> Result<Option<TaxInfo>>;
    async fn save_tax_info(&self, credential: &Credential, info: &TaxInfo) -> Result<TaxInfo>;
}

/// Binary downloads generated by the backend on request.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ExportApi: Send + Sync {
    async fn fetch_export(&self, credential: &Credential, kind: ExportKind) -> Result<ExportPayload>;
}

/// Local destination for downloaded payloads (the "save as" step).
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn save(&self, file_name: &str, payload: &ExportPayload) -> Result<SavedFile>;
}

/// Source of the bearer credential issued by the external auth service.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// `Ok(None)` means "signed out"; optional calls are skipped.
    async fn credential(&self) -> Result<Option<Credential>>;
}

/// Surface for transient, non-blocking user notifications.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
