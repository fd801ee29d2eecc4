//! # dp-http-reqwest
//!
//! reqwest implementation of every backend port in `dp-core`.
//! Maps HTTP failures onto the `AppError` taxonomy: no response is
//! `Transport`, a non-2xx status is `Status` (with the server's message when
//! the body carries one), and a body of the wrong shape is `Decode`.

pub mod wire;

use async_trait::async_trait;
use bytes::Bytes;
use dp_core::{
    AppError, CharityDirectory, CharityId, CharityPage, Conversation, Credential, ExportApi,
    ExportKind, ExportPayload, FollowApi, FollowId, FollowedCharity, ListQuery, Message,
    MessagingApi, NewMessage, NotificationPreferences, PreferencesApi, Result, RevokeAllOutcome,
    Session, SessionApi, SessionId, TaxInfo, TaxInfoApi, UserId,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::wire::*;

pub const DEFAULT_USER_AGENT: &str = concat!("donor-portal/", env!("CARGO_PKG_VERSION"));

/// REST client for the donation backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Builds a client with the transport's default timeouts.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::Internal(format!("building HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, credential: Option<&Credential>) -> RequestBuilder {
        tracing::debug!(%method, path, authenticated = credential.is_some(), "backend request");
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match credential {
            Some(credential) => builder.bearer_auth(credential.token()),
            None => builder,
        }
    }

    /// Sends the request and turns non-2xx answers into `AppError::Status`.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(rejection(status, body(response).await))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body = body(response).await?;
        serde_json::from_slice(&body).map_err(|e| AppError::Decode(e.to_string()))
    }

    async fn no_content(&self, request: RequestBuilder) -> Result<()> {
        self.send(request).await.map(|_| ())
    }
}

async fn body(response: Response) -> Result<Bytes> {
    response.bytes().await.map_err(transport)
}

/// Builds the `Status` error for a non-2xx answer. An unreadable or
/// unrecognised body leaves the message empty.
fn rejection(status: StatusCode, body: Result<Bytes>) -> AppError {
    let body = body.unwrap_or_else(|err| {
        tracing::debug!(status = status.as_u16(), error = %err, "could not read error body");
        Bytes::new()
    });
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message);
    tracing::debug!(status = status.as_u16(), ?message, "backend rejected request");
    AppError::Status {
        status: status.as_u16(),
        message,
    }
}

fn transport(err: reqwest::Error) -> AppError {
    if err.is_decode() {
        AppError::Decode(err.to_string())
    } else {
        AppError::Transport(err.to_string())
    }
}

#[async_trait]
impl CharityDirectory for HttpBackend {
    async fn list_charities(&self, query: &ListQuery) -> Result<CharityPage> {
        let request = self
            .request(Method::GET, "/charities", None)
            .query(&query.query_pairs());
        let response: CharityListResponse = self.json(request).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl FollowApi for HttpBackend {
    async fn follow_status(&self, credential: &Credential, charity: CharityId) -> Result<bool> {
        let path = format!("/charities/{charity}/follow-status");
        let response: FollowStatusResponse =
            self.json(self.request(Method::GET, &path, Some(credential))).await?;
        Ok(response.is_following)
    }

    async fn follow(&self, credential: &Credential, charity: CharityId) -> Result<()> {
        let path = format!("/charities/{charity}/follow");
        self.no_content(self.request(Method::POST, &path, Some(credential)))
            .await
    }

    async fn unfollow(&self, credential: &Credential, charity: CharityId) -> Result<()> {
        let path = format!("/charities/{charity}/follow");
        self.no_content(self.request(Method::DELETE, &path, Some(credential)))
            .await
    }

    async fn list_following(&self, credential: &Credential) -> Result<Vec<FollowedCharity>> {
        let response: FollowingResponse = self
            .json(self.request(Method::GET, "/me/following", Some(credential)))
            .await?;
        Ok(response.following)
    }

    async fn remove_follow(&self, credential: &Credential, follow: FollowId) -> Result<()> {
        let path = format!("/follows/{follow}");
        self.no_content(self.request(Method::DELETE, &path, Some(credential)))
            .await
    }
}

#[async_trait]
impl MessagingApi for HttpBackend {
    async fn list_conversations(&self, credential: &Credential) -> Result<Vec<Conversation>> {
        let response: ConversationsResponse = self
            .json(self.request(Method::GET, "/messages/conversations", Some(credential)))
            .await?;
        Ok(response.conversations)
    }

    async fn conversation(&self, credential: &Credential, partner: UserId) -> Result<Vec<Message>> {
        let path = format!("/messages/conversation/{partner}");
        let response: MessagesResponse =
            self.json(self.request(Method::GET, &path, Some(credential))).await?;
        Ok(response.messages)
    }

    async fn send_message(&self, credential: &Credential, message: &NewMessage) -> Result<Message> {
        let request = self
            .request(Method::POST, "/messages", Some(credential))
            .json(message);
        let response: SentMessageResponse = self.json(request).await?;
        Ok(response.message)
    }
}

#[async_trait]
impl PreferencesApi for HttpBackend {
    async fn load_preferences(&self, credential: &Credential) -> Result<NotificationPreferences> {
        let response: PreferencesResponse = self
            .json(self.request(Method::GET, "/me/notification-preferences", Some(credential)))
            .await?;
        Ok(response.into())
    }

    async fn save_preferences(
        &self,
        credential: &Credential,
        preferences: &NotificationPreferences,
    ) -> Result<NotificationPreferences> {
        let request = self
            .request(Method::POST, "/me/notification-preferences", Some(credential))
            .json(&PreferencesRequest { preferences });
        let response: PreferencesResponse = self.json(request).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl SessionApi for HttpBackend {
    async fn list_sessions(&self, credential: &Credential) -> Result<Vec<Session>> {
        let response: SessionsResponse = self
            .json(self.request(Method::GET, "/me/sessions", Some(credential)))
            .await?;
        Ok(response.sessions)
    }

    async fn revoke_session(&self, credential: &Credential, session: SessionId) -> Result<()> {
        let path = format!("/me/sessions/{session}");
        self.no_content(self.request(Method::DELETE, &path, Some(credential)))
            .await
    }

    async fn revoke_all_sessions(&self, credential: &Credential) -> Result<RevokeAllOutcome> {
        let response: RevokeAllResponse = self
            .json(self.request(Method::POST, "/me/sessions/revoke-all", Some(credential)))
            .await?;
        Ok(RevokeAllOutcome {
            revoked_count: response.revoked_count,
        })
    }
}

#[async_trait]
impl TaxInfoApi for HttpBackend {
    async fn load_tax_info(&self, credential: &Credential) -> Result<Option<TaxInfo>> {
        let response: TaxInfoResponse = self
            .json(self.request(Method::GET, "/me/tax-info", Some(credential)))
            .await?;
        Ok(response.tax_info)
    }

    async fn save_tax_info(&self, credential: &Credential, info: &TaxInfo) -> Result<TaxInfo> {
        let request = self
            .request(Method::POST, "/me/tax-info", Some(credential))
            .json(info);
        let response: TaxInfoResponse = self.json(request).await?;
        // Some deployments answer 200 with an empty body; keep what we sent.
        Ok(response.tax_info.unwrap_or_else(|| info.clone()))
    }
}

#[async_trait]
impl ExportApi for HttpBackend {
    async fn fetch_export(&self, credential: &Credential, kind: ExportKind) -> Result<ExportPayload> {
        let request = match kind {
            ExportKind::PersonalData => self.request(Method::GET, "/me/export", Some(credential)),
            ExportKind::Statement { year } => self
                .request(Method::GET, "/me/statements", Some(credential))
                .query(&[("year", year)]),
        };
        let response = self.send(request).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = body(response).await?;
        Ok(ExportPayload {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("https://api.example.org/v1/", DEFAULT_USER_AGENT).unwrap();
        assert_eq!(backend.base_url(), "https://api.example.org/v1");
    }

    #[test]
    fn rejection_carries_the_server_message() {
        let body = Bytes::from_static(br#"{"error":"Postcode is not valid"}"#);
        let err = rejection(StatusCode::UNPROCESSABLE_ENTITY, Ok(body));
        assert_eq!(
            err,
            AppError::Status {
                status: 422,
                message: Some("Postcode is not valid".into()),
            }
        );
    }

    #[test]
    fn unreadable_error_body_still_reports_the_status() {
        let err = rejection(
            StatusCode::BAD_GATEWAY,
            Err(AppError::Transport("connection reset".into())),
        );
        assert_eq!(
            err,
            AppError::Status {
                status: 502,
                message: None,
            }
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) is essentially never listening on loopback.
        let backend = HttpBackend::new("http://127.0.0.1:9", DEFAULT_USER_AGENT).unwrap();
        let err = backend
            .list_charities(&ListQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }
}
