//! JSON envelopes used by the backend. Only the REST boundary sees these;
//! everything past the adapter works with `dp-core` models.

use std::collections::BTreeMap;

use dp_core::{
    CategoryPreference, Charity, CharityFacets, CharityPage, Conversation, FollowedCharity,
    Message, NotificationCategory, NotificationPreferences, PageResult, Session, TaxInfo,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CharityListResponse {
    #[serde(default)]
    pub charities: Vec<Charity>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub filters: CharityFacets,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default = "first_page")]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_count: 0,
        }
    }
}

fn first_page() -> u32 {
    1
}

impl From<CharityListResponse> for CharityPage {
    fn from(res: CharityListResponse) -> Self {
        CharityPage {
            page: PageResult {
                items: res.charities,
                current_page: res.pagination.current_page,
                total_pages: res.pagination.total_pages,
                total_count: res.pagination.total_count,
            },
            facets: res.filters,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FollowStatusResponse {
    pub is_following: bool,
}

#[derive(Debug, Deserialize)]
pub struct FollowingResponse {
    #[serde(default)]
    pub following: Vec<FollowedCharity>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationsResponse {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct SentMessageResponse {
    pub message: Message,
}

/// Preferences keyed by category name. Unknown categories are ignored so a
/// backend that grows a new category doesn't break older clients.
#[derive(Debug, Deserialize)]
pub struct PreferencesResponse {
    #[serde(default)]
    pub preferences: BTreeMap<String, CategoryPreference>,
}

impl From<PreferencesResponse> for NotificationPreferences {
    fn from(res: PreferencesResponse) -> Self {
        res.preferences
            .into_iter()
            .filter_map(|(key, pref)| {
                key.parse::<NotificationCategory>()
                    .ok()
                    .map(|category| (category, pref))
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct PreferencesRequest<'a> {
    pub preferences: &'a NotificationPreferences,
}

#[derive(Debug, Deserialize)]
pub struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<Session>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeAllResponse {
    #[serde(default)]
    pub revoked_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct TaxInfoResponse {
    #[serde(default)]
    pub tax_info: Option<TaxInfo>,
}

/// Error body; the backend uses either key.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charity_list_tolerates_missing_sections() {
        let res: CharityListResponse =
            serde_json::from_str(r#"{"charities":[{"id":1,"name":"A"}]}"#).unwrap();
        let page: CharityPage = res.into();
        assert_eq!(page.page.items.len(), 1);
        assert_eq!(page.page.total_pages, 1);
        assert!(page.facets.is_empty());
    }

    #[test]
    fn unknown_preference_categories_are_dropped() {
        let res: PreferencesResponse = serde_json::from_str(
            r#"{"preferences":{
                "donations":{"email":true,"push":false,"sms":true,"frequency":"daily"},
                "beta_features":{"email":true,"push":true,"sms":true,"frequency":"instant"}
            }}"#,
        )
        .unwrap();
        let prefs: NotificationPreferences = res.into();
        let donations = prefs.get(NotificationCategory::Donations);
        assert!(donations.email);
        assert!(!donations.sms);
        assert_eq!(prefs.iter().count(), 6);
    }

    #[test]
    fn error_body_prefers_message_over_error() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"Nope","error":"Forbidden"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Nope"));
        let body: ErrorBody = serde_json::from_str(r#"{"error":""}"#).unwrap();
        assert_eq!(body.into_message(), None);
    }
}
