//! # dp-ui
//!
//! Plain-text views for the donor portal CLI, rendered with askama.
//! Each view flattens the controller state into display rows up front so the
//! templates stay free of logic.

use chrono::{DateTime, Utc};
use dp_core::{
    Charity, CharityFacets, Conversation, FollowState, FollowStatusMap, FollowedCharity,
    ListQuery, Message, NotificationPreferences, PageResult, Session, TaxField, TaxInfo, UserId,
    ALL,
};

pub use askama::{Error as RenderError, Template};

fn short_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

pub struct CharityRow {
    pub id: i64,
    pub name: String,
    /// "+" following, "-" not following, "?" unknown
    pub marker: &'static str,
    pub details: String,
}

#[derive(Template)]
#[template(path = "charities.txt")]
pub struct CharitiesView {
    pub summary: String,
    pub rows: Vec<CharityRow>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub categories: String,
    pub regions: String,
    pub error: String,
}

impl CharitiesView {
    pub fn new(
        query: &ListQuery,
        page: &PageResult<Charity>,
        facets: &CharityFacets,
        follows: &FollowStatusMap,
        error: Option<&str>,
    ) -> Self {
        let mut summary = Vec::new();
        if !query.search_term.trim().is_empty() {
            summary.push(format!("search \"{}\"", query.search_term.trim()));
        }
        if query.category != ALL {
            summary.push(format!("category {}", query.category));
        }
        if query.region != ALL {
            summary.push(format!("region {}", query.region));
        }
        summary.push(format!("sorted by {}", query.sort));

        let rows = page
            .items
            .iter()
            .map(|c| {
                let details: Vec<String> = [
                    c.category.clone(),
                    c.region.clone(),
                    c.total_received.map(|t| format!("{t:.2} raised")),
                    c.verified.then(|| "verified".to_string()),
                ]
                .into_iter()
                .flatten()
                .collect();
                CharityRow {
                    id: c.id,
                    name: c.name.clone(),
                    marker: match follows.state(c.id) {
                        FollowState::Following => "+",
                        FollowState::NotFollowing => "-",
                        FollowState::Unknown => "?",
                    },
                    details: details.join(", "),
                }
            })
            .collect();

        Self {
            summary: summary.join(", "),
            rows,
            current_page: page.current_page,
            total_pages: page.total_pages,
            total_count: page.total_count,
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            categories: facets.categories.join(", "),
            regions: facets.regions.join(", "),
            error: error.unwrap_or_default().to_string(),
        }
    }
}

pub struct FollowingRow {
    pub follow_id: i64,
    pub name: String,
    pub since: String,
}

#[derive(Template)]
#[template(path = "following.txt")]
pub struct FollowingView {
    pub rows: Vec<FollowingRow>,
    pub error: String,
}

impl FollowingView {
    pub fn new(follows: &[FollowedCharity], error: Option<&str>) -> Self {
        Self {
            rows: follows
                .iter()
                .map(|f| FollowingRow {
                    follow_id: f.id,
                    name: f.charity.name.clone(),
                    since: f.followed_at.as_ref().map(short_time).unwrap_or_default(),
                })
                .collect(),
            error: error.unwrap_or_default().to_string(),
        }
    }
}

pub struct ConversationRow {
    pub partner_id: UserId,
    pub name: String,
    pub preview: String,
    pub when: String,
    pub unread: u32,
}

#[derive(Template)]
#[template(path = "conversations.txt")]
pub struct ConversationsView {
    pub rows: Vec<ConversationRow>,
    pub total_unread: u32,
    pub error: String,
}

impl ConversationsView {
    pub fn new(conversations: &[Conversation], error: Option<&str>) -> Self {
        Self {
            rows: conversations
                .iter()
                .map(|c| ConversationRow {
                    partner_id: c.partner_id,
                    name: partner_label(c.partner_id, c.partner_name.as_deref()),
                    preview: c.last_message.clone().unwrap_or_default(),
                    when: short_time(&c.last_message_at),
                    unread: c.unread_count,
                })
                .collect(),
            total_unread: conversations.iter().map(|c| c.unread_count).sum(),
            error: error.unwrap_or_default().to_string(),
        }
    }
}

fn partner_label(id: UserId, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => format!("User #{id}"),
    }
}

pub struct MessageRow {
    pub when: String,
    pub author: String,
    pub content: String,
}

#[derive(Template)]
#[template(path = "thread.txt")]
pub struct ThreadView {
    pub partner: String,
    pub rows: Vec<MessageRow>,
    pub error: String,
}

impl ThreadView {
    pub fn new(
        partner_id: UserId,
        partner_name: Option<&str>,
        messages: &[Message],
        error: Option<&str>,
    ) -> Self {
        let partner = partner_label(partner_id, partner_name);
        let rows = messages
            .iter()
            .map(|m| MessageRow {
                when: short_time(&m.created_at),
                author: if m.sender_id == partner_id {
                    partner.clone()
                } else {
                    "You".to_string()
                },
                content: m.content.clone(),
            })
            .collect();
        Self {
            partner,
            rows,
            error: error.unwrap_or_default().to_string(),
        }
    }
}

pub struct PreferenceRow {
    pub label: &'static str,
    pub email: &'static str,
    pub push: &'static str,
    /// "n/a" where the category never offers SMS
    pub sms: &'static str,
    pub frequency: &'static str,
}

#[derive(Template)]
#[template(path = "preferences.txt")]
pub struct PreferencesView {
    pub rows: Vec<PreferenceRow>,
    pub dirty: bool,
}

impl PreferencesView {
    pub fn new(preferences: &NotificationPreferences, dirty: bool) -> Self {
        Self {
            rows: preferences
                .iter()
                .map(|(category, pref)| PreferenceRow {
                    label: category.label(),
                    email: yes_no(pref.email),
                    push: yes_no(pref.push),
                    sms: if category.sms_allowed() {
                        yes_no(pref.sms)
                    } else {
                        "n/a"
                    },
                    frequency: pref.frequency.as_str(),
                })
                .collect(),
            dirty,
        }
    }
}

pub struct SessionRow {
    pub id: i64,
    pub label: String,
    pub location: String,
    pub last_active: String,
    pub current: bool,
}

#[derive(Template)]
#[template(path = "sessions.txt")]
pub struct SessionsView {
    pub rows: Vec<SessionRow>,
    pub other_sessions: usize,
    pub error: String,
}

impl SessionsView {
    pub fn new(sessions: &[Session], error: Option<&str>) -> Self {
        Self {
            rows: sessions
                .iter()
                .map(|s| SessionRow {
                    id: s.id,
                    label: s.label(),
                    location: [s.location.as_deref(), s.ip_address.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(", "),
                    last_active: s.last_active_at.as_ref().map(short_time).unwrap_or_default(),
                    current: s.is_current,
                })
                .collect(),
            other_sessions: sessions.iter().filter(|s| s.is_revocable()).count(),
            error: error.unwrap_or_default().to_string(),
        }
    }
}

pub struct TaxRow {
    pub label: &'static str,
    pub value: String,
    pub required: bool,
}

#[derive(Template)]
#[template(path = "tax_info.txt")]
pub struct TaxInfoView {
    pub rows: Vec<TaxRow>,
    pub gift_aid: bool,
    pub missing: String,
    pub dirty: bool,
}

impl TaxInfoView {
    pub fn new(info: &TaxInfo, dirty: bool) -> Self {
        Self {
            rows: TaxField::ALL
                .iter()
                .map(|field| TaxRow {
                    label: field.label(),
                    value: info.field(*field).to_string(),
                    required: field.is_required(),
                })
                .collect(),
            gift_aid: info.gift_aid,
            missing: info
                .missing_required()
                .iter()
                .map(|f| f.label())
                .collect::<Vec<_>>()
                .join(", "),
            dirty,
        }
    }
}
