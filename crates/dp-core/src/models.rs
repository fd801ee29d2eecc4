//! # Domain Models
//!
//! These structs represent the entities the donor-facing screens work with.
//! Identifiers are the backend's integer keys; the portal never mints its own.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub type CharityId = i64;
pub type UserId = i64;
pub type MessageId = i64;
pub type SessionId = i64;
pub type FollowId = i64;

/// Sentinel filter value meaning "do not constrain this facet".
pub const ALL: &str = "all";

// ── Charities ───────────────────────────────────────────────────────────────

/// A charity as listed in the public directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charity {
    pub id: CharityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Lifetime donations received, in the charity's currency
    #[serde(default)]
    pub total_received: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified: bool,
}

/// Ordering applied by the directory endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Newest,
    TotalReceived,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Newest => "newest",
            SortKey::TotalReceived => "total_received",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(SortKey::Name),
            "newest" => Ok(SortKey::Newest),
            "total_received" => Ok(SortKey::TotalReceived),
            other => Err(AppError::Validation(format!("unknown sort key '{other}'"))),
        }
    }
}

/// Filter, sort and page state of the charity directory.
///
/// The page is *not* reset automatically when a filter field changes; the
/// browser controller does that explicitly in each setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search_term: String,
    pub category: String,
    pub region: String,
    pub sort: SortKey,
    pub page: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            category: ALL.to_string(),
            region: ALL.to_string(),
            sort: SortKey::default(),
            page: 1,
        }
    }
}

impl ListQuery {
    /// Query-string pairs for the directory endpoint.
    ///
    /// `page` and `sort` are always sent. The search term is omitted when
    /// blank, and facet filters are omitted when set to [`ALL`].
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.max(1).to_string())];
        let term = self.search_term.trim();
        if !term.is_empty() {
            pairs.push(("q", term.to_string()));
        }
        if !is_all(&self.category) {
            pairs.push(("category", self.category.clone()));
        }
        if !is_all(&self.region) {
            pairs.push(("region", self.region.clone()));
        }
        pairs.push(("sort", self.sort.as_str().to_string()));
        pairs
    }

    /// True when any field differs from its default (page excluded).
    pub fn has_filters(&self) -> bool {
        !self.search_term.trim().is_empty()
            || !is_all(&self.category)
            || !is_all(&self.region)
            || self.sort != SortKey::default()
    }
}

fn is_all(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ALL)
}

/// One page of an ordered collection plus its pagination bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> PageResult<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            total_count: 0,
        }
    }

    /// Enforces `1 <= current_page <= total_pages`.
    pub fn normalized(mut self) -> Self {
        self.total_pages = self.total_pages.max(1);
        self.current_page = self.current_page.clamp(1, self.total_pages);
        self
    }

    /// Clamps a requested page number into this result's bounds.
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// Filter options the backend returns alongside a page of charities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharityFacets {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
}

impl CharityFacets {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.regions.is_empty()
    }
}

/// A directory response: the page and the facets valid for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharityPage {
    pub page: PageResult<Charity>,
    pub facets: CharityFacets,
}

// ── Following ───────────────────────────────────────────────────────────────

/// What the portal knows about the donor following one charity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowState {
    /// Not fetched for the current list (or fetching was skipped)
    Unknown,
    Following,
    NotFollowing,
}

impl FollowState {
    pub fn is_following(&self) -> bool {
        matches!(self, FollowState::Following)
    }
}

/// Follow status per charity, committed as a whole after each fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowStatusMap {
    entries: HashMap<CharityId, bool>,
}

impl FollowStatusMap {
    pub fn state(&self, id: CharityId) -> FollowState {
        match self.entries.get(&id) {
            Some(true) => FollowState::Following,
            Some(false) => FollowState::NotFollowing,
            None => FollowState::Unknown,
        }
    }

    pub fn is_following(&self, id: CharityId) -> bool {
        self.state(id).is_following()
    }

    pub fn contains(&self, id: CharityId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = CharityId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(CharityId, bool)> for FollowStatusMap {
    fn from_iter<I: IntoIterator<Item = (CharityId, bool)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// An entry of the donor's "following" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowedCharity {
    /// Identifier of the follow relationship (not of the charity)
    pub id: FollowId,
    pub charity: Charity,
    #[serde(default)]
    pub followed_at: Option<DateTime<Utc>>,
}

// ── Messaging ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub partner_id: UserId,
    #[serde(default)]
    pub partner_name: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

/// Body of a send-message request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub receiver_id: UserId,
    pub content: String,
}

// ── Notification preferences ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Donations,
    Campaigns,
    Charities,
    Support,
    Security,
    Marketing,
}

impl NotificationCategory {
    pub const ALL: [NotificationCategory; 6] = [
        NotificationCategory::Donations,
        NotificationCategory::Campaigns,
        NotificationCategory::Charities,
        NotificationCategory::Support,
        NotificationCategory::Security,
        NotificationCategory::Marketing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Donations => "donations",
            NotificationCategory::Campaigns => "campaigns",
            NotificationCategory::Charities => "charities",
            NotificationCategory::Support => "support",
            NotificationCategory::Security => "security",
            NotificationCategory::Marketing => "marketing",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationCategory::Donations => "Donations & receipts",
            NotificationCategory::Campaigns => "Campaign updates",
            NotificationCategory::Charities => "Charities you follow",
            NotificationCategory::Support => "Support",
            NotificationCategory::Security => "Security alerts",
            NotificationCategory::Marketing => "News & offers",
        }
    }

    /// SMS is only offered for security alerts.
    pub fn sms_allowed(&self) -> bool {
        matches!(self, NotificationCategory::Security)
    }

    /// Frequencies the category may be set to.
    pub fn frequencies(&self) -> &'static [Frequency] {
        const STANDARD: &[Frequency] = &[Frequency::Instant, Frequency::Daily, Frequency::Weekly];
        const WITH_MONTHLY: &[Frequency] = &[
            Frequency::Instant,
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
        ];
        match self {
            NotificationCategory::Marketing => WITH_MONTHLY,
            _ => STANDARD,
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        NotificationCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| AppError::Validation(format!("unknown notification category '{wanted}'")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Instant,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Instant => "instant",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instant" => Ok(Frequency::Instant),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(AppError::Validation(format!("unknown frequency '{other}'"))),
        }
    }
}

/// Delivery channel of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Email,
    Push,
    Sms,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Push => "push",
            Channel::Sms => "sms",
        }
    }
}

impl FromStr for Channel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Channel::Email),
            "push" => Ok(Channel::Push),
            "sms" => Ok(Channel::Sms),
            other => Err(AppError::Validation(format!("unknown channel '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPreference {
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub frequency: Frequency,
}

impl CategoryPreference {
    pub fn default_for(category: NotificationCategory) -> Self {
        match category {
            NotificationCategory::Marketing => Self {
                email: false,
                push: false,
                sms: false,
                frequency: Frequency::Weekly,
            },
            _ => Self {
                email: true,
                push: true,
                sms: false,
                frequency: Frequency::Instant,
            },
        }
    }

    /// Forces the per-category constraints regardless of what the backend sent.
    pub fn sanitized(mut self, category: NotificationCategory) -> Self {
        if !category.sms_allowed() {
            self.sms = false;
        }
        if !category.frequencies().contains(&self.frequency) {
            self.frequency = Frequency::Weekly;
        }
        self
    }

    pub fn channel(&self, channel: Channel) -> bool {
        match channel {
            Channel::Email => self.email,
            Channel::Push => self.push,
            Channel::Sms => self.sms,
        }
    }

    pub fn set_channel(&mut self, channel: Channel, enabled: bool) {
        match channel {
            Channel::Email => self.email = enabled,
            Channel::Push => self.push = enabled,
            Channel::Sms => self.sms = enabled,
        }
    }
}

/// The full preference set: exactly one entry per [`NotificationCategory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationPreferences {
    categories: BTreeMap<NotificationCategory, CategoryPreference>,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        NotificationCategory::ALL
            .into_iter()
            .map(|c| (c, CategoryPreference::default_for(c)))
            .collect()
    }
}

impl FromIterator<(NotificationCategory, CategoryPreference)> for NotificationPreferences {
    /// Missing categories get their defaults; every entry is sanitized.
    fn from_iter<I: IntoIterator<Item = (NotificationCategory, CategoryPreference)>>(iter: I) -> Self {
        let mut categories: BTreeMap<_, _> = iter.into_iter().collect();
        for category in NotificationCategory::ALL {
            let pref = categories
                .get(&category)
                .copied()
                .unwrap_or_else(|| CategoryPreference::default_for(category));
            categories.insert(category, pref.sanitized(category));
        }
        Self { categories }
    }
}

impl NotificationPreferences {
    pub fn get(&self, category: NotificationCategory) -> CategoryPreference {
        self.categories
            .get(&category)
            .copied()
            .unwrap_or_else(|| CategoryPreference::default_for(category))
    }

    /// Stores `pref` after applying the category constraints.
    pub fn set(&mut self, category: NotificationCategory, pref: CategoryPreference) {
        self.categories.insert(category, pref.sanitized(category));
    }

    /// Re-applies defaults and constraints to every category.
    pub fn normalized(self) -> Self {
        self.categories.into_iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NotificationCategory, CategoryPreference)> + '_ {
        self.categories.iter().map(|(c, p)| (*c, *p))
    }
}

// ── Sessions ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_current: bool,
}

impl Session {
    /// The session backing the active client can never be revoked from here.
    pub fn is_revocable(&self) -> bool {
        !self.is_current
    }

    pub fn label(&self) -> String {
        match (self.device.as_deref(), self.browser.as_deref()) {
            (Some(device), Some(browser)) => format!("{browser} on {device}"),
            (Some(device), None) => device.to_string(),
            (None, Some(browser)) => browser.to_string(),
            (None, None) => format!("Session #{}", self.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeAllOutcome {
    pub revoked_count: u32,
}

// ── Tax information ─────────────────────────────────────────────────────────

/// The donor's taxpayer record, replaced as a whole on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxInfo {
    pub full_name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub postcode: String,
    pub country: String,
    pub tax_id: String,
    pub gift_aid: bool,
}

/// Editable text fields of [`TaxInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxField {
    FullName,
    AddressLine1,
    AddressLine2,
    City,
    Postcode,
    Country,
    TaxId,
}

impl TaxField {
    pub const ALL: [TaxField; 7] = [
        TaxField::FullName,
        TaxField::AddressLine1,
        TaxField::AddressLine2,
        TaxField::City,
        TaxField::Postcode,
        TaxField::Country,
        TaxField::TaxId,
    ];

    pub const REQUIRED: [TaxField; 5] = [
        TaxField::FullName,
        TaxField::AddressLine1,
        TaxField::City,
        TaxField::Postcode,
        TaxField::Country,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TaxField::FullName => "full_name",
            TaxField::AddressLine1 => "address_line1",
            TaxField::AddressLine2 => "address_line2",
            TaxField::City => "city",
            TaxField::Postcode => "postcode",
            TaxField::Country => "country",
            TaxField::TaxId => "tax_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaxField::FullName => "Full name",
            TaxField::AddressLine1 => "Address line 1",
            TaxField::AddressLine2 => "Address line 2",
            TaxField::City => "City",
            TaxField::Postcode => "Postcode",
            TaxField::Country => "Country",
            TaxField::TaxId => "Tax reference",
        }
    }

    pub fn is_required(&self) -> bool {
        TaxField::REQUIRED.contains(self)
    }
}

impl FromStr for TaxField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        TaxField::ALL
            .into_iter()
            .find(|f| f.key() == wanted)
            .ok_or_else(|| AppError::Validation(format!("unknown tax field '{wanted}'")))
    }
}

impl TaxInfo {
    pub fn field(&self, field: TaxField) -> &str {
        match field {
            TaxField::FullName => &self.full_name,
            TaxField::AddressLine1 => &self.address_line1,
            TaxField::AddressLine2 => &self.address_line2,
            TaxField::City => &self.city,
            TaxField::Postcode => &self.postcode,
            TaxField::Country => &self.country,
            TaxField::TaxId => &self.tax_id,
        }
    }

    /// Writes a field, returning whether the value actually changed.
    pub fn set_field(&mut self, field: TaxField, value: String) -> bool {
        let slot = match field {
            TaxField::FullName => &mut self.full_name,
            TaxField::AddressLine1 => &mut self.address_line1,
            TaxField::AddressLine2 => &mut self.address_line2,
            TaxField::City => &mut self.city,
            TaxField::Postcode => &mut self.postcode,
            TaxField::Country => &mut self.country,
            TaxField::TaxId => &mut self.tax_id,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// Required fields that are blank, in display order.
    pub fn missing_required(&self) -> Vec<TaxField> {
        TaxField::REQUIRED
            .into_iter()
            .filter(|f| self.field(*f).trim().is_empty())
            .collect()
    }
}

// ── Exports ─────────────────────────────────────────────────────────────────

/// Earliest year a donation statement can be requested for.
pub const FIRST_STATEMENT_YEAR: i32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Archive of all personal data held about the donor
    PersonalData,
    /// Annual donation statement for tax purposes
    Statement { year: i32 },
}

impl ExportKind {
    pub fn default_extension(&self) -> &'static str {
        match self {
            ExportKind::PersonalData => "zip",
            ExportKind::Statement { .. } => "pdf",
        }
    }

    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        match self {
            ExportKind::PersonalData => Ok(()),
            ExportKind::Statement { year } if (FIRST_STATEMENT_YEAR..=today.year()).contains(year) => {
                Ok(())
            }
            ExportKind::Statement { year } => Err(AppError::Validation(format!(
                "statements are available for {FIRST_STATEMENT_YEAR} to {}, not {year}",
                today.year()
            ))),
        }
    }

    /// Synthesizes the save-as name for a payload downloaded on `today`.
    pub fn file_name(&self, today: NaiveDate, content_type: Option<&str>) -> String {
        let ext = extension_for(content_type).unwrap_or(self.default_extension());
        match self {
            ExportKind::PersonalData => {
                format!("donor-data-export-{}.{ext}", today.format("%Y-%m-%d"))
            }
            ExportKind::Statement { year } => format!("donation-statement-{year}.{ext}"),
        }
    }
}

fn extension_for(content_type: Option<&str>) -> Option<&'static str> {
    let mime: mime::Mime = content_type?.parse().ok()?;
    match (mime.type_().as_str(), mime.subtype().as_str()) {
        ("application", "pdf") => Some("pdf"),
        ("application", "zip") | ("application", "x-zip-compressed") => Some("zip"),
        ("application", "json") => Some("json"),
        ("text", "csv") => Some("csv"),
        _ => None,
    }
}

/// Opaque bytes of a binary download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Where a download ended up on the local machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub size: u64,
    /// Hex SHA-256 of the written bytes
    pub sha256: String,
}

// ── Notices ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient, non-blocking notification shown to the donor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
