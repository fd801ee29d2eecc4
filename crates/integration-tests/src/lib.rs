//! In-process fake of the donation backend, served by axum on an ephemeral
//! loopback port. Tests drive the real reqwest adapter against it.

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, TimeZone, Utc};
use dp_core::{Charity, FollowedCharity, Message, NewMessage, Session, TaxInfo};
use serde_json::{json, Value};

pub const TEST_TOKEN: &str = "test-token";
pub const PAGE_SIZE: usize = 6;
/// The donor's own user id.
pub const DONOR_ID: i64 = 1;
/// The charity account the donor has been messaging.
pub const PARTNER_ID: i64 = 7;
/// Follow-status lookups for this charity always fail.
pub const BROKEN_CHARITY: i64 = 5;
/// Searching for this term makes the directory endpoint fail.
pub const BROKEN_TERM: &str = "explode";
/// Statements for this year do not exist.
pub const MISSING_STATEMENT_YEAR: i32 = 2001;
/// The follow-relationship id is the charity id plus this offset.
pub const FOLLOW_ID_OFFSET: i64 = 100;

pub const ZIP_BYTES: &[u8] = b"PK\x03\x04fake-archive";
pub const PDF_BYTES: &[u8] = b"%PDF-1.7 fake-statement";

#[derive(Default)]
pub struct Counters {
    pub list_charities: AtomicUsize,
    pub follow_status: AtomicUsize,
    pub send_message: AtomicUsize,
    pub save_preferences: AtomicUsize,
}

/// Reads a request counter.
pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

pub struct Store {
    pub charities: Vec<Charity>,
    pub following: BTreeSet<i64>,
    pub messages: Vec<Message>,
    pub preferences: Value,
    pub sessions: Vec<Session>,
    pub tax_info: Option<TaxInfo>,
    /// Raw query strings seen by the directory endpoint, in order
    pub charity_queries: Vec<HashMap<String, String>>,
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().unwrap_or_default()
}

impl Store {
    fn seeded() -> Self {
        let charities = [
            ("Clean Water Trust", "health", "north", 5200.0),
            ("City Food Bank", "hunger", "south", 800.0),
            ("Books for All", "education", "north", 1500.0),
            ("Harbour Animal Rescue", "animals", "east", 300.0),
            ("Night Shelter", "housing", "south", 4100.0),
            ("Young Coders", "education", "west", 950.0),
            ("River Clean-up Crew", "environment", "north", 2750.0),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (name, category, region, total))| Charity {
            id: i as i64 + 1,
            name: name.to_string(),
            description: None,
            category: Some(category.to_string()),
            region: Some(region.to_string()),
            logo_url: None,
            total_received: Some(total),
            created_at: Some(epoch() + Duration::days(i as i64)),
            verified: i % 2 == 0,
        })
        .collect();

        let messages = vec![
            Message {
                id: 1,
                sender_id: PARTNER_ID,
                receiver_id: DONOR_ID,
                content: "Thank you for your donation!".into(),
                created_at: epoch(),
                is_read: false,
            },
            Message {
                id: 2,
                sender_id: PARTNER_ID,
                receiver_id: DONOR_ID,
                content: "Here is our spring update.".into(),
                created_at: epoch() + Duration::hours(2),
                is_read: false,
            },
        ];

        let sessions = (1..=4)
            .map(|id| Session {
                id,
                device: Some(format!("Device {id}")),
                browser: Some("Firefox".into()),
                ip_address: None,
                location: None,
                last_active_at: Some(epoch() - Duration::hours(id)),
                created_at: None,
                is_current: id == 2,
            })
            .collect();

        Self {
            charities,
            following: BTreeSet::from([2]),
            messages,
            preferences: json!({}),
            sessions,
            tax_info: None,
            charity_queries: Vec::new(),
        }
    }
}

pub struct FakeState {
    pub store: Mutex<Store>,
    pub counters: Counters,
}

impl FakeState {
    pub fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

type Shared = Arc<FakeState>;

/// A running fake backend.
pub struct FakeBackend {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            store: Mutex::new(Store::seeded()),
            counters: Counters::default(),
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn counters(&self) -> &Counters {
        &self.state.counters
    }
}

pub fn router(state: Shared) -> Router {
    Router::new()
        .route("/charities", get(list_charities))
        .route("/charities/{id}/follow-status", get(follow_status))
        .route("/charities/{id}/follow", post(follow).delete(unfollow))
        .route("/me/following", get(list_following))
        .route("/follows/{id}", delete(remove_follow))
        .route("/messages/conversations", get(list_conversations))
        .route("/messages/conversation/{partner}", get(conversation))
        .route("/messages", post(send_message))
        .route(
            "/me/notification-preferences",
            get(load_preferences).post(save_preferences),
        )
        .route("/me/sessions", get(list_sessions))
        .route("/me/sessions/revoke-all", post(revoke_all))
        .route("/me/sessions/{id}", delete(revoke_session))
        .route("/me/tax-info", get(load_tax_info).post(save_tax_info))
        .route("/me/export", get(export))
        .route("/me/statements", get(statement))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TEST_TOKEN}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Authentication required")),
    }
}

async fn list_charities(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.counters.list_charities.fetch_add(1, Ordering::SeqCst);
    let mut store = state.store();
    store.charity_queries.push(params.clone());

    let term = params.get("q").map(|q| q.to_lowercase()).unwrap_or_default();
    if term == BROKEN_TERM {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Search is temporarily unavailable");
    }

    let mut matches: Vec<Charity> = store
        .charities
        .iter()
        .filter(|c| term.is_empty() || c.name.to_lowercase().contains(&term))
        .filter(|c| params.get("category").map_or(true, |v| c.category.as_ref() == Some(v)))
        .filter(|c| params.get("region").map_or(true, |v| c.region.as_ref() == Some(v)))
        .cloned()
        .collect();
    match params.get("sort").map(String::as_str) {
        Some("newest") => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        Some("total_received") => matches.sort_by(|a, b| {
            b.total_received
                .unwrap_or_default()
                .total_cmp(&a.total_received.unwrap_or_default())
        }),
        _ => matches.sort_by(|a, b| a.name.cmp(&b.name)),
    }

    let total_count = matches.len();
    let total_pages = total_count.div_ceil(PAGE_SIZE).max(1);
    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
        .clamp(1, total_pages);
    let items: Vec<Charity> = matches
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    let mut categories: Vec<String> = store.charities.iter().filter_map(|c| c.category.clone()).collect();
    categories.sort();
    categories.dedup();
    let mut regions: Vec<String> = store.charities.iter().filter_map(|c| c.region.clone()).collect();
    regions.sort();
    regions.dedup();

    Json(json!({
        "charities": items,
        "pagination": {
            "current_page": page,
            "total_pages": total_pages,
            "total_count": total_count,
        },
        "filters": { "categories": categories, "regions": regions },
    }))
    .into_response()
}

async fn follow_status(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.counters.follow_status.fetch_add(1, Ordering::SeqCst);
    if id == BROKEN_CHARITY {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Follow lookup failed");
    }
    let following = state.store().following.contains(&id);
    Json(json!({ "is_following": following })).into_response()
}

async fn follow(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let mut store = state.store();
    if !store.charities.iter().any(|c| c.id == id) {
        return error(StatusCode::NOT_FOUND, "Charity not found");
    }
    store.following.insert(id);
    StatusCode::NO_CONTENT.into_response()
}

async fn unfollow(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.store().following.remove(&id);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_following(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let store = state.store();
    let following: Vec<FollowedCharity> = store
        .charities
        .iter()
        .filter(|c| store.following.contains(&c.id))
        .map(|c| FollowedCharity {
            id: c.id + FOLLOW_ID_OFFSET,
            charity: c.clone(),
            followed_at: Some(epoch()),
        })
        .collect();
    Json(json!({ "following": following })).into_response()
}

async fn remove_follow(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    if state.store().following.remove(&(id - FOLLOW_ID_OFFSET)) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error(StatusCode::NOT_FOUND, "You are not following that charity")
    }
}

async fn list_conversations(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let store = state.store();
    let Some(last) = store.messages.iter().max_by_key(|m| m.created_at) else {
        return Json(json!({ "conversations": [] })).into_response();
    };
    let unread = store
        .messages
        .iter()
        .filter(|m| m.receiver_id == DONOR_ID && !m.is_read)
        .count();
    Json(json!({
        "conversations": [{
            "partner_id": PARTNER_ID,
            "partner_name": "Clean Water Trust",
            "last_message": last.content,
            "last_message_at": last.created_at,
            "unread_count": unread,
        }]
    }))
    .into_response()
}

async fn conversation(State(state): State<Shared>, headers: HeaderMap, Path(partner): Path<i64>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let mut store = state.store();
    let mut thread = Vec::new();
    for message in store.messages.iter_mut() {
        if message.sender_id == partner || message.receiver_id == partner {
            if message.receiver_id == DONOR_ID {
                message.is_read = true;
            }
            thread.push(message.clone());
        }
    }
    // Newest first, to make sure the client sorts.
    thread.reverse();
    Json(json!({ "messages": thread })).into_response()
}

async fn send_message(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<NewMessage>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.counters.send_message.fetch_add(1, Ordering::SeqCst);
    if body.content.trim().is_empty() {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Message content is required");
    }
    let mut store = state.store();
    let last = store.messages.iter().map(|m| m.created_at).max().unwrap_or_else(epoch);
    let message = Message {
        id: store.messages.len() as i64 + 1,
        sender_id: DONOR_ID,
        receiver_id: body.receiver_id,
        content: body.content,
        created_at: last + Duration::minutes(1),
        is_read: true,
    };
    store.messages.push(message.clone());
    (StatusCode::CREATED, Json(json!({ "message": message }))).into_response()
}

async fn load_preferences(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let preferences = state.store().preferences.clone();
    Json(json!({ "preferences": preferences })).into_response()
}

async fn save_preferences(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.counters.save_preferences.fetch_add(1, Ordering::SeqCst);
    let Some(preferences) = body.get("preferences").filter(|p| p.is_object()).cloned() else {
        return error(StatusCode::BAD_REQUEST, "preferences object is required");
    };
    state.store().preferences = preferences.clone();
    Json(json!({ "preferences": preferences })).into_response()
}

async fn list_sessions(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let sessions = state.store().sessions.clone();
    Json(json!({ "sessions": sessions })).into_response()
}

async fn revoke_session(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let mut store = state.store();
    match store.sessions.iter().position(|s| s.id == id) {
        Some(index) if store.sessions[index].is_current => {
            error(StatusCode::BAD_REQUEST, "You cannot revoke your current session")
        }
        Some(index) => {
            store.sessions.remove(index);
            StatusCode::NO_CONTENT.into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Session not found"),
    }
}

async fn revoke_all(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let mut store = state.store();
    let before = store.sessions.len();
    store.sessions.retain(|s| s.is_current);
    let revoked = before - store.sessions.len();
    Json(json!({ "revoked_count": revoked })).into_response()
}

async fn load_tax_info(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let tax_info = state.store().tax_info.clone();
    Json(json!({ "tax_info": tax_info })).into_response()
}

async fn save_tax_info(State(state): State<Shared>, headers: HeaderMap, Json(mut info): Json<TaxInfo>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    if info.postcode.eq_ignore_ascii_case("invalid") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "Postcode is not valid" })),
        )
            .into_response();
    }
    info.postcode = info.postcode.to_uppercase();
    state.store().tax_info = Some(info.clone());
    Json(json!({ "tax_info": info })).into_response()
}

async fn export(headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    ([(CONTENT_TYPE, "application/zip")], ZIP_BYTES).into_response()
}

async fn statement(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    match params.get("year").and_then(|y| y.parse::<i32>().ok()) {
        Some(MISSING_STATEMENT_YEAR) => {
            let message = format!("No donations recorded for {MISSING_STATEMENT_YEAR}.");
            error(StatusCode::NOT_FOUND, &message)
        }
        Some(_) => ([(CONTENT_TYPE, "application/pdf")], PDF_BYTES).into_response(),
        None => error(StatusCode::BAD_REQUEST, "year is required"),
    }
}
