//! Shared helpers for the SNS client conformance suite.
//!
//! [`spawn_server`] binds a `TcpListener` on an ephemeral port and serves an
//! in-memory imitation of the SNS server: accounts, cookie sessions, posts
//! with hex ids, a newest-first timeline, owner-only edits and deletes. Every
//! request that reaches it is recorded so tests can assert exactly what the
//! client put on the wire.
//!
//! [`spawn_fixed`] serves one canned response for every path, for the
//! failure-mode properties (non-JSON bodies, 500 with a JSON body).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    body::{Body, Bytes},
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use sns_api::{error::messages, ErrorResponse, Post, PostId};

/// Name of the session cookie, as issued by the real server.
pub const SESSION_COOKIE: &str = "sessionid";

/// Error message for credentialed endpoints called without a session.
pub const LOGIN_REQUIRED: &str = "Authentication required";

/// First timestamp handed out to posts; each new post is one second later.
pub const CLOCK_START: i64 = 1_700_000_000;

const MAX_CONTENT_CHARS: usize = 1000;

// ---------------------------------------------------------------------------
// Recorded requests
// ---------------------------------------------------------------------------

/// One request as the server received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path exactly as sent, still percent-encoded.
    pub path: String,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    /// The body parsed as JSON, or `None` when it is empty or not JSON.
    pub fn json(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

struct StoredPost {
    id: String,
    account: String,
    time: i64,
    content: String,
    liked: u64,
    related: Option<String>,
}

impl StoredPost {
    fn to_post(&self) -> Post {
        Post {
            id: PostId::Key(self.id.clone()),
            account: self.account.clone(),
            time: self.time,
            content: self.content.clone(),
            liked: self.liked,
            related: self.related.clone().map(PostId::Key),
        }
    }
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, String>,
    sessions: HashMap<String, String>,
    posts: Vec<StoredPost>,
    requests: Vec<RecordedRequest>,
    next_post: u64,
    next_session: u64,
}

impl Inner {
    fn find_post(&self, id: &str) -> Option<usize> {
        self.posts.iter().position(|p| p.id == id)
    }
}

/// Handle on a running mock server's state.
#[derive(Clone, Default)]
pub struct MockSns {
    inner: Arc<RwLock<Inner>>,
}

impl MockSns {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.read().unwrap().requests.clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.inner.read().unwrap().requests.last().cloned()
    }

    pub fn clear_requests(&self) {
        self.inner.write().unwrap().requests.clear();
    }

    /// Create an account directly, bypassing `/signup/`.
    pub fn seed_user(&self, username: &str, password: &str) {
        self.inner
            .write()
            .unwrap()
            .users
            .insert(username.to_string(), password.to_string());
    }

    /// Insert a post directly and return its id.
    pub fn seed_post(&self, account: &str, content: &str) -> String {
        let mut inner = self.inner.write().unwrap();
        insert_post(&mut inner, account, content, None)
    }

    pub fn post_count(&self) -> usize {
        self.inner.read().unwrap().posts.len()
    }

    /// Number of sessions currently logged in.
    pub fn session_count(&self) -> usize {
        self.inner.read().unwrap().sessions.len()
    }

    fn record(&self, req: RecordedRequest) {
        self.inner.write().unwrap().requests.push(req);
    }
}

fn insert_post(inner: &mut Inner, account: &str, content: &str, related: Option<String>) -> String {
    let n = inner.next_post;
    inner.next_post += 1;
    let id = format!("{n:064x}");
    inner.posts.push(StoredPost {
        id: id.clone(),
        account: account.to_string(),
        time: CLOCK_START + n as i64,
        content: content.to_string(),
        liked: 0,
        related,
    });
    id
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Start the mock server and return `(origin, handle)`.
///
/// The origin has no trailing slash, e.g. `http://127.0.0.1:51234`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound.
pub async fn spawn_server() -> (String, MockSns) {
    let mock = MockSns::new();
    let router = build_router(mock.clone());
    (spawn_router(router).await, mock)
}

/// Start a server that answers every request with `status`, `content_type`
/// and `body`, still recording what it receives.
pub async fn spawn_fixed(
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
) -> (String, MockSns) {
    let mock = MockSns::new();
    let router = Router::new()
        .fallback(move || async move {
            (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
        })
        .layer(middleware::from_fn_with_state(mock.clone(), record));
    (spawn_router(router).await, mock)
}

/// Serve `router` on `127.0.0.1:0` in a background task.
pub async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("mock server error");
    });
    format!("http://{addr}")
}

/// Routes of the real server, backed by `mock`.
pub fn build_router(mock: MockSns) -> Router {
    Router::new()
        .route("/signup/", post(signup))
        .route("/login/", post(login))
        .route("/logout/", post(logout))
        .route("/view/{post_id}/", get(view_post))
        .route("/timeline/{number}/", get(timeline))
        .route("/like/{post_id}/", get(like_post))
        .route("/post/", post(create_post))
        .route("/edit/{post_id}/", post(edit_post))
        .route("/delete/{post_id}/", post(delete_post))
        .layer(middleware::from_fn_with_state(mock.clone(), record))
        .with_state(mock)
}

async fn record(State(mock): State<MockSns>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    let header_str = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    mock.record(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        cookie: header_str(header::COOKIE),
        content_type: header_str(header::CONTENT_TYPE),
        body: bytes.clone(),
    });
    tracing::debug!("mock: {} {}", parts.method, parts.uri.path());
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Username of the logged-in caller, or the 401 response to return.
fn current_user(mock: &MockSns, headers: &HeaderMap) -> Result<String, Response> {
    let inner = mock.inner.read().unwrap();
    session_token(headers)
        .and_then(|token| inner.sessions.get(&token).cloned())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, LOGIN_REQUIRED))
}

fn parse_body(body: &Bytes) -> Result<Value, Response> {
    serde_json::from_slice(body).map_err(|_| error(StatusCode::BAD_REQUEST, messages::INVALID_JSON))
}

fn credentials(data: &Value) -> Result<(String, String), Response> {
    let username = data
        .get("username")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    let password = data.get("password").and_then(Value::as_str).unwrap_or("");
    if username.is_empty() || password.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, messages::CREDENTIALS_REQUIRED));
    }
    Ok((username.to_string(), password.to_string()))
}

/// Validated `(content, related)` of a post draft.
fn draft(inner: &Inner, data: &Value) -> Result<(String, Option<String>), Response> {
    let content = data
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    if content.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, messages::CONTENT_REQUIRED));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(error(StatusCode::BAD_REQUEST, messages::CONTENT_TOO_LONG));
    }
    let related = match data.get("related") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) if n.as_u64() != Some(0) => Some(n.to_string()),
        _ => None,
    };
    if let Some(id) = &related {
        if inner.find_post(id).is_none() {
            return Err(error(StatusCode::NOT_FOUND, messages::RELATED_NOT_FOUND));
        }
    }
    Ok((content.to_string(), related))
}

// ---------------------------------------------------------------------------
// Account handlers
// ---------------------------------------------------------------------------

async fn signup(State(mock): State<MockSns>, body: Bytes) -> Response {
    let data = match parse_body(&body) {
        Ok(d) => d,
        Err(r) => return r,
    };
    let (username, password) = match credentials(&data) {
        Ok(c) => c,
        Err(r) => return r,
    };
    let mut inner = mock.inner.write().unwrap();
    if inner.users.contains_key(&username) {
        return error(StatusCode::BAD_REQUEST, messages::USERNAME_TAKEN);
    }
    inner.users.insert(username, password);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Account created successfully" })),
    )
        .into_response()
}

async fn login(State(mock): State<MockSns>, body: Bytes) -> Response {
    let data = match parse_body(&body) {
        Ok(d) => d,
        Err(r) => return r,
    };
    let (username, password) = match credentials(&data) {
        Ok(c) => c,
        Err(r) => return r,
    };
    let mut inner = mock.inner.write().unwrap();
    if inner.users.get(&username) != Some(&password) {
        return error(StatusCode::UNAUTHORIZED, messages::INVALID_CREDENTIALS);
    }
    let token = format!("{:032x}", inner.next_session);
    inner.next_session += 1;
    inner.sessions.insert(token.clone(), username);
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly"),
        )],
        Json(json!({ "message": "Login successful" })),
    )
        .into_response()
}

async fn logout(State(mock): State<MockSns>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        mock.inner.write().unwrap().sessions.remove(&token);
    }
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}=; Max-Age=0; Path=/"),
        )],
        Json(json!({ "message": "Logout successful" })),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Public post handlers
// ---------------------------------------------------------------------------

async fn view_post(State(mock): State<MockSns>, Path(post_id): Path<String>) -> Response {
    let inner = mock.inner.read().unwrap();
    match inner.find_post(&post_id) {
        Some(i) => Json(inner.posts[i].to_post()).into_response(),
        None => error(StatusCode::NOT_FOUND, messages::POST_NOT_FOUND),
    }
}

async fn timeline(State(mock): State<MockSns>, Path(number): Path<String>) -> Response {
    let number = match number.parse::<i64>() {
        Ok(n) if n > 0 => n as usize,
        _ => return error(StatusCode::BAD_REQUEST, messages::INVALID_NUMBER),
    };
    let inner = mock.inner.read().unwrap();
    let mut posts: Vec<&StoredPost> = inner.posts.iter().collect();
    posts.sort_by(|a, b| b.time.cmp(&a.time));
    let page: Vec<Post> = posts.into_iter().take(number).map(StoredPost::to_post).collect();
    Json(page).into_response()
}

async fn like_post(State(mock): State<MockSns>, Path(post_id): Path<String>) -> Response {
    let mut inner = mock.inner.write().unwrap();
    match inner.find_post(&post_id) {
        Some(i) => {
            inner.posts[i].liked += 1;
            Json(json!({ "liked": inner.posts[i].liked })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, messages::POST_NOT_FOUND),
    }
}

// ---------------------------------------------------------------------------
// Authenticated post handlers
// ---------------------------------------------------------------------------

async fn create_post(State(mock): State<MockSns>, headers: HeaderMap, body: Bytes) -> Response {
    let user = match current_user(&mock, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    let data = match parse_body(&body) {
        Ok(d) => d,
        Err(r) => return r,
    };
    let mut inner = mock.inner.write().unwrap();
    let (content, related) = match draft(&inner, &data) {
        Ok(d) => d,
        Err(r) => return r,
    };
    let id = insert_post(&mut inner, &user, &content, related);
    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

/// Index of `post_id` if it exists and belongs to `user`.
fn owned_post(inner: &Inner, post_id: &str, user: &str) -> Result<usize, Response> {
    let i = inner
        .find_post(post_id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, messages::POST_NOT_FOUND))?;
    if inner.posts[i].account != user {
        return Err(error(StatusCode::FORBIDDEN, messages::PERMISSION_DENIED));
    }
    Ok(i)
}

async fn edit_post(
    State(mock): State<MockSns>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let user = match current_user(&mock, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    let mut inner = mock.inner.write().unwrap();
    let i = match owned_post(&inner, &post_id, &user) {
        Ok(i) => i,
        Err(r) => return r,
    };
    let data = match parse_body(&body) {
        Ok(d) => d,
        Err(r) => return r,
    };
    let (content, related) = match draft(&inner, &data) {
        Ok(d) => d,
        Err(r) => return r,
    };
    inner.posts[i].content = content;
    inner.posts[i].related = related;
    Json(json!({})).into_response()
}

async fn delete_post(
    State(mock): State<MockSns>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = match current_user(&mock, &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    let mut inner = mock.inner.write().unwrap();
    let i = match owned_post(&inner, &post_id, &user) {
        Ok(i) => i,
        Err(r) => return r,
    };
    let removed = inner.posts.remove(i);
    // Replies go with the post they answer, down to the last level.
    let mut doomed = vec![removed.id];
    loop {
        let before = inner.posts.len();
        inner.posts.retain(|p| match p.related.as_deref() {
            Some(parent) if doomed.iter().any(|d| d == parent) => {
                doomed.push(p.id.clone());
                false
            }
            _ => true,
        });
        if inner.posts.len() == before {
            break;
        }
    }
    Json(json!({})).into_response()
}
