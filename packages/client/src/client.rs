//! The SNS API client.
//!
//! [`SnsClient`] owns a cloneable [`reqwest::Client`] (which pools
//! connections internally), the parsed origin, and a [`Session`]. Every
//! operation sends exactly one request, reads the whole body and parses it
//! as JSON. Status codes are not inspected; there are no retries.

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use sns_api::{Credentials, PostDraft, PostId};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::routes::Route;
use crate::session::Session;

/// Async client for the SNS posting API.
#[derive(Debug, Clone)]
pub struct SnsClient {
    http: Client,
    origin: Url,
    session: Session,
}

impl SnsClient {
    /// Client with a fresh HTTP client and an empty session.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_session(config, Session::new())
    }

    /// Client sharing an existing session, e.g. one restored from disk.
    pub fn with_session(config: &ClientConfig, session: Session) -> Result<Self, ClientError> {
        Self::with_http_client(Client::new(), config, session)
    }

    /// Fully injected constructor.
    ///
    /// `http` must not have its own cookie store enabled, otherwise cookies
    /// would also travel on requests that are meant to be anonymous.
    pub fn with_http_client(
        http: Client,
        config: &ClientConfig,
        session: Session,
    ) -> Result<Self, ClientError> {
        let origin = parse_origin(&config.api_server)?;
        Ok(Self {
            http,
            origin,
            session,
        })
    }

    /// The origin as a URL, e.g. `http://localhost:8000/`.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ── Account ──────────────────────────────────────────────────────────────

    /// `POST /signup/` without credentials.
    pub async fn signup(&self, username: &str, password: &str) -> Result<Value, ClientError> {
        self.send(Route::Signup, Some(&Credentials::new(username, password)))
            .await
    }

    /// `POST /login/`. On success the server's session cookie lands in
    /// [`SnsClient::session`].
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, ClientError> {
        self.send(Route::Login, Some(&Credentials::new(username, password)))
            .await
    }

    /// `POST /logout/`.
    pub async fn logout(&self) -> Result<Value, ClientError> {
        self.send_empty(Route::Logout).await
    }

    // ── Reading ──────────────────────────────────────────────────────────────

    /// `GET /view/{post_id}/`.
    pub async fn view_post(&self, post_id: impl Into<PostId>) -> Result<Value, ClientError> {
        let id = post_id.into();
        self.send_empty(Route::View(&id)).await
    }

    /// `GET /timeline/{count}/`: the `count` most recent posts, newest first.
    pub async fn get_timeline(&self, count: u32) -> Result<Value, ClientError> {
        self.send_empty(Route::Timeline(count)).await
    }

    /// `GET /like/{post_id}/`, sent anonymously like the other reads.
    pub async fn like_post(&self, post_id: impl Into<PostId>) -> Result<Value, ClientError> {
        let id = post_id.into();
        self.send_empty(Route::Like(&id)).await
    }

    // ── Writing ──────────────────────────────────────────────────────────────

    /// `POST /post/` with `{content, related}`.
    pub async fn create_post(
        &self,
        content: &str,
        related: Option<PostId>,
    ) -> Result<Value, ClientError> {
        if related.as_ref().is_some_and(PostId::is_empty) {
            return Err(ClientError::InvalidPostId);
        }
        self.send(Route::Create, Some(&PostDraft::new(content, related)))
            .await
    }

    /// `POST /edit/{post_id}/` with `{content, related}`.
    pub async fn edit_post(
        &self,
        post_id: impl Into<PostId>,
        content: &str,
        related: Option<PostId>,
    ) -> Result<Value, ClientError> {
        if related.as_ref().is_some_and(PostId::is_empty) {
            return Err(ClientError::InvalidPostId);
        }
        let id = post_id.into();
        self.send(Route::Edit(&id), Some(&PostDraft::new(content, related)))
            .await
    }

    /// `POST /delete/{post_id}/`.
    pub async fn delete_post(&self, post_id: impl Into<PostId>) -> Result<Value, ClientError> {
        let id = post_id.into();
        self.send_empty(Route::Delete(&id)).await
    }

    // ── Transport ────────────────────────────────────────────────────────────

    /// Absolute URL of `route`: the origin with the route path appended.
    pub fn url_for(&self, route: &Route<'_>) -> Result<Url, ClientError> {
        if route.post_id().is_some_and(PostId::is_empty) {
            return Err(ClientError::InvalidPostId);
        }
        let base = self.origin.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{}", route.path()))
            .map_err(|e| ClientError::InvalidOrigin(e.to_string()))
    }

    async fn send_empty(&self, route: Route<'_>) -> Result<Value, ClientError> {
        self.send::<()>(route, None).await
    }

    async fn send<B>(&self, route: Route<'_>, body: Option<&B>) -> Result<Value, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(&route)?;
        let method = route.method();
        let credentials = route.sends_credentials();

        let mut req = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            req = req.json(body);
        }
        if credentials {
            if let Some(cookie) = self.session.cookie_header(&url) {
                req = req.header(COOKIE, cookie);
            }
        }

        debug!("{method} {url} (credentials: {credentials})");
        let response = req.send().await?;
        let status = response.status();
        debug!("{method} {url} -> {status}");

        if credentials {
            self.session
                .store(response.headers().get_all(SET_COOKIE).iter(), &url);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            status: status.as_u16(),
            source,
        })
    }
}

impl Default for SnsClient {
    /// Client for `http://localhost:8000` with an empty session.
    fn default() -> Self {
        Self {
            http: Client::new(),
            origin: Url::parse(crate::config::DEFAULT_API_SERVER)
                .unwrap_or_else(|e| panic!("default origin must parse: {e}")),
            session: Session::new(),
        }
    }
}

fn parse_origin(api_server: &str) -> Result<Url, ClientError> {
    let trimmed = api_server.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ClientError::InvalidOrigin(format!("{api_server}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(ClientError::InvalidOrigin(format!(
            "{api_server}: expected an http(s) origin"
        )));
    }
    // Route paths are appended verbatim; a query or fragment would swallow them.
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ClientError::InvalidOrigin(format!(
            "{api_server}: origin must not carry a query or fragment"
        )));
    }
    Ok(url)
}
