//! Explicit session state, the cookie jar behind "include credentials".
//!
//! A [`Session`] is handed to the client at construction instead of living
//! in hidden global transport state. Clones share one jar, so a session can
//! be observed or persisted by the caller while the client uses it.

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;

/// Cookie jar shared by all credentialed requests of a client.
#[derive(Clone, Default)]
pub struct Session {
    jar: Arc<Jar>,
}

impl Session {
    /// An empty session (logged out).
    pub fn new() -> Self {
        Self::default()
    }

    /// The `Cookie` header value to send to `url`, if any cookie applies.
    pub fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }

    /// Store every `Set-Cookie` header of a response received from `url`.
    pub fn store<'a, I>(&self, set_cookies: I, url: &Url)
    where
        I: IntoIterator<Item = &'a HeaderValue>,
    {
        let mut iter = set_cookies.into_iter();
        self.jar.set_cookies(&mut iter, url);
    }

    /// `name=value; name2=value2` for everything the jar would send to
    /// `origin`, or `None` when the session is empty.
    pub fn export(&self, origin: &Url) -> Option<String> {
        self.cookie_header(origin)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// Restore cookies previously returned by [`Session::export`].
    pub fn import(&self, origin: &Url, cookies: &str) {
        for pair in cookies.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, origin);
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
