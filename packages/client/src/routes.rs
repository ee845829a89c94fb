//! Endpoint table: method, path and credential policy of every operation.
//!
//! A [`Route`] is pure data: it knows how its path is spelled and whether the
//! session cookie travels with it, but performs no I/O. [`SnsClient`] turns a
//! route into a request.
//!
//! [`SnsClient`]: crate::SnsClient

use reqwest::Method;
use sns_api::PostId;
use urlencoding::encode;

/// One of the nine server endpoints, with its path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Signup,
    Login,
    Logout,
    View(&'a PostId),
    Timeline(u32),
    Like(&'a PostId),
    Create,
    Edit(&'a PostId),
    Delete(&'a PostId),
}

impl Route<'_> {
    /// HTTP method. `Like` is a `GET` even though it changes server state.
    pub fn method(&self) -> Method {
        match self {
            Route::View(_) | Route::Timeline(_) | Route::Like(_) => Method::GET,
            Route::Signup
            | Route::Login
            | Route::Logout
            | Route::Create
            | Route::Edit(_)
            | Route::Delete(_) => Method::POST,
        }
    }

    /// Whether the session cookie is attached to the request and refreshed
    /// from the response.
    ///
    /// Signup has no session yet; the read endpoints (and like) are sent
    /// anonymously.
    pub fn sends_credentials(&self) -> bool {
        matches!(
            self,
            Route::Login | Route::Logout | Route::Create | Route::Edit(_) | Route::Delete(_)
        )
    }

    /// Path relative to the origin, with identifiers percent-encoded.
    pub fn path(&self) -> String {
        match self {
            Route::Signup => "/signup/".into(),
            Route::Login => "/login/".into(),
            Route::Logout => "/logout/".into(),
            Route::View(id) => format!("/view/{}/", segment(id)),
            Route::Timeline(count) => format!("/timeline/{count}/"),
            Route::Like(id) => format!("/like/{}/", segment(id)),
            Route::Create => "/post/".into(),
            Route::Edit(id) => format!("/edit/{}/", segment(id)),
            Route::Delete(id) => format!("/delete/{}/", segment(id)),
        }
    }

    /// The post identifier in the path, if the route has one.
    pub fn post_id(&self) -> Option<&PostId> {
        match self {
            Route::View(id) | Route::Like(id) | Route::Edit(id) | Route::Delete(id) => Some(id),
            _ => None,
        }
    }
}

fn segment(id: &PostId) -> String {
    encode(&id.to_string()).into_owned()
}
