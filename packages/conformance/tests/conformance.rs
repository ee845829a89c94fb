//! End-to-end conformance tests for `sns-client`.
//!
//! Each test spawns an ephemeral in-process mock server (real TCP, real
//! HTTP) via [`sns_conformance::spawn_server`] or
//! [`sns_conformance::spawn_fixed`], drives it through [`SnsClient`], and
//! checks both the returned values and the requests the server recorded.
//!
//! # Coverage
//!
//! | Test | Property |
//! |------|----------|
//! | `signup_sends_two_fields_without_cookie` | signup body, no ambient credentials |
//! | `login_stores_and_resends_session_cookie` | login credentials + cookie round trip |
//! | `reads_are_anonymous_gets_without_body` | view / timeline / like wire shape |
//! | `create_post_body_with_and_without_related` | `{content, related}` body |
//! | `edit_post_sends_path_and_draft` | edit path, cookie and `{content, related}` body |
//! | `writes_carry_the_session_cookie` | create / edit / delete credentials |
//! | `post_lifecycle` | signup → login → create → edit → like → delete, nested replies cascade |
//! | `other_users_posts_are_forbidden` | 403 body returned as a value |
//! | `logout_ends_the_session` | logout credentials + server-side effect |
//! | `timeline_is_newest_first_and_bounded` | count parameter |
//! | `identifiers_are_percent_encoded` | path escaping |
//! | `error_status_with_json_body_is_not_a_failure` | 500 + JSON resolves |
//! | `non_json_body_is_a_failure` | HTML body fails for all nine operations |
//! | `empty_body_is_a_failure` | empty body fails |
//! | `concurrent_likes_are_independent` | no shared state in the client |
//! | `post_time_formats_as_date` | `format_date_in` on server timestamps |

use std::time::Duration;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{json, Value};
use sns_api::{error::messages, CreatedPost, ErrorResponse, LikeResponse, Post, PostId};
use sns_client::{format_date_in, ClientConfig, ClientError, Session, SnsClient};
use sns_conformance::{spawn_fixed, spawn_server, MockSns, CLOCK_START, LOGIN_REQUIRED};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_client(origin: &str) -> SnsClient {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    SnsClient::with_http_client(http, &ClientConfig::new(origin), Session::new()).unwrap()
}

/// Seed `alice` on the server and log the client in as her.
async fn logged_in(base: &str, mock: &MockSns) -> SnsClient {
    mock.seed_user("alice", "pw");
    let client = make_client(base);
    let body = client.login("alice", "pw").await.unwrap();
    assert_eq!(body, json!({ "message": "Login successful" }));
    client
}

fn error_of(value: &Value) -> Option<String> {
    ErrorResponse::from_value(value).map(|e| e.error)
}

/// Run all nine operations once, in order.
async fn run_all(client: &SnsClient) -> Vec<(&'static str, Result<Value, ClientError>)> {
    vec![
        ("signup", client.signup("u", "p").await),
        ("login", client.login("u", "p").await),
        ("logout", client.logout().await),
        ("view", client.view_post(1u64).await),
        ("timeline", client.get_timeline(5).await),
        ("like", client.like_post(1u64).await),
        ("create", client.create_post("c", None).await),
        ("edit", client.edit_post(1u64, "c", None).await),
        ("delete", client.delete_post(1u64).await),
    ]
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signup_sends_two_fields_without_cookie() {
    let (base, mock) = spawn_server().await;
    // Log in first so the session holds a cookie signup must not send.
    let client = logged_in(&base, &mock).await;
    mock.clear_requests();

    let body = client.signup("bob", "secret").await.unwrap();
    assert_eq!(body, json!({ "message": "Account created successfully" }));

    let requests = mock.requests();
    assert_eq!(requests.len(), 1, "signup must issue exactly one request");
    let req = &requests[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/signup/");
    assert_eq!(req.cookie, None, "signup must not carry the session");
    assert_eq!(req.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        req.json(),
        Some(json!({ "username": "bob", "password": "secret" }))
    );
}

#[tokio::test]
async fn login_stores_and_resends_session_cookie() {
    let (base, mock) = spawn_server().await;
    let client = logged_in(&base, &mock).await;

    let first = mock.last_request().unwrap();
    assert_eq!(first.method, "POST");
    assert_eq!(first.path, "/login/");
    assert_eq!(first.json(), Some(json!({ "username": "alice", "password": "pw" })));

    let saved = client.session().export(client.origin()).unwrap();
    assert!(saved.starts_with("sessionid="), "got {saved}");

    client.login("alice", "pw").await.unwrap();
    let second = mock.last_request().unwrap();
    assert_eq!(second.cookie.as_deref(), Some(saved.as_str()));
}

#[tokio::test]
async fn reads_are_anonymous_gets_without_body() {
    let (base, mock) = spawn_server().await;
    let client = logged_in(&base, &mock).await;
    let id = mock.seed_post("alice", "hello");
    mock.clear_requests();

    client.view_post(id.as_str()).await.unwrap();
    client.get_timeline(7).await.unwrap();
    client.like_post(id.as_str()).await.unwrap();

    let requests = mock.requests();
    let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            format!("/view/{id}/").as_str(),
            "/timeline/7/",
            format!("/like/{id}/").as_str(),
        ]
    );
    for req in &requests {
        assert_eq!(req.method, "GET", "{}", req.path);
        assert!(req.body.is_empty(), "{} has a body", req.path);
        assert_eq!(req.cookie, None, "{} carried the session", req.path);
    }
}

#[tokio::test]
async fn create_post_body_with_and_without_related() {
    let (base, mock) = spawn_server().await;
    let client = logged_in(&base, &mock).await;

    client.create_post("plain", None).await.unwrap();
    let req = mock.last_request().unwrap();
    assert_eq!(req.path, "/post/");
    assert_eq!(req.json(), Some(json!({ "content": "plain", "related": null })));

    let body = client
        .create_post("reply", Some(PostId::Number(5)))
        .await
        .unwrap();
    let req = mock.last_request().unwrap();
    assert_eq!(req.json(), Some(json!({ "content": "reply", "related": 5 })));
    // No post 5 exists: the 404 body comes back as a value.
    assert_eq!(error_of(&body).as_deref(), Some(messages::RELATED_NOT_FOUND));
}

#[tokio::test]
async fn edit_post_sends_path_and_draft() {
    let (base, mock) = spawn_server().await;
    let client = logged_in(&base, &mock).await;
    let parent = mock.seed_post("alice", "parent");
    let id = mock.seed_post("alice", "before");
    let session = client.session().export(client.origin()).unwrap();
    mock.clear_requests();

    let body = client
        .edit_post(id.as_str(), "after", Some(PostId::Key(parent.clone())))
        .await
        .unwrap();
    assert_eq!(body, json!({}));

    let requests = mock.requests();
    assert_eq!(requests.len(), 1, "edit must issue exactly one request");
    let req = &requests[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, format!("/edit/{id}/"));
    assert_eq!(req.cookie.as_deref(), Some(session.as_str()));
    assert_eq!(req.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        req.json(),
        Some(json!({ "content": "after", "related": parent }))
    );

    let post: Post = serde_json::from_value(client.view_post(id.as_str()).await.unwrap()).unwrap();
    assert_eq!(post.content, "after");
    assert_eq!(post.related, Some(PostId::Key(parent)));
}

#[tokio::test]
async fn writes_carry_the_session_cookie() {
    let (base, mock) = spawn_server().await;
    let client = logged_in(&base, &mock).await;
    let session = client.session().export(client.origin()).unwrap();

    let created: CreatedPost =
        serde_json::from_value(client.create_post("x", None).await.unwrap()).unwrap();
    client
        .edit_post(created.id.clone(), "y", None)
        .await
        .unwrap();
    client.delete_post(created.id).await.unwrap();
    client.logout().await.unwrap();

    let requests = mock.requests();
    let writes = &requests[requests.len() - 4..];
    for req in writes {
        assert_eq!(req.method, "POST", "{}", req.path);
        assert_eq!(req.cookie.as_deref(), Some(session.as_str()), "{}", req.path);
    }
    assert!(writes[3].body.is_empty(), "logout has no body");
    assert!(writes[2].body.is_empty(), "delete has no body");
}

// ---------------------------------------------------------------------------
// Behaviour against the mock server
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_lifecycle() {
    let (base, mock) = spawn_server().await;
    let client = make_client(&base);

    client.signup("carol", "pw").await.unwrap();
    let again = client.signup("carol", "pw").await.unwrap();
    assert_eq!(error_of(&again).as_deref(), Some(messages::USERNAME_TAKEN));

    let denied = client.login("carol", "wrong").await.unwrap();
    assert_eq!(error_of(&denied).as_deref(), Some(messages::INVALID_CREDENTIALS));
    client.login("carol", "pw").await.unwrap();

    let created: CreatedPost =
        serde_json::from_value(client.create_post("first!", None).await.unwrap()).unwrap();
    let reply: CreatedPost = serde_json::from_value(
        client
            .create_post("second", Some(created.id.clone()))
            .await
            .unwrap(),
    )
    .unwrap();

    let nested: CreatedPost = serde_json::from_value(
        client
            .create_post("third", Some(reply.id.clone()))
            .await
            .unwrap(),
    )
    .unwrap();
    assert_eq!(mock.post_count(), 3);

    let post: Post = serde_json::from_value(client.view_post(reply.id.clone()).await.unwrap()).unwrap();
    assert_eq!(post.account, "carol");
    assert_eq!(post.content, "second");
    assert_eq!(post.related, Some(created.id.clone()));

    let edited = client
        .edit_post(created.id.clone(), "first, edited", None)
        .await
        .unwrap();
    assert_eq!(edited, json!({}));
    let post: Post = serde_json::from_value(client.view_post(created.id.clone()).await.unwrap()).unwrap();
    assert_eq!(post.content, "first, edited");

    let liked: LikeResponse =
        serde_json::from_value(client.like_post(created.id.clone()).await.unwrap()).unwrap();
    assert_eq!(liked.liked, 1);

    assert_eq!(client.delete_post(created.id.clone()).await.unwrap(), json!({}));
    let gone = client.view_post(created.id).await.unwrap();
    assert_eq!(error_of(&gone).as_deref(), Some(messages::POST_NOT_FOUND));
    let nested_gone = client.view_post(nested.id).await.unwrap();
    assert_eq!(error_of(&nested_gone).as_deref(), Some(messages::POST_NOT_FOUND));
    assert_eq!(mock.post_count(), 0, "replies are removed with their parent");
}

#[tokio::test]
async fn other_users_posts_are_forbidden() {
    let (base, mock) = spawn_server().await;
    let client = logged_in(&base, &mock).await;
    let id = mock.seed_post("mallory", "not yours");

    let edit = client.edit_post(id.as_str(), "mine now", None).await.unwrap();
    assert_eq!(error_of(&edit).as_deref(), Some(messages::PERMISSION_DENIED));
    let delete = client.delete_post(id.as_str()).await.unwrap();
    assert_eq!(error_of(&delete).as_deref(), Some(messages::PERMISSION_DENIED));
    assert_eq!(mock.post_count(), 1);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let (base, mock) = spawn_server().await;
    let client = logged_in(&base, &mock).await;
    assert_eq!(mock.session_count(), 1);

    let body = client.logout().await.unwrap();
    assert_eq!(body, json!({ "message": "Logout successful" }));
    assert_eq!(mock.session_count(), 0);

    let denied = client.create_post("after logout", None).await.unwrap();
    assert_eq!(error_of(&denied).as_deref(), Some(LOGIN_REQUIRED));
}

#[tokio::test]
async fn anonymous_writes_get_an_error_body() {
    let (base, _mock) = spawn_server().await;
    let client = make_client(&base);
    let body = client.create_post("hi", None).await.unwrap();
    assert_eq!(error_of(&body).as_deref(), Some(LOGIN_REQUIRED));
}

#[tokio::test]
async fn timeline_is_newest_first_and_bounded() {
    let (base, mock) = spawn_server().await;
    let client = make_client(&base);
    let ids: Vec<String> = (0..3).map(|i| mock.seed_post("alice", &format!("p{i}"))).collect();

    let page: Vec<Post> = serde_json::from_value(client.get_timeline(2).await.unwrap()).unwrap();
    let got: Vec<PostId> = page.into_iter().map(|p| p.id).collect();
    assert_eq!(
        got,
        vec![PostId::Key(ids[2].clone()), PostId::Key(ids[1].clone())]
    );

    let invalid = client.get_timeline(0).await.unwrap();
    assert_eq!(error_of(&invalid).as_deref(), Some(messages::INVALID_NUMBER));
}

#[tokio::test]
async fn identifiers_are_percent_encoded() {
    let (base, mock) = spawn_server().await;
    let client = make_client(&base);

    let body = client.view_post("a b/c?d").await.unwrap();
    assert_eq!(mock.last_request().unwrap().path, "/view/a%20b%2Fc%3Fd/");
    assert_eq!(error_of(&body).as_deref(), Some(messages::POST_NOT_FOUND));

    let err = client.like_post("").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidPostId));
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn error_status_with_json_body_is_not_a_failure() {
    let (base, mock) = spawn_fixed(
        StatusCode::INTERNAL_SERVER_ERROR,
        "application/json",
        r#"{"error":"Internal server error"}"#,
    )
    .await;
    let client = make_client(&base);

    for (op, result) in run_all(&client).await {
        let body = result.unwrap_or_else(|e| panic!("{op} failed: {e}"));
        assert_eq!(
            error_of(&body).as_deref(),
            Some(messages::INTERNAL_ERROR),
            "{op}"
        );
    }
    assert_eq!(mock.requests().len(), 9, "one request per operation");
}

#[tokio::test]
async fn non_json_body_is_a_failure() {
    let (base, _mock) = spawn_fixed(StatusCode::OK, "text/html", "<html>hi</html>").await;
    let client = make_client(&base);

    for (op, result) in run_all(&client).await {
        match result {
            Err(ClientError::Decode { status, .. }) => assert_eq!(status, 200, "{op}"),
            other => panic!("{op}: expected a decode failure, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn empty_body_is_a_failure() {
    let (base, _mock) = spawn_fixed(StatusCode::NO_CONTENT, "application/json", "").await;
    let client = make_client(&base);
    let err = client.get_timeline(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { status: 204, .. }), "{err:?}");
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_likes_are_independent() {
    let (base, mock) = spawn_server().await;
    let client = make_client(&base);
    let id = mock.seed_post("alice", "popular");

    let (a, b) = tokio::join!(client.like_post(id.as_str()), client.like_post(id.as_str()));
    let mut counts = vec![
        a.unwrap()["liked"].as_u64().unwrap(),
        b.unwrap()["liked"].as_u64().unwrap(),
    ];
    counts.sort();
    assert_eq!(counts, vec![1, 2]);
}

#[tokio::test]
async fn post_time_formats_as_date() {
    let (base, mock) = spawn_server().await;
    let client = make_client(&base);
    let id = mock.seed_post("alice", "dated");

    let post: Post = serde_json::from_value(client.view_post(id).await.unwrap()).unwrap();
    assert_eq!(post.time, CLOCK_START);
    assert_eq!(
        format_date_in(post.time, &Utc).as_deref(),
        Some("2023-11-14 22:13:20")
    );
}
