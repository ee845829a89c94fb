//! Async client for the SNS posting API.
//!
//! Nine operations, one HTTP request each, every response body returned
//! verbatim as a [`serde_json::Value`]:
//!
//! | Operation | Request | Session cookie |
//! |-----------|---------|----------------|
//! | [`SnsClient::signup`] | `POST /signup/` | not sent |
//! | [`SnsClient::login`] | `POST /login/` | sent, refreshed |
//! | [`SnsClient::logout`] | `POST /logout/` | sent, refreshed |
//! | [`SnsClient::view_post`] | `GET /view/{id}/` | not sent |
//! | [`SnsClient::get_timeline`] | `GET /timeline/{count}/` | not sent |
//! | [`SnsClient::like_post`] | `GET /like/{id}/` | not sent |
//! | [`SnsClient::create_post`] | `POST /post/` | sent, refreshed |
//! | [`SnsClient::edit_post`] | `POST /edit/{id}/` | sent, refreshed |
//! | [`SnsClient::delete_post`] | `POST /delete/{id}/` | sent, refreshed |
//!
//! Failures are limited to transport errors and non-JSON bodies. An error
//! status with a JSON body is returned like any other body.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use sns_client::{ClientConfig, SnsClient, format_date};
//!
//! let client = SnsClient::new(&ClientConfig::from_env())?;
//! client.login("alice", "hunter2").await?;
//! let created = client.create_post("hello", None).await?;
//! let timeline = client.get_timeline(10).await?;
//! println!("{}", format_date(1_700_000_000).unwrap());
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod time;

pub use client::SnsClient;
pub use config::{ClientConfig, DEFAULT_API_SERVER};
pub use error::ClientError;
pub use routes::Route;
pub use session::Session;
pub use sns_api::{PostDraft, PostId};
pub use time::{format_date, format_date_in};
