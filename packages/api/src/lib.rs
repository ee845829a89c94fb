//! Request and response types for the SNS posting API.
//!
//! This crate encodes the HTTP contract of the SNS server as Rust types.
//! The client in `sns-client` returns response bodies verbatim as
//! [`serde_json::Value`]; the types here are the typed views a caller can
//! deserialize those values into once it knows which endpoint produced them.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | POST | `/signup/` | [`Credentials`] → [`MessageResponse`] |
//! | POST | `/login/` | [`Credentials`] → [`MessageResponse`] |
//! | POST | `/logout/` | → [`MessageResponse`] |
//! | GET | `/view/{id}/` | → [`Post`] |
//! | GET | `/timeline/{count}/` | → `Vec<`[`Post`]`>` |
//! | GET | `/like/{id}/` | → [`LikeResponse`] |
//! | POST | `/post/` | [`PostDraft`] → [`CreatedPost`] |
//! | POST | `/edit/{id}/` | [`PostDraft`] → `{}` |
//! | POST | `/delete/{id}/` | → `{}` |
//!
//! Every endpoint may instead answer with an [`ErrorResponse`] and a 4xx/5xx
//! status.

pub mod auth;
pub mod error;
pub mod post;

pub use auth::{Credentials, MessageResponse};
pub use error::ErrorResponse;
pub use post::{CreatedPost, LikeResponse, Post, PostDraft, PostId};
