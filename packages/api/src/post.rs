//! Post types for view, timeline, like, create, edit and delete.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a post.
///
/// Older deployments number posts with integers; current servers use the
/// 64-character hex digest of the author id and creation time. Both forms are
/// accepted and each keeps its JSON shape: `Number(5)` serialises as `5`,
/// `Key("ab12…")` as `"ab12…"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum PostId {
    Number(u64),
    Key(String),
}

impl PostId {
    /// `true` for an empty string key, which can never name a post.
    pub fn is_empty(&self) -> bool {
        matches!(self, PostId::Key(k) if k.is_empty())
    }
}

/// Formats the id as it appears in a URL path segment (before escaping).
impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Number(n) => write!(f, "{n}"),
            PostId::Key(k) => f.write_str(k),
        }
    }
}

/// Parses canonical decimal strings that fit in a `u64` as [`PostId::Number`],
/// anything else as [`PostId::Key`]. Zero-padded or signed digits stay keys so
/// that `Display` gives back the input unchanged.
impl FromStr for PostId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<u64>() {
            Ok(n) if n.to_string() == s => PostId::Number(n),
            _ => PostId::Key(s.to_string()),
        })
    }
}

impl From<u64> for PostId {
    fn from(n: u64) -> Self {
        PostId::Number(n)
    }
}

impl From<u32> for PostId {
    fn from(n: u32) -> Self {
        PostId::Number(n.into())
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        PostId::Key(s.to_string())
    }
}

impl From<String> for PostId {
    fn from(s: String) -> Self {
        PostId::Key(s)
    }
}

/// Request body for `POST /post/` and `POST /edit/{id}/`.
///
/// `related` is always present on the wire, as `null` when the post does not
/// reply to another one:
///
/// ```json
/// { "content": "hello", "related": null }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostDraft {
    pub content: String,
    pub related: Option<PostId>,
}

impl PostDraft {
    pub fn new(content: impl Into<String>, related: Option<PostId>) -> Self {
        Self {
            content: content.into(),
            related,
        }
    }
}

/// A post as returned by `GET /view/{id}/` and inside timeline arrays.
///
/// ```json
/// {
///   "ID": "9f86d081884c7d65…",
///   "ACCOUNT": "alice",
///   "TIME": 1700000000,
///   "CONTENT": "hello",
///   "LIKED": 3,
///   "RELATED": null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub struct Post {
    pub id: PostId,

    /// Username of the author.
    pub account: String,

    /// Creation time, Unix epoch seconds.
    pub time: i64,

    pub content: String,

    /// Number of likes received.
    pub liked: u64,

    /// The post this one replies to, if any.
    pub related: Option<PostId>,
}

/// Body of a `201 Created` answer to `POST /post/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedPost {
    pub id: PostId,
}

/// Body of `GET /like/{id}/`: the like count after the increment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeResponse {
    pub liked: u64,
}
