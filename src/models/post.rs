// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Published posts and account summaries as returned by the backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Audience scope of a federated post.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    /// Followers only.
    Private,
    /// Mentioned recipients only.
    Direct,
}

impl Visibility {
    pub const ALL: [Visibility; 4] = [
        Visibility::Public,
        Visibility::Unlisted,
        Visibility::Private,
        Visibility::Direct,
    ];

    /// Value sent in the `visibility` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
            Visibility::Direct => "direct",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Unlisted => "Unlisted",
            Visibility::Private => "Followers only",
            Visibility::Direct => "Direct",
        }
    }
}

/// Post identifier; numeric for locally stored posts, string for federated ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Number(u64),
    Text(String),
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Number(n) => write!(f, "{n}"),
            PostId::Text(s) => f.write_str(s),
        }
    }
}

/// A previously published post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "createdAt", alias = "created_at", alias = "posted_at", default)]
    pub created_at: String,
    #[serde(rename = "mediaCount", alias = "media_count", default)]
    pub media_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Post {
    /// Creation time as `YYYY-MM-DD HH:MM UTC`, or the raw value when it is not RFC 3339.
    pub fn display_time(&self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
        OffsetDateTime::parse(&self.created_at, &Rfc3339)
            .ok()
            .and_then(|dt| dt.to_offset(time::UtcOffset::UTC).format(&format).ok())
            .unwrap_or_else(|| self.created_at.clone())
    }
}

/// Summary of the connected federated account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
}
