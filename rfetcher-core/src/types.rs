use serde::{Deserialize, Serialize};
use std::fmt;

/// Author handle recorded when the upstream reports no author (deleted or suspended accounts).
pub const DELETED_AUTHOR: &str = "[deleted]";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub author: String,
    pub selftext: String,
    pub score: i64,
    pub url: String,
    pub created_utc: f64,
    pub num_comments: u64,
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
    pub replies: Vec<Comment>,
}

/// Upstream ordering used when requesting a page of posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListingKind {
    #[default]
    Hot,
    New,
    Top,
    Rising,
}

impl ListingKind {
    /// Unrecognised names fall back to [`ListingKind::Hot`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "new" => ListingKind::New,
            "top" => ListingKind::Top,
            "rising" => ListingKind::Rising,
            _ => ListingKind::Hot,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Hot => "hot",
            ListingKind::New => "new",
            ListingKind::Top => "top",
            ListingKind::Rising => "rising",
        }
    }
}

impl From<String> for ListingKind {
    fn from(value: String) -> Self {
        ListingKind::parse(&value)
    }
}

impl From<ListingKind> for String {
    fn from(value: ListingKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword sets applied while fetching. Empty sets impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub post_wanted: Vec<String>,
    #[serde(default)]
    pub post_unwanted: Vec<String>,
    #[serde(default)]
    pub comment_unwanted: Vec<String>,
}

impl FilterSpec {
    pub fn new(
        post_wanted: Vec<String>,
        post_unwanted: Vec<String>,
        comment_unwanted: Vec<String>,
    ) -> Self {
        Self {
            post_wanted,
            post_unwanted,
            comment_unwanted,
        }
    }

    pub fn unfiltered() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            name: name.into(),
            keywords,
        }
    }
}
