//! Boundary between the fetch pipeline and the upstream content source.
//!
//! Comment threads cross this boundary as [`RawCommentNode`]s: either a real
//! comment or a continuation marker standing in for comments that were not
//! expanded. Expansion is the source's job and happens once per post, bounded
//! by the budget passed to [`ContentSource::fetch_comments`].

use crate::{CoreError, ListingKind};

#[derive(Debug, Clone, PartialEq)]
pub struct RawPost {
    pub id: String,
    /// Type-prefixed identifier (`t3_...`) used as the pagination cursor.
    pub fullname: String,
    pub title: String,
    pub author: Option<String>,
    pub selftext: String,
    pub score: i64,
    pub url: String,
    pub created_utc: f64,
    pub num_comments: u64,
    pub stickied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawCommentNode {
    Comment(RawComment),
    Continuation(ContinuationMarker),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawComment {
    pub id: String,
    pub author: Option<String>,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
    pub replies: Vec<RawCommentNode>,
}

/// Placeholder for comments the upstream did not inline.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationMarker {
    pub id: String,
    pub parent_id: String,
    pub count: u64,
    pub children: Vec<String>,
}

pub trait ContentSource {
    /// Lightweight existence/accessibility check for a subreddit.
    async fn probe_subreddit(&self, subreddit: &str) -> Result<(), CoreError>;

    /// One page of a listing, at most `limit` posts after the `after` cursor.
    async fn fetch_listing(
        &self,
        subreddit: &str,
        kind: ListingKind,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Vec<RawPost>, CoreError>;

    /// Top-level comment nodes of a post, with up to `expand_budget`
    /// continuation markers expanded in place.
    async fn fetch_comments(
        &self,
        post: &RawPost,
        expand_budget: usize,
    ) -> Result<Vec<RawCommentNode>, CoreError>;
}
