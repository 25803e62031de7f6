#![allow(dead_code)]

use rfetcher_core::{
    ContentSource, CoreError, ListingKind, RawComment, RawCommentNode, RawPost, RedditApiError,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct ListingCall {
    pub subreddit: String,
    pub kind: ListingKind,
    pub limit: u32,
    pub after: Option<String>,
}

/// In-memory content source. Serves `posts` in order, or an endless stream
/// of generated posts when `endless` is set.
#[derive(Default)]
pub struct MockSource {
    pub posts: Vec<RawPost>,
    pub endless: bool,
    pub comments: HashMap<String, Vec<RawCommentNode>>,
    pub failing_comments: HashSet<String>,
    pub probe_fails: bool,
    /// Listing requests after this many successful pages fail.
    pub fail_after_pages: Option<usize>,
    pub listing_calls: Mutex<Vec<ListingCall>>,
    pub comment_calls: Mutex<Vec<(String, usize)>>,
    pub probes: Mutex<usize>,
}

impl MockSource {
    pub fn with_posts(posts: Vec<RawPost>) -> Self {
        Self {
            posts,
            ..Default::default()
        }
    }

    pub fn endless() -> Self {
        Self {
            endless: true,
            ..Default::default()
        }
    }

    pub fn listing_calls(&self) -> Vec<ListingCall> {
        self.listing_calls.lock().unwrap().clone()
    }

    pub fn comment_calls(&self) -> Vec<(String, usize)> {
        self.comment_calls.lock().unwrap().clone()
    }

    pub fn probe_count(&self) -> usize {
        *self.probes.lock().unwrap()
    }
}

impl ContentSource for MockSource {
    async fn probe_subreddit(&self, subreddit: &str) -> Result<(), CoreError> {
        *self.probes.lock().unwrap() += 1;
        if self.probe_fails {
            return Err(RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn fetch_listing(
        &self,
        subreddit: &str,
        kind: ListingKind,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Vec<RawPost>, CoreError> {
        let served = {
            let mut calls = self.listing_calls.lock().unwrap();
            calls.push(ListingCall {
                subreddit: subreddit.to_string(),
                kind,
                limit,
                after: after.map(str::to_string),
            });
            calls.len() - 1
        };
        if self.fail_after_pages.is_some_and(|pages| served >= pages) {
            return Err(RedditApiError::ServerError { status_code: 503 }.into());
        }

        if self.endless {
            let start = after
                .and_then(|cursor| cursor.strip_prefix("t3_p"))
                .and_then(|n| n.parse::<usize>().ok())
                .map_or(0, |n| n + 1);
            return Ok((start..start + limit as usize)
                .map(|n| post(&format!("p{}", n), &format!("Post {}", n), ""))
                .collect());
        }

        let start = match after {
            Some(cursor) => self
                .posts
                .iter()
                .position(|p| p.fullname == cursor)
                .map_or(self.posts.len(), |i| i + 1),
            None => 0,
        };
        Ok(self
            .posts
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_comments(
        &self,
        post: &RawPost,
        expand_budget: usize,
    ) -> Result<Vec<RawCommentNode>, CoreError> {
        self.comment_calls
            .lock()
            .unwrap()
            .push((post.id.clone(), expand_budget));
        if self.failing_comments.contains(&post.id) {
            return Err(RedditApiError::RequestTimeout.into());
        }
        Ok(self.comments.get(&post.id).cloned().unwrap_or_default())
    }
}

pub fn post(id: &str, title: &str, selftext: &str) -> RawPost {
    RawPost {
        id: id.to_string(),
        fullname: format!("t3_{}", id),
        title: title.to_string(),
        author: Some("poster".to_string()),
        selftext: selftext.to_string(),
        score: 10,
        url: format!("https://www.reddit.com/r/rust/comments/{}/", id),
        created_utc: 1700000000.0,
        num_comments: 0,
        stickied: false,
    }
}

pub fn pinned(id: &str, title: &str) -> RawPost {
    RawPost {
        stickied: true,
        ..post(id, title, "")
    }
}

pub fn comment(id: &str, body: &str, replies: Vec<RawCommentNode>) -> RawCommentNode {
    RawCommentNode::Comment(RawComment {
        id: id.to_string(),
        author: Some("commenter".to_string()),
        body: body.to_string(),
        score: 1,
        created_utc: 1700000100.0,
        replies,
    })
}

pub fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}
