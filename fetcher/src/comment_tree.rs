//! Filtered comment trees.
//!
//! A rejected comment takes its whole subtree with it: replies of a rejected
//! node are never inspected. Trees are built with an explicit stack, so
//! thread depth is limited by heap, not by the native call stack.

use rfetcher_core::{
    is_source_self_referential, matches, Comment, RawComment, RawCommentNode, DELETED_AUTHOR,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForestStats {
    /// Admitted comments at every depth.
    pub admitted: usize,
    /// Rejected top-level comments.
    pub rejected: usize,
    /// Top-level continuation markers left unexpanded.
    pub continuations: usize,
}

struct Frame<'a> {
    raw: &'a RawComment,
    comment: Comment,
    next_reply: usize,
}

impl<'a> Frame<'a> {
    fn new(raw: &'a RawComment) -> Self {
        Self {
            raw,
            comment: Comment {
                id: raw.id.clone(),
                author: raw
                    .author
                    .clone()
                    .unwrap_or_else(|| DELETED_AUTHOR.to_string()),
                body: raw.body.clone(),
                score: raw.score,
                created_utc: raw.created_utc,
                replies: Vec::new(),
            },
            next_reply: 0,
        }
    }
}

fn admit<'a>(node: &'a RawCommentNode, unwanted: &[String]) -> Option<&'a RawComment> {
    let RawCommentNode::Comment(raw) = node else {
        return None;
    };
    if is_source_self_referential(&raw.body) {
        return None;
    }
    if !unwanted.is_empty() && matches(&raw.body, unwanted) {
        return None;
    }
    Some(raw)
}

/// Builds the filtered tree rooted at `node`, or `None` if the node itself
/// is rejected (continuation marker, self-referential, or unwanted keyword).
pub fn build(node: &RawCommentNode, unwanted: &[String]) -> Option<Comment> {
    let root = admit(node, unwanted)?;
    let mut stack = vec![Frame::new(root)];

    while let Some(frame) = stack.last_mut() {
        let raw = frame.raw;
        if let Some(reply) = raw.replies.get(frame.next_reply) {
            frame.next_reply += 1;
            if let Some(admitted) = admit(reply, unwanted) {
                stack.push(Frame::new(admitted));
            }
            continue;
        }

        let Some(finished) = stack.pop() else {
            break;
        };
        match stack.last_mut() {
            Some(parent) => parent.comment.replies.push(finished.comment),
            None => return Some(finished.comment),
        }
    }

    None
}

/// Number of nodes below `comment`, not counting `comment` itself.
pub fn count_descendants(comment: &Comment) -> usize {
    let mut count = 0;
    let mut stack: Vec<&Comment> = comment.replies.iter().collect();
    while let Some(reply) = stack.pop() {
        count += 1;
        stack.extend(reply.replies.iter());
    }
    count
}

/// Builds every top-level node of a thread, keeping platform order.
pub fn build_forest(nodes: &[RawCommentNode], unwanted: &[String]) -> (Vec<Comment>, ForestStats) {
    let mut stats = ForestStats::default();
    let mut comments = Vec::with_capacity(nodes.len());

    for node in nodes {
        if matches!(node, RawCommentNode::Continuation(_)) {
            stats.continuations += 1;
            continue;
        }
        match build(node, unwanted) {
            Some(comment) => {
                stats.admitted += 1 + count_descendants(&comment);
                comments.push(comment);
            }
            None => stats.rejected += 1,
        }
    }

    (comments, stats)
}
