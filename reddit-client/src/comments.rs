//! Comment-thread wire types and continuation ("more") splicing.

use rfetcher_core::{ContinuationMarker, RawComment, RawCommentNode};
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// Maximum number of child ids accepted by `/api/morechildren` per call.
pub const MORE_CHILDREN_BATCH: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentThing {
    #[serde(rename = "t1")]
    Comment(RedditCommentData),
    #[serde(rename = "more")]
    More(RedditMoreData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub replies: Replies,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditMoreData {
    pub id: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Reddit sends an empty string instead of a listing for comments without replies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Replies {
    Listing(CommentListing),
    Empty(String),
}

impl Default for Replies {
    fn default() -> Self {
        Replies::Empty(String::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentListing {
    pub data: CommentListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentListingData {
    pub children: Vec<CommentThing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoreChildrenResponse {
    pub json: MoreChildrenJson,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoreChildrenJson {
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    pub data: Option<MoreChildrenData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoreChildrenData {
    pub things: Vec<CommentThing>,
}

impl CommentThing {
    fn parent_id(&self) -> &str {
        match self {
            CommentThing::Comment(c) => &c.parent_id,
            CommentThing::More(m) => &m.parent_id,
        }
    }

    fn fullname(&self) -> Option<String> {
        match self {
            CommentThing::Comment(c) if !c.name.is_empty() => Some(c.name.clone()),
            CommentThing::Comment(c) => Some(format!("t1_{}", c.id)),
            CommentThing::More(_) => None,
        }
    }
}

impl From<CommentThing> for RawCommentNode {
    fn from(thing: CommentThing) -> Self {
        match thing {
            CommentThing::Comment(data) => {
                let replies = match data.replies {
                    Replies::Listing(listing) => listing
                        .data
                        .children
                        .into_iter()
                        .map(RawCommentNode::from)
                        .collect(),
                    Replies::Empty(_) => Vec::new(),
                };
                RawCommentNode::Comment(RawComment {
                    id: data.id,
                    author: data.author,
                    body: data.body,
                    score: data.score,
                    created_utc: data.created_utc,
                    replies,
                })
            }
            CommentThing::More(data) => RawCommentNode::Continuation(ContinuationMarker {
                id: data.id,
                parent_id: data.parent_id,
                count: data.count,
                children: data.children,
            }),
        }
    }
}

pub fn listing_to_nodes(listing: CommentListing) -> Vec<RawCommentNode> {
    listing
        .data
        .children
        .into_iter()
        .map(RawCommentNode::from)
        .collect()
}

/// First expandable marker in breadth-first order that is not in `attempted`.
///
/// Markers without child ids ("continue this thread" links) cannot be
/// expanded through `/api/morechildren` and are never returned.
pub fn next_marker(
    nodes: &[RawCommentNode],
    attempted: &HashSet<String>,
) -> Option<ContinuationMarker> {
    let mut queue: VecDeque<&RawCommentNode> = nodes.iter().collect();
    while let Some(node) = queue.pop_front() {
        match node {
            RawCommentNode::Continuation(marker) => {
                if !marker.children.is_empty() && !attempted.contains(&marker.id) {
                    return Some(marker.clone());
                }
            }
            RawCommentNode::Comment(comment) => queue.extend(comment.replies.iter()),
        }
    }
    None
}

/// Replaces the marker with id `marker_id` by `replacement`, spliced in at
/// the marker's position. Returns false when no such marker exists.
pub fn replace_marker(
    nodes: &mut Vec<RawCommentNode>,
    marker_id: &str,
    replacement: Vec<RawCommentNode>,
) -> bool {
    let position = nodes.iter().position(
        |node| matches!(node, RawCommentNode::Continuation(marker) if marker.id == marker_id),
    );
    if let Some(index) = position {
        nodes.splice(index..=index, replacement);
        return true;
    }

    for node in nodes.iter_mut() {
        if let RawCommentNode::Comment(comment) = node {
            if contains_marker(&comment.replies, marker_id) {
                return replace_marker(&mut comment.replies, marker_id, replacement);
            }
        }
    }
    false
}

fn contains_marker(nodes: &[RawCommentNode], marker_id: &str) -> bool {
    let mut stack: Vec<&RawCommentNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        match node {
            RawCommentNode::Continuation(marker) if marker.id == marker_id => return true,
            RawCommentNode::Continuation(_) => {}
            RawCommentNode::Comment(comment) => stack.extend(comment.replies.iter()),
        }
    }
    false
}

/// Rebuilds the flat, depth-first `things` list returned by
/// `/api/morechildren` into trees. Things whose parent is not part of the
/// batch become roots, in their original order.
pub fn assemble_things(things: Vec<CommentThing>) -> Vec<RawCommentNode> {
    let index_by_name: HashMap<String, usize> = things
        .iter()
        .enumerate()
        .filter_map(|(index, thing)| thing.fullname().map(|name| (name, index)))
        .collect();
    let parents: Vec<Option<usize>> = things
        .iter()
        .enumerate()
        .map(|(index, thing)| {
            index_by_name
                .get(thing.parent_id())
                .copied()
                .filter(|parent| *parent < index)
        })
        .collect();

    let mut slots: Vec<Option<RawCommentNode>> = things
        .into_iter()
        .map(|thing| Some(RawCommentNode::from(thing)))
        .collect();

    // Children always follow their parent, so walking backwards attaches
    // complete subtrees and inserting at the front keeps sibling order.
    for index in (0..slots.len()).rev() {
        let Some(parent) = parents[index] else {
            continue;
        };
        if !matches!(slots[parent], Some(RawCommentNode::Comment(_))) {
            continue;
        }
        if let Some(child) = slots[index].take() {
            if let Some(RawCommentNode::Comment(comment)) = &mut slots[parent] {
                comment.replies.insert(0, child);
            }
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, replies: Vec<RawCommentNode>) -> RawCommentNode {
        RawCommentNode::Comment(RawComment {
            id: id.to_string(),
            author: Some("someone".to_string()),
            body: format!("body {}", id),
            score: 1,
            created_utc: 0.0,
            replies,
        })
    }

    fn marker(id: &str, parent: &str, children: &[&str]) -> RawCommentNode {
        RawCommentNode::Continuation(ContinuationMarker {
            id: id.to_string(),
            parent_id: parent.to_string(),
            count: children.len() as u64,
            children: children.iter().map(|c| c.to_string()).collect(),
        })
    }

    fn ids(nodes: &[RawCommentNode]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| match node {
                RawCommentNode::Comment(c) => c.id.clone(),
                RawCommentNode::Continuation(m) => format!("more:{}", m.id),
            })
            .collect()
    }

    #[test]
    fn test_parse_thread_with_empty_and_nested_replies() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    {"kind": "t1", "data": {
                        "id": "a", "name": "t1_a", "parent_id": "t3_p",
                        "author": "alice", "body": "top", "score": 5,
                        "created_utc": 1700000000.0,
                        "replies": {"kind": "Listing", "data": {"children": [
                            {"kind": "t1", "data": {
                                "id": "b", "name": "t1_b", "parent_id": "t1_a",
                                "author": "bob", "body": "reply", "score": 2,
                                "created_utc": 1700000100.0, "replies": ""
                            }}
                        ]}}
                    }},
                    {"kind": "more", "data": {
                        "id": "m1", "parent_id": "t3_p", "count": 2,
                        "children": ["c", "d"]
                    }}
                ]
            }
        }"#;

        let listing: CommentListing = serde_json::from_str(json).unwrap();
        let nodes = listing_to_nodes(listing);
        assert_eq!(ids(&nodes), vec!["a", "more:m1"]);

        match &nodes[0] {
            RawCommentNode::Comment(a) => {
                assert_eq!(a.author.as_deref(), Some("alice"));
                assert_eq!(ids(&a.replies), vec!["b"]);
            }
            other => panic!("Expected comment, got {:?}", other),
        }
    }

    #[test]
    fn test_next_marker_breadth_first_and_skips_attempted() {
        let nodes = vec![
            comment("a", vec![marker("deep", "t1_a", &["x"])]),
            marker("top", "t3_p", &["y"]),
        ];

        let mut attempted = HashSet::new();
        let first = next_marker(&nodes, &attempted).unwrap();
        assert_eq!(first.id, "top");

        attempted.insert("top".to_string());
        let second = next_marker(&nodes, &attempted).unwrap();
        assert_eq!(second.id, "deep");

        attempted.insert("deep".to_string());
        assert!(next_marker(&nodes, &attempted).is_none());
    }

    #[test]
    fn test_next_marker_ignores_continue_thread_links() {
        let nodes = vec![comment("a", vec![marker("_", "t1_a", &[])])];
        assert!(next_marker(&nodes, &HashSet::new()).is_none());
    }

    #[test]
    fn test_replace_marker_splices_in_place() {
        let mut nodes = vec![
            comment("a", vec![comment("b", vec![]), marker("m", "t1_a", &["c"])]),
            comment("z", vec![]),
        ];

        let replaced = replace_marker(
            &mut nodes,
            "m",
            vec![comment("c", vec![]), comment("d", vec![])],
        );
        assert!(replaced);
        assert_eq!(ids(&nodes), vec!["a", "z"]);
        match &nodes[0] {
            RawCommentNode::Comment(a) => assert_eq!(ids(&a.replies), vec!["b", "c", "d"]),
            other => panic!("Expected comment, got {:?}", other),
        }
    }

    #[test]
    fn test_replace_marker_top_level_with_nothing() {
        let mut nodes = vec![comment("a", vec![]), marker("m", "t3_p", &["c"])];
        assert!(replace_marker(&mut nodes, "m", Vec::new()));
        assert_eq!(ids(&nodes), vec!["a"]);
        assert!(!replace_marker(&mut nodes, "m", Vec::new()));
    }

    #[test]
    fn test_assemble_things_rebuilds_tree() {
        let json = r#"[
            {"kind": "t1", "data": {"id": "c", "name": "t1_c", "parent_id": "t3_p", "body": "c", "replies": ""}},
            {"kind": "t1", "data": {"id": "e", "name": "t1_e", "parent_id": "t1_c", "body": "e", "replies": ""}},
            {"kind": "t1", "data": {"id": "f", "name": "t1_f", "parent_id": "t1_e", "body": "f", "replies": ""}},
            {"kind": "t1", "data": {"id": "g", "name": "t1_g", "parent_id": "t1_c", "body": "g", "replies": ""}},
            {"kind": "t1", "data": {"id": "d", "name": "t1_d", "parent_id": "t3_p", "body": "d", "replies": ""}},
            {"kind": "more", "data": {"id": "m2", "parent_id": "t1_d", "count": 4, "children": ["h"]}}
        ]"#;

        let things: Vec<CommentThing> = serde_json::from_str(json).unwrap();
        let roots = assemble_things(things);
        assert_eq!(ids(&roots), vec!["c", "d"]);

        let RawCommentNode::Comment(c) = &roots[0] else {
            panic!("Expected comment");
        };
        assert_eq!(ids(&c.replies), vec!["e", "g"]);
        let RawCommentNode::Comment(e) = &c.replies[0] else {
            panic!("Expected comment");
        };
        assert_eq!(ids(&e.replies), vec!["f"]);

        let RawCommentNode::Comment(d) = &roots[1] else {
            panic!("Expected comment");
        };
        assert_eq!(ids(&d.replies), vec!["more:m2"]);
    }
}
