//! Builds the threaded view of a discussion: a flat, unordered batch of
//! comment rows goes in, an ordered forest of reply trees comes out.
//!
//! The builder is a pure function and deliberately refuses to fail on data it
//! can route around: a dangling `parent_id` demotes nobody and breaks no
//! render, it just promotes that comment to a root.

use crate::models::Comment;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Deepest nesting level at which the reply affordance is still offered.
/// Presentation-only: stored data may nest deeper and still renders.
pub const REPLY_DEPTH_LIMIT: usize = 3;

/// Display order for roots and for every `replies` list. Ties are always
/// broken by ascending id so the output is deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentOrder {
    #[default]
    #[serde(rename = "oldest")]
    OldestFirst,
    #[serde(rename = "newest")]
    NewestFirst,
}

impl CommentOrder {
    fn compare(self, a: &Comment, b: &Comment) -> Ordering {
        let by_time = match self {
            CommentOrder::OldestFirst => a.created_at.cmp(&b.created_at),
            CommentOrder::NewestFirst => b.created_at.cmp(&a.created_at),
        };
        by_time.then_with(|| a.id.cmp(&b.id))
    }
}

/// A comment placed in its tree: the wrapped row, its nesting depth (0 for
/// roots) and its ordered replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    pub comment: Comment,
    pub depth: usize,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Whether the renderer should offer a "reply" action on this node.
    pub fn accepts_replies(&self) -> bool {
        self.depth < REPLY_DEPTH_LIMIT
    }
}

/// Builds the forest in chronological (oldest-first) order.
pub fn build_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    build_tree_ordered(comments, CommentOrder::default())
}

/// Builds the forest with a caller-chosen order, applied uniformly to the
/// root list and to every `replies` list.
///
/// Guarantees, regardless of input order:
/// - every input comment appears in the output exactly once;
/// - a comment sits under a parent only if its `parent_id` names that parent;
/// - a comment whose parent cannot be found becomes a root;
/// - for duplicate ids the last record in the input wins.
pub fn build_tree_ordered(comments: Vec<Comment>, order: CommentOrder) -> Vec<CommentNode> {
    // Pass 1: index every record so replies may precede their parent in the
    // input. Last record wins for a duplicated id.
    let mut records: HashMap<String, Comment> = HashMap::with_capacity(comments.len());
    for c in comments {
        records.insert(c.id.clone(), c);
    }
    let ids: HashSet<String> = records.keys().cloned().collect();

    // Pass 2: group replies under their parent id. A missing parent or a
    // comment claiming itself as parent makes a root.
    let mut pending: HashMap<String, Vec<Comment>> = HashMap::new();
    let mut roots: Vec<Comment> = Vec::new();
    for (_, c) in records {
        match c.parent_id.as_deref() {
            Some(p) if p != c.id && ids.contains(p) => {
                pending.entry(p.to_owned()).or_default().push(c);
            }
            _ => roots.push(c),
        }
    }

    let mut forest: Vec<CommentNode> = roots
        .into_iter()
        .map(|c| attach(c, 0, &mut pending, order))
        .collect();

    // A parent cycle cannot appear through the normal append-only flow, but
    // corrupted data must not lose comments either: promote the stranded
    // group with the smallest parent id and let the rest reattach under it.
    while let Some(key) = pending.keys().min().cloned() {
        let stranded = pending.remove(&key).unwrap_or_default();
        forest.extend(stranded.into_iter().map(|c| attach(c, 0, &mut pending, order)));
    }

    forest.sort_by(|a, b| order.compare(&a.comment, &b.comment));
    forest
}

fn attach(
    comment: Comment,
    depth: usize,
    pending: &mut HashMap<String, Vec<Comment>>,
    order: CommentOrder,
) -> CommentNode {
    let mut replies: Vec<CommentNode> = pending
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|c| attach(c, depth + 1, pending, order))
        .collect();
    replies.sort_by(|a, b| order.compare(&a.comment, &b.comment));
    CommentNode {
        comment,
        depth,
        replies,
    }
}

/// Pre-order flattening for renderers that want a flat list with depth
/// annotations instead of recursive nesting. Every emitted node carries its
/// depth from the tree and an emptied `replies` list; the traversal order
/// matches a depth-first walk of the forest.
pub fn flatten_for_display(forest: Vec<CommentNode>) -> Vec<CommentNode> {
    let mut out = Vec::new();
    for node in forest {
        flatten_into(node, &mut out);
    }
    out
}

fn flatten_into(mut node: CommentNode, out: &mut Vec<CommentNode>) {
    let replies = std::mem::take(&mut node.replies);
    out.push(node);
    for reply in replies {
        flatten_into(reply, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiscussionId;
    use chrono::DateTime;

    fn comment(id: &str, parent: Option<&str>, at: i64) -> Comment {
        Comment {
            id: id.to_owned(),
            discussion_id: DiscussionId::new_unchecked("review-42".to_owned()),
            author_id: format!("user-{id}"),
            author_display_name: "Ana".to_owned(),
            body: format!("body of {id}"),
            created_at: DateTime::from_timestamp(at, 0).unwrap().naive_utc(),
            parent_id: parent.map(str::to_owned),
        }
    }

    fn count(forest: &[CommentNode]) -> usize {
        forest.iter().map(|n| 1 + count(&n.replies)).sum()
    }

    fn ids(forest: &[CommentNode]) -> Vec<&str> {
        forest.iter().map(|n| n.comment.id.as_str()).collect()
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        assert_eq!(build_tree(vec![]), vec![]);
    }

    #[test]
    fn single_root_comment() {
        let forest = build_tree(vec![comment("a", None, 1)]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].comment.id, "a");
        assert_eq!(forest[0].depth, 0);
        assert!(forest[0].replies.is_empty());
    }

    #[test]
    fn reply_nests_under_its_parent() {
        let forest = build_tree(vec![comment("a", None, 1), comment("b", Some("a"), 2)]);
        assert_eq!(forest.len(), 1);
        assert_eq!(ids(&forest[0].replies), ["b"]);
        assert_eq!(forest[0].replies[0].depth, 1);
    }

    #[test]
    fn reply_listed_before_parent_still_nests() {
        let shuffled = build_tree(vec![comment("b", Some("a"), 2), comment("a", None, 1)]);
        let ordered = build_tree(vec![comment("a", None, 1), comment("b", Some("a"), 2)]);
        assert_eq!(shuffled, ordered);
    }

    #[test]
    fn orphan_is_promoted_to_root() {
        let forest = build_tree(vec![comment("b", Some("ghost"), 2)]);
        assert_eq!(ids(&forest), ["b"]);
        assert_eq!(forest[0].depth, 0);
        assert!(forest[0].replies.is_empty());
    }

    #[test]
    fn self_parent_is_promoted_to_root() {
        let forest = build_tree(vec![comment("a", Some("a"), 1)]);
        assert_eq!(ids(&forest), ["a"]);
        assert!(forest[0].replies.is_empty());
    }

    #[test]
    fn roots_sort_chronologically() {
        let forest = build_tree(vec![comment("b", None, 5), comment("a", None, 1)]);
        assert_eq!(ids(&forest), ["a", "b"]);
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let forest = build_tree(vec![
            comment("root", None, 1),
            comment("z", Some("root"), 7),
            comment("m", Some("root"), 7),
            comment("c", Some("root"), 7),
        ]);
        assert_eq!(ids(&forest[0].replies), ["c", "m", "z"]);
    }

    #[test]
    fn duplicate_id_keeps_last_record() {
        let mut first = comment("a", None, 1);
        first.body = "original".to_owned();
        let mut second = comment("a", None, 1);
        second.body = "rewritten".to_owned();

        let forest = build_tree(vec![first, second]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].comment.body, "rewritten");
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let base = vec![
            comment("a", None, 1),
            comment("b", Some("a"), 2),
            comment("c", Some("a"), 3),
            comment("d", Some("b"), 4),
            comment("e", None, 5),
            comment("f", Some("ghost"), 6),
        ];
        let expected = build_tree(base.clone());
        // rotations plus a reversal cover replies-before-parents from both ends
        for rotation in 0..base.len() {
            let mut permuted = base.clone();
            permuted.rotate_left(rotation);
            assert_eq!(build_tree(permuted), expected);
        }
        let mut reversed = base;
        reversed.reverse();
        assert_eq!(build_tree(reversed), expected);
    }

    #[test]
    fn every_comment_survives_into_the_forest() {
        let input = vec![
            comment("a", None, 1),
            comment("b", Some("a"), 2),
            comment("c", Some("b"), 3),
            comment("d", Some("ghost"), 4),
            comment("e", Some("e"), 5),
        ];
        let n = input.len();
        let forest = build_tree(input);
        assert_eq!(count(&forest), n);
    }

    #[test]
    fn parent_cycle_loses_no_comment() {
        // a and b claim each other; c hangs off a. Unreachable from any root,
        // so the builder must break the cycle instead of dropping all three.
        let a = comment("a", Some("b"), 1);
        let b = comment("b", Some("a"), 2);
        let c = comment("c", Some("a"), 3);

        let first = build_tree(vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(count(&first), 3);

        // and deterministically, whatever the input order
        let second = build_tree(vec![c, b, a]);
        assert_eq!(first, second);
    }

    #[test]
    fn newest_first_applies_to_roots_and_replies() {
        let forest = build_tree_ordered(
            vec![
                comment("a", None, 1),
                comment("b", None, 5),
                comment("a1", Some("a"), 2),
                comment("a2", Some("a"), 4),
            ],
            CommentOrder::NewestFirst,
        );
        assert_eq!(ids(&forest), ["b", "a"]);
        assert_eq!(ids(&forest[1].replies), ["a2", "a1"]);
    }

    #[test]
    fn depth_follows_the_chain() {
        let forest = build_tree(vec![
            comment("a", None, 1),
            comment("b", Some("a"), 2),
            comment("c", Some("b"), 3),
            comment("d", Some("c"), 4),
            comment("e", Some("d"), 5),
        ]);
        let flat = flatten_for_display(forest);
        let depths: Vec<usize> = flat.iter().map(|n| n.depth).collect();
        assert_eq!(depths, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn reply_affordance_stops_at_the_depth_limit() {
        let node = |depth| CommentNode {
            comment: comment("x", None, 1),
            depth,
            replies: vec![],
        };
        assert!(node(0).accepts_replies());
        assert!(node(2).accepts_replies());
        assert!(!node(REPLY_DEPTH_LIMIT).accepts_replies());
        assert!(!node(REPLY_DEPTH_LIMIT + 1).accepts_replies());
    }

    #[test]
    fn flatten_is_preorder_and_empties_replies() {
        let forest = build_tree(vec![
            comment("a", None, 1),
            comment("b", Some("a"), 2),
            comment("d", Some("b"), 3),
            comment("c", None, 4),
        ]);
        let flat = flatten_for_display(forest);
        assert_eq!(ids(&flat), ["a", "b", "d", "c"]);
        assert_eq!(
            flat.iter().map(|n| n.depth).collect::<Vec<_>>(),
            [0, 1, 2, 0]
        );
        assert!(flat.iter().all(|n| n.replies.is_empty()));
    }

    #[test]
    fn rebuilding_the_same_input_is_stable() {
        let input = vec![
            comment("a", None, 1),
            comment("b", Some("a"), 2),
            comment("c", None, 3),
        ];
        assert_eq!(build_tree(input.clone()), build_tree(input));
    }
}
