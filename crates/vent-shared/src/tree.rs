//! Flat-to-nested comment routines.
//!
//! Comments arrive as a flat, newest-first sequence with parent links. Both
//! the server (building responses) and clients (reading older flat payloads)
//! turn that sequence into a forest through a [`ChildIndex`]: one pass to
//! index children by parent id, one stack-driven pass to emit nodes.
//!
//! Nesting stops at [`MAX_REPLY_DEPTH`]. Replies below that level are listed,
//! in reading order, under the deepest ancestor still nested, so every row
//! is emitted and the response stays shallow enough to serialize.
//!
//! A reply whose parent is not part of the sequence (deleted concurrently,
//! for example) is promoted to a root rather than dropped. Rows reachable
//! only through a parent cycle have no root above them and are not emitted.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{Comment, CommentNode, CommentStats, ANONYMOUS_AUTHOR};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Deepest level a reply is nested at. Roots are level 0.
pub const MAX_REPLY_DEPTH: usize = 32;

/// Offset/limit window over root comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// Limit defaults to 20 and is clamped to 1..=100; offset defaults to 0.
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        Self {
            limit: limit as usize,
            offset: offset.unwrap_or(0) as usize,
        }
    }

    /// Every root, no windowing.
    pub fn unbounded() -> Self {
        Self {
            limit: usize::MAX,
            offset: 0,
        }
    }

    fn window<'a>(&self, roots: &'a [usize]) -> &'a [usize] {
        let start = self.offset.min(roots.len());
        let end = start.saturating_add(self.limit).min(roots.len());
        &roots[start..end]
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Anything with an id and an optional parent id.
pub trait Threaded {
    fn thread_id(&self) -> Uuid;
    fn parent_id(&self) -> Option<Uuid>;
}

impl Threaded for Comment {
    fn thread_id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_comment_id
    }
}

impl Threaded for CommentNode {
    fn thread_id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_comment_id
    }
}

/// Parent id to child positions, plus the root positions, over one slice.
///
/// Positions refer to the slice the index was built from and keep its order,
/// so newest-first input yields newest-first siblings.
#[derive(Debug, Default)]
pub struct ChildIndex {
    roots: Vec<usize>,
    children: HashMap<Uuid, Vec<usize>>,
}

impl ChildIndex {
    pub fn build<T: Threaded>(items: &[T]) -> Self {
        let known: HashSet<Uuid> = items.iter().map(Threaded::thread_id).collect();
        let mut index = Self::default();

        for (position, item) in items.iter().enumerate() {
            match item.parent_id() {
                Some(parent) if known.contains(&parent) => {
                    index.children.entry(parent).or_default().push(position);
                }
                // No parent, or an orphan whose parent is gone.
                _ => index.roots.push(position),
            }
        }

        index
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn children_of(&self, id: Uuid) -> &[usize] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Builds the response forest for one page of root comments.
///
/// `author_names` and `stats` are resolved by the caller for the requester;
/// an author missing from `author_names` shows as "anonymous" and a comment
/// missing from `stats` has no likes.
pub fn assemble(
    comments: &[Comment],
    author_names: &HashMap<Uuid, String>,
    stats: &HashMap<Uuid, CommentStats>,
    page: Page,
) -> Vec<CommentNode> {
    let index = ChildIndex::build(comments);
    let layout = Layout::plan(comments, &index, page.window(index.roots()));

    let mut slots: Vec<Option<CommentNode>> = vec![None; comments.len()];
    for &position in &layout.order {
        let comment = &comments[position];
        let author_name = author_names
            .get(&comment.author_id)
            .cloned()
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());
        let comment_stats = stats.get(&comment.id).copied().unwrap_or_default();
        slots[position] = Some(CommentNode::from_comment(comment, author_name, comment_stats));
    }

    layout.link(slots)
}

/// Nests a flat list of nodes the way the server would have.
///
/// Payloads that are already nested (any node carries replies) come back
/// unchanged.
pub fn nest_flat_nodes(nodes: Vec<CommentNode>) -> Vec<CommentNode> {
    if nodes.iter().any(|node| !node.replies.is_empty()) {
        return nodes;
    }

    let index = ChildIndex::build(&nodes);
    let layout = Layout::plan(&nodes, &index, index.roots());
    layout.link(nodes.into_iter().map(Some).collect())
}

/// Emission order for one forest.
///
/// `order` lists the emitted positions depth-first, each parent before its
/// replies and siblings in index order. `anchors` maps an emitted position to
/// the position it hangs under, `None` for roots.
struct Layout {
    order: Vec<usize>,
    anchors: Vec<Option<usize>>,
}

impl Layout {
    fn plan<T: Threaded>(items: &[T], index: &ChildIndex, roots: &[usize]) -> Self {
        let mut emitted = vec![false; items.len()];
        let mut anchors = vec![None; items.len()];
        let mut order = Vec::new();

        // (position, depth, anchor). Pushed in reverse so pops keep index order.
        let mut stack: Vec<(usize, usize, Option<usize>)> =
            roots.iter().rev().map(|&root| (root, 0, None)).collect();

        while let Some((position, depth, anchor)) = stack.pop() {
            if std::mem::replace(&mut emitted[position], true) {
                continue;
            }
            order.push(position);
            anchors[position] = anchor;

            let (child_depth, child_anchor) = if depth < MAX_REPLY_DEPTH {
                (depth + 1, Some(position))
            } else {
                (depth, anchor)
            };
            stack.extend(
                index
                    .children_of(items[position].thread_id())
                    .iter()
                    .rev()
                    .map(|&child| (child, child_depth, child_anchor)),
            );
        }

        Self { order, anchors }
    }

    /// Moves every planned node under its anchor. Walking `order` backwards
    /// finishes each node's replies before the node itself is attached.
    fn link(self, mut slots: Vec<Option<CommentNode>>) -> Vec<CommentNode> {
        let mut forest = Vec::new();

        for &position in self.order.iter().rev() {
            let Some(mut node) = slots[position].take() else {
                continue;
            };
            node.replies.reverse();
            match self.anchors[position] {
                Some(anchor) => {
                    if let Some(parent) = slots[anchor].as_mut() {
                        parent.replies.push(node);
                    }
                }
                None => forest.push(node),
            }
        }

        forest.reverse();
        forest
    }
}

/// Total number of nodes in a forest, replies included.
pub fn count_nodes(forest: &[CommentNode]) -> usize {
    forest.iter().map(|node| 1 + node.descendant_count()).sum()
}
