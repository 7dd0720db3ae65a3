use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored comment. `parent_comment_id` is fixed at creation and, when set,
/// points at a comment of the same post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// At most one per (comment, author).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CommentLike {
    pub comment_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Per-comment interaction totals, resolved for one requester.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentStats {
    pub like_count: i64,
    pub has_liked: bool,
}

/// Read-only, nested response shape for a comment and its replies.
///
/// `replies` is always serialized, as an empty array for leaf comments.
/// Older clients sent flat lists of nodes without `replies`; the field
/// defaults to empty so those payloads still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub author_name: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<Uuid>,
    #[serde(default)]
    pub has_liked: bool,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn from_comment(comment: &Comment, author_name: String, stats: CommentStats) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content.clone(),
            author_name,
            author_id: comment.author_id,
            created_at: comment.created_at,
            parent_comment_id: comment.parent_comment_id,
            has_liked: stats.has_liked,
            like_count: stats.like_count,
            replies: Vec::new(),
        }
    }

    /// Number of nodes below this one, at any depth.
    pub fn descendant_count(&self) -> usize {
        let mut pending: Vec<&CommentNode> = self.replies.iter().collect();
        let mut count = 0;
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(&node.replies);
        }
        count
    }
}
