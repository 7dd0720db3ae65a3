use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tree::Page;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Query string of the comment listing. Paging applies to root comments only.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CommentListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl CommentListParams {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggleResponse {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentCountResponse {
    pub count: i64,
}
