use crate::entities::{post, post::PostKind, user};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub url: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<post::Model> for PostResponse {
    fn from(post: post::Model) -> Self {
        PostResponse {
            id: post.id,
            user_id: post.user_id,
            kind: post.kind,
            url: post.url,
            caption: post.caption,
            created_at: post.created_at,
        }
    }
}

/// Post with the author's display fields joined in (explore and saved
/// listings).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostWithAuthor {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl PostWithAuthor {
    pub fn new(post: post::Model, author: Option<user::Model>) -> Self {
        let (username, avatar_url) = author
            .map(|u| (u.username, u.avatar_url))
            .unwrap_or_default();
        PostWithAuthor {
            id: post.id,
            user_id: post.user_id,
            kind: post.kind,
            url: post.url,
            caption: post.caption,
            created_at: post.created_at,
            username,
            avatar_url,
        }
    }
}

/// A feed entry: the post, its author, and the viewer-dependent
/// annotations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedItem {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub username: String,
    pub avatar_url: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked: bool,
    pub is_saved: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl CommentResponse {
    pub fn new(comment: crate::entities::comment::Model, author: Option<user::Model>) -> Self {
        let (username, avatar_url) = author
            .map(|u| (u.username, u.avatar_url))
            .unwrap_or_default();
        CommentResponse {
            id: comment.id,
            user_id: comment.user_id,
            post_id: comment.post_id,
            content: comment.content,
            created_at: comment.created_at,
            username,
            avatar_url,
        }
    }
}
