use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::{comment, like, post, post::PostKind, saved_post, user};
use crate::error::{ApiError, Result};
use crate::models::{CommentResponse, CreateCommentRequest, CreatePostRequest, FeedItem, PostWithAuthor};
use crate::storage;
use actix_multipart::{Field, Multipart};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::StreamExt;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/posts",
    responses(
        (status = 200, description = "All posts, newest first, annotated for the viewer", body = Vec<FeedItem>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_posts(user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse> {
    let db = pool.get_ref();

    let posts = post::Entity::find()
        .find_also_related(user::Entity)
        .order_by_desc(post::Column::CreatedAt)
        .all(db)
        .await?;

    let mut items = Vec::with_capacity(posts.len());
    for (post, author) in posts {
        let likes_count = like::Entity::find()
            .filter(like::Column::PostId.eq(post.id))
            .count(db)
            .await? as i64;

        let comments_count = comment::Entity::find()
            .filter(comment::Column::PostId.eq(post.id))
            .count(db)
            .await? as i64;

        let is_liked = like::Entity::find()
            .filter(
                Condition::all()
                    .add(like::Column::PostId.eq(post.id))
                    .add(like::Column::UserId.eq(user.user_id)),
            )
            .one(db)
            .await?
            .is_some();

        let is_saved = saved_post::Entity::find()
            .filter(
                Condition::all()
                    .add(saved_post::Column::PostId.eq(post.id))
                    .add(saved_post::Column::UserId.eq(user.user_id)),
            )
            .one(db)
            .await?
            .is_some();

        let (username, avatar_url) = author
            .map(|u| (u.username, u.avatar_url))
            .unwrap_or_default();

        items.push(FeedItem {
            id: post.id,
            user_id: post.user_id,
            kind: post.kind,
            url: post.url,
            caption: post.caption,
            created_at: post.created_at,
            username,
            avatar_url,
            likes_count,
            comments_count,
            is_liked,
            is_saved,
        });
    }

    Ok(HttpResponse::Ok().json(items))
}

async fn read_text_field(field: &mut Field) -> Result<String> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| ApiError::InvalidArgument(format!("Multipart error: {}", e)))?;
        data.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Reads a multipart upload: an optional `file` part plus `type`,
/// `caption` and `url` text fields. A stored file wins over a `url`
/// field.
async fn parse_multipart_post(
    mut multipart: Multipart,
    config: &Config,
) -> Result<(PostKind, Option<String>, Option<String>)> {
    let mut kind: Option<String> = None;
    let mut caption: Option<String> = None;
    let mut url: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next().await {
        let mut field =
            field.map_err(|e| ApiError::InvalidArgument(format!("Multipart error: {}", e)))?;
        let field_name = field.name().to_string();

        match field_name.as_str() {
            "file" => {
                let original_name = field
                    .content_disposition()
                    .get_filename()
                    .unwrap_or("upload")
                    .to_string();
                let mut data = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk
                        .map_err(|e| ApiError::InvalidArgument(format!("Upload error: {}", e)))?;
                    data.extend_from_slice(&chunk);
                }
                file = Some((original_name, data));
            }
            "type" => kind = Some(read_text_field(&mut field).await?),
            "caption" => caption = Some(read_text_field(&mut field).await?),
            "url" => url = Some(read_text_field(&mut field).await?),
            _ => {}
        }
    }

    let kind = match kind.as_deref() {
        Some("image") => PostKind::Image,
        Some("video") => PostKind::Video,
        _ => {
            return Err(ApiError::InvalidArgument(
                "type must be image or video".to_string(),
            ))
        }
    };

    if let Some((original_name, data)) = file {
        url = Some(storage::store_upload(config, &original_name, &data).await?);
    }

    Ok((kind, url, caption))
}

async fn parse_json_post(
    mut payload: web::Payload,
) -> Result<(PostKind, Option<String>, Option<String>)> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| ApiError::InvalidArgument(format!("Payload error: {}", e)))?;
        body.extend_from_slice(&chunk);
    }
    let req: CreatePostRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidArgument(format!("Invalid request body: {}", e)))?;
    Ok((req.kind, req.url, req.caption))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Post created"),
        (status = 400, description = "Missing content reference"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_post(
    req: HttpRequest,
    payload: web::Payload,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    // The upload flow sends multipart form data; url-only posts arrive
    // as a plain JSON body.
    let (kind, url, caption) = if content_type.starts_with("multipart/form-data") {
        parse_multipart_post(Multipart::new(req.headers(), payload), &config).await?
    } else {
        parse_json_post(payload).await?
    };

    let url = url.ok_or_else(|| {
        ApiError::InvalidArgument("Either a file or a url is required".to_string())
    })?;

    let new_post = post::ActiveModel {
        user_id: Set(user.user_id),
        kind: Set(kind),
        url: Set(url),
        caption: Set(caption),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let post = post::Entity::insert(new_post)
        .exec_with_returning(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "id": post.id })))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{post_id}",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post and its dependents deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn delete_post(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();

    let post = post::Entity::find_by_id(post_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.user_id != user.user_id {
        return Err(ApiError::Forbidden(
            "Only the owner can delete a post".to_string(),
        ));
    }

    // Dependent rows go first so no reader ever sees an orphaned edge.
    let txn = pool.get_ref().begin().await?;
    like::Entity::delete_many()
        .filter(like::Column::PostId.eq(post_id))
        .exec(&txn)
        .await?;
    comment::Entity::delete_many()
        .filter(comment::Column::PostId.eq(post_id))
        .exec(&txn)
        .await?;
    saved_post::Entity::delete_many()
        .filter(saved_post::Column::PostId.eq(post_id))
        .exec(&txn)
        .await?;
    post::Entity::delete_by_id(post_id).exec(&txn).await?;
    txn.commit().await?;

    // The rows are gone either way; losing the file is acceptable.
    storage::remove_upload(&config, &post.url).await;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[utoipa::path(
    post,
    path = "/api/posts/{post_id}/like",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Like toggled"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn like_post(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();

    let txn = pool.get_ref().begin().await?;
    let existing = like::Entity::find()
        .filter(
            Condition::all()
                .add(like::Column::PostId.eq(post_id))
                .add(like::Column::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?;

    let liked = match existing {
        Some(edge) => {
            like::Entity::delete_by_id(edge.id).exec(&txn).await?;
            false
        }
        None => {
            let new_like = like::ActiveModel {
                user_id: Set(user.user_id),
                post_id: Set(post_id),
                created_at: Set(Utc::now()),
                ..Default::default()
            };
            like::Entity::insert(new_like).exec(&txn).await?;
            true
        }
    };
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "liked": liked })))
}

#[utoipa::path(
    post,
    path = "/api/posts/{post_id}/save",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Save toggled"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn save_post(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();

    let txn = pool.get_ref().begin().await?;
    let existing = saved_post::Entity::find()
        .filter(
            Condition::all()
                .add(saved_post::Column::PostId.eq(post_id))
                .add(saved_post::Column::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?;

    let saved = match existing {
        Some(edge) => {
            saved_post::Entity::delete_by_id(edge.id).exec(&txn).await?;
            false
        }
        None => {
            let new_save = saved_post::ActiveModel {
                user_id: Set(user.user_id),
                post_id: Set(post_id),
                created_at: Set(Utc::now()),
                ..Default::default()
            };
            saved_post::Entity::insert(new_save).exec(&txn).await?;
            true
        }
    };
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "saved": saved })))
}

#[utoipa::path(
    get,
    path = "/api/posts/{post_id}/comments",
    params(("post_id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comments, oldest first", body = Vec<CommentResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_comments(
    path: web::Path<i64>,
    _user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();

    let comments = comment::Entity::find()
        .filter(comment::Column::PostId.eq(post_id))
        .find_also_related(user::Entity)
        .order_by_asc(comment::Column::CreatedAt)
        .all(pool.get_ref())
        .await?;

    let comments: Vec<CommentResponse> = comments
        .into_iter()
        .map(|(comment, author)| CommentResponse::new(comment, author))
        .collect();

    Ok(HttpResponse::Ok().json(comments))
}

#[utoipa::path(
    post,
    path = "/api/posts/{post_id}/comments",
    params(("post_id" = i64, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created"),
        (status = 400, description = "Empty content"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn add_comment(
    path: web::Path<i64>,
    req: web::Json<CreateCommentRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();

    if req.content.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "Comment content is required".to_string(),
        ));
    }

    let new_comment = comment::ActiveModel {
        user_id: Set(user.user_id),
        post_id: Set(post_id),
        content: Set(req.content.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let comment = comment::Entity::insert(new_comment)
        .exec_with_returning(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "id": comment.id })))
}

#[utoipa::path(
    get,
    path = "/api/explore",
    responses(
        (status = 200, description = "Random sample of posts", body = Vec<PostWithAuthor>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn explore(_user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse> {
    let posts = post::Entity::find()
        .find_also_related(user::Entity)
        .order_by(Expr::cust("RANDOM()"), Order::Asc)
        .limit(30)
        .all(pool.get_ref())
        .await?;

    let posts: Vec<PostWithAuthor> = posts
        .into_iter()
        .map(|(post, author)| PostWithAuthor::new(post, author))
        .collect();

    Ok(HttpResponse::Ok().json(posts))
}
