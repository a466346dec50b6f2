use crate::auth::AuthenticatedUser;
use crate::db::DbPool;
use crate::entities::{follower, post, saved_post, user};
use crate::error::{ApiError, Result};
use crate::models::{
    MeResponse, PostResponse, PostWithAuthor, ProfileResponse, UpdateProfileRequest, UserSummary,
};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "The authenticated user's profile fields", body = MeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_me(user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse> {
    let me = user::Entity::find_by_id(user.user_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(MeResponse::from(me)))
}

#[utoipa::path(
    put,
    path = "/api/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_me(
    req: web::Json<UpdateProfileRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    let me = user::Entity::find_by_id(user.user_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut me: user::ActiveModel = me.into();
    me.full_name = Set(req.full_name.clone());
    me.bio = Set(req.bio.clone());
    me.avatar_url = Set(req.avatar_url.clone());
    me.update(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[utoipa::path(
    get,
    path = "/api/users/suggestions",
    responses(
        (status = 200, description = "Users the viewer does not follow yet", body = Vec<UserSummary>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn suggestions(user: AuthenticatedUser, pool: web::Data<DbPool>) -> Result<HttpResponse> {
    let followed: Vec<i64> = follower::Entity::find()
        .filter(follower::Column::FollowerId.eq(user.user_id))
        .all(pool.get_ref())
        .await?
        .into_iter()
        .map(|edge| edge.following_id)
        .collect();

    let users = user::Entity::find()
        .filter(user::Column::Id.ne(user.user_id))
        .filter(user::Column::Id.is_not_in(followed))
        .limit(5)
        .all(pool.get_ref())
        .await?;

    let users: Vec<UserSummary> = users.into_iter().map(UserSummary::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[utoipa::path(
    get,
    path = "/api/users/search",
    params(("q" = String, Query, description = "Substring to match against username or full name")),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserSummary>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn search_users(
    query: web::Query<SearchQuery>,
    _user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    // SQLite LIKE is case-insensitive for ASCII.
    let users = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.contains(&query.q))
                .add(user::Column::FullName.contains(&query.q)),
        )
        .limit(20)
        .all(pool.get_ref())
        .await?;

    let users: Vec<UserSummary> = users.into_iter().map(UserSummary::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "First 20 users", body = Vec<UserSummary>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    _user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    let users = user::Entity::find().limit(20).all(pool.get_ref()).await?;
    let users: Vec<UserSummary> = users.into_iter().map(UserSummary::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Profile with posts and counts", body = ProfileResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_profile(
    path: web::Path<String>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    let db = pool.get_ref();

    let target = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let posts = post::Entity::find()
        .filter(post::Column::UserId.eq(target.id))
        .order_by_desc(post::Column::CreatedAt)
        .all(db)
        .await?;

    let followers_count = follower::Entity::find()
        .filter(follower::Column::FollowingId.eq(target.id))
        .count(db)
        .await? as i64;

    let following_count = follower::Entity::find()
        .filter(follower::Column::FollowerId.eq(target.id))
        .count(db)
        .await? as i64;

    let is_following = follower::Entity::find()
        .filter(
            Condition::all()
                .add(follower::Column::FollowerId.eq(user.user_id))
                .add(follower::Column::FollowingId.eq(target.id)),
        )
        .one(db)
        .await?
        .is_some();

    Ok(HttpResponse::Ok().json(ProfileResponse {
        id: target.id,
        username: target.username,
        full_name: target.full_name,
        bio: target.bio,
        avatar_url: target.avatar_url,
        posts: posts.into_iter().map(PostResponse::from).collect(),
        followers_count,
        following_count,
        is_following,
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/{username}/saved",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "The user's saved posts", body = Vec<PostWithAuthor>),
        (status = 403, description = "Saved posts are private"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn saved_posts(
    path: web::Path<String>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    let db = pool.get_ref();

    let target = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.id != user.user_id {
        return Err(ApiError::Forbidden("Saved posts are private".to_string()));
    }

    let post_ids: Vec<i64> = saved_post::Entity::find()
        .filter(saved_post::Column::UserId.eq(target.id))
        .all(db)
        .await?
        .into_iter()
        .map(|edge| edge.post_id)
        .collect();

    let posts = post::Entity::find()
        .filter(post::Column::Id.is_in(post_ids))
        .find_also_related(user::Entity)
        .order_by_desc(post::Column::CreatedAt)
        .all(db)
        .await?;

    let posts: Vec<PostWithAuthor> = posts
        .into_iter()
        .map(|(post, author)| PostWithAuthor::new(post, author))
        .collect();

    Ok(HttpResponse::Ok().json(posts))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/follow",
    params(("user_id" = i64, Path, description = "User to follow or unfollow")),
    responses(
        (status = 200, description = "Follow toggled"),
        (status = 400, description = "Cannot follow yourself"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn follow_user(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse> {
    let target_id = path.into_inner();

    if target_id == user.user_id {
        return Err(ApiError::InvalidArgument(
            "Cannot follow yourself".to_string(),
        ));
    }

    let txn = pool.get_ref().begin().await?;
    let existing = follower::Entity::find()
        .filter(
            Condition::all()
                .add(follower::Column::FollowerId.eq(user.user_id))
                .add(follower::Column::FollowingId.eq(target_id)),
        )
        .one(&txn)
        .await?;

    let following = match existing {
        Some(edge) => {
            follower::Entity::delete_by_id(edge.id).exec(&txn).await?;
            false
        }
        None => {
            let new_edge = follower::ActiveModel {
                follower_id: Set(user.user_id),
                following_id: Set(target_id),
                created_at: Set(Utc::now()),
                ..Default::default()
            };
            follower::Entity::insert(new_edge).exec(&txn).await?;
            true
        }
    };
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "following": following })))
}
