pub mod auth;
pub mod posts;
pub mod users;

use crate::entities::post::PostKind;
use crate::models::{
    AuthResponse, CommentResponse, CreateCommentRequest, CreatePostRequest, FeedItem, LoginRequest,
    MeResponse, PostResponse, PostWithAuthor, ProfileResponse, SignupRequest,
    UpdateProfileRequest, UserSummary,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth endpoints
        auth::signup,
        auth::login,
        // Post endpoints
        posts::get_posts,
        posts::create_post,
        posts::delete_post,
        posts::like_post,
        posts::save_post,
        posts::get_comments,
        posts::add_comment,
        posts::explore,
        // User endpoints
        users::get_me,
        users::update_me,
        users::suggestions,
        users::search_users,
        users::list_users,
        users::get_profile,
        users::saved_posts,
        users::follow_user,
    ),
    components(schemas(
        // Auth schemas
        SignupRequest,
        LoginRequest,
        AuthResponse,
        // User schemas
        UserSummary,
        MeResponse,
        UpdateProfileRequest,
        ProfileResponse,
        users::SearchQuery,
        // Post schemas
        PostKind,
        CreatePostRequest,
        PostResponse,
        PostWithAuthor,
        FeedItem,
        CreateCommentRequest,
        CommentResponse,
    )),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "posts", description = "Feed, post and comment endpoints"),
        (name = "users", description = "Profile and social graph endpoints"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

use utoipa::Modify;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
