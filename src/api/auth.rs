use crate::auth::{create_token, hash_password, verify_password, Claims};
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::user;
use crate::error::{ApiError, Result};
use crate::models::{AuthResponse, LoginRequest, SignupRequest, UserSummary};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Username already exists")
    ),
    tag = "auth"
)]
pub async fn signup(
    req: web::Json<SignupRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let existing_user = user::Entity::find()
        .filter(user::Column::Username.eq(&req.username))
        .one(pool.get_ref())
        .await?;

    if existing_user.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let password_hash = hash_password(&req.password)?;

    let new_user = user::ActiveModel {
        username: Set(req.username.clone()),
        password_hash: Set(password_hash),
        full_name: Set(req.full_name.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    // Two signups can pass the check above concurrently; the unique
    // index decides the loser.
    let user = match user::Entity::insert(new_user)
        .exec_with_returning(pool.get_ref())
        .await
    {
        Ok(user) => user,
        Err(e) if e.to_string().contains("UNIQUE") => {
            return Err(ApiError::Conflict("Username already exists".to_string()));
        }
        Err(e) => return Err(ApiError::Database(e)),
    };

    let claims = Claims::new(user.id, user.username.clone(), config.jwt.expiration_hours);
    let token = create_token(&claims, &config.jwt.secret)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserSummary::from(user),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    req: web::Json<LoginRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let user = user::Entity::find()
        .filter(user::Column::Username.eq(&req.username))
        .one(pool.get_ref())
        .await?;

    // An unknown username and a wrong password are indistinguishable to
    // the caller.
    let user = user.ok_or(ApiError::Unauthorized)?;

    let is_valid = verify_password(&req.password, &user.password_hash)?;
    if !is_valid {
        return Err(ApiError::Unauthorized);
    }

    let claims = Claims::new(user.id, user.username.clone(), config.jwt.expiration_hours);
    let token = create_token(&claims, &config.jwt.secret)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserSummary::from(user),
    }))
}
