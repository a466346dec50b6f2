use crate::auth::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}

// A missing or malformed Authorization header is 401; a token that is
// present but fails verification is 403. The SPA distinguishes the two.
impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "));

        let token = match token {
            Some(token) => token,
            None => return ready(Err(ApiError::Unauthenticated)),
        };

        let config = match req.app_data::<web::Data<Config>>() {
            Some(config) => config,
            None => return ready(Err(ApiError::Unauthenticated)),
        };

        match verify_token(token, &config.jwt.secret) {
            Ok(claims) => match claims.sub.parse::<i64>() {
                Ok(user_id) => ready(Ok(AuthenticatedUser {
                    user_id,
                    username: claims.username,
                })),
                Err(_) => ready(Err(ApiError::InvalidToken)),
            },
            Err(_) => ready(Err(ApiError::InvalidToken)),
        }
    }
}
