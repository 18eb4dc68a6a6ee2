use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::config::Config;
use crate::database::schema::{User, UserRole};
use crate::error::ApiError;

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(user: &User, ttl_hours: i64) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(ttl_hours)).timestamp();

        Self {
            user_id: user.id,
            email: user.email.to_owned(),
            username: user.username.to_owned(),
            role: user.role.to_owned(),
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::forbidden(
                "You don't have permission to perform this action",
            ));
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            email: value.email,
            username: value.username,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

fn signing_key(config: &Config) -> Result<Hmac<Sha256>, ApiError> {
    Hmac::new_from_slice(config.jwt_secret.as_bytes())
        .map_err(|_| ApiError::Database(String::from("Invalid signing key")))
}

pub fn generate_jwt_session(user: &User, config: &Config) -> Result<String, ApiError> {
    let key = signing_key(config)?;
    let claims = JwtSessionData::new(user, config.session_ttl_hours);

    claims
        .sign_with_key(&key)
        .map_err(|_| ApiError::Database(String::from("Failed to sign session token")))
}

pub fn verify_jwt_session(token: &str, config: &Config) -> Result<JwtSessionData, ApiError> {
    let key = signing_key(config)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| ApiError::unauthorized("Invalid session; Invalid token"))?;

    let now = Utc::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(ApiError::unauthorized("Invalid session; Token expired"));
    }
    Ok(session)
}
