use log::info;
use sqlx::{Pool, Postgres};

use crate::{
    authentication::{cryptography, jwt::generate_jwt_session},
    config::Config,
    error::{ApiError, QueryError},
    schema::{User, Uuid},
};

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

/// Creates an account. The email is the login key; a duplicate registration
/// is a conflict.
pub async fn register_user(
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    let password_hash = cryptography::hash_password(password)
        .map_err(|e| ApiError::Database(format!("Failed to hash password: {e}")))?;

    let result = sqlx::query_as::<_, (Uuid,)>(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING id;
    ",
    )
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(password_hash)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    match result {
        Some((id,)) => {
            info!("registered user {username} ({id})");
            Ok(id)
        }
        None => Err(ApiError::conflict("A user with that email already exists")),
    }
}

pub async fn login_user(
    email: &str,
    password: &str,
    config: &Config,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = get_user_by_email(pool, email).await?;
    let user = match user {
        Some(user) => user,
        None => return Err(ApiError::unauthorized("Invalid credentials")),
    };

    let authenticated = cryptography::verify_password(password, &user.password)
        .map_err(|e| ApiError::Database(format!("Failed to verify password: {e}")))?;
    if !authenticated {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    generate_jwt_session(&user, config)
}
