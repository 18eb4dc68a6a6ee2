use log::info;
use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::{Follow, User, Uuid},
};

use super::get_user_by_id;

/// Subscribes `user_id` to `following_id`. Self-follow and an already
/// existing pair are conflicts; a missing target is not-found.
pub async fn subscribe(
    user_id: Uuid,
    following_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if user_id == following_id {
        return Err(ApiError::conflict("Cannot follow yourself"));
    }

    let target = get_user_by_id(pool, following_id).await?;
    if target.is_none() {
        return Err(ApiError::not_found("No user exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO user_follows (user_id, following_id) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *;",
    )
    .bind(user_id)
    .bind(following_id)
    .execute(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Already following this user"));
    }

    info!("user {user_id} followed user {following_id}");
    Ok(())
}

pub async fn unsubscribe(
    user_id: Uuid,
    following_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM user_follows WHERE user_id = $1 AND following_id = $2")
        .bind(user_id)
        .bind(following_id)
        .execute(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Not following this user"));
    }

    Ok(())
}

pub async fn is_subscribed(
    user_id: Uuid,
    following_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<Follow> = sqlx::query_as(
        "SELECT user_id, following_id FROM user_follows WHERE user_id = $1 AND following_id = $2",
    )
    .bind(user_id)
    .bind(following_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(result.is_some())
}

/// Users followed by `user_id`, in follow-insertion order.
pub async fn list_following(user_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<User>, ApiError> {
    let rows: Vec<User> = sqlx::query_as(
        "
        SELECT u.*
        FROM user_follows f
        INNER JOIN users u ON u.id = f.following_id
        WHERE f.user_id = $1
        ORDER BY f.id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(rows)
}
