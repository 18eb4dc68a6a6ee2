use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::{Recipe, Uuid},
};

use super::get_recipe;

pub async fn is_in_shopping_list(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "SELECT recipe_id FROM user_shopping_list WHERE recipe_id = $1 AND user_id = $2",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(result.is_some())
}

pub async fn add_to_shopping_list(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if get_recipe(recipe_id, pool).await?.is_none() {
        return Err(ApiError::not_found("No recipe exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO user_shopping_list (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *;",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Recipe is already in the shopping list"));
    }

    Ok(())
}

pub async fn remove_from_shopping_list(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result =
        sqlx::query("DELETE FROM user_shopping_list WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(pool)
            .await
            .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Recipe is not in the shopping list"));
    }

    Ok(())
}

/// Every recipe currently in the user's shopping list, in insertion order.
pub async fn list_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, ApiError> {
    let rows: Vec<Recipe> = sqlx::query_as(
        "
        SELECT r.*
        FROM user_shopping_list s
        INNER JOIN recipes r ON r.id = s.recipe_id
        WHERE s.user_id = $1
        ORDER BY s.id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(rows)
}
