use sqlx::{Pool, Postgres};

use crate::{
    constants::{DEFAULT_TAG_COLOR, MAX_TAG_LENGTH},
    error::{ApiError, QueryError},
    schema::{Tag, Uuid},
    validate::ValidationErrors,
};

/// Creates a reference tag. Used at seeding time; duplicate names or slugs
/// are conflicts.
pub async fn create_tag(
    name: &str,
    slug: &str,
    color: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    let mut errors = ValidationErrors::default();
    if name.is_empty() || name.chars().count() > MAX_TAG_LENGTH {
        errors.push("name", &format!("Must be 1 to {MAX_TAG_LENGTH} characters"));
    }
    if slug.is_empty() || slug.chars().count() > MAX_TAG_LENGTH {
        errors.push("slug", &format!("Must be 1 to {MAX_TAG_LENGTH} characters"));
    }
    errors.into_result()?;

    let result: Option<(Uuid,)> = sqlx::query_as(
        "INSERT INTO tags (name, slug, color) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(name)
    .bind(slug)
    .bind(color.unwrap_or(DEFAULT_TAG_COLOR))
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    match result {
        Some((id,)) => Ok(id),
        None => Err(ApiError::conflict("Tag already exists")),
    }
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Uuid>, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row.map(|tag| tag.0))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let rows: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(rows)
}

pub async fn list_recipe_tags(
    pool: &Pool<Postgres>,
    recipe_id: Uuid,
) -> Result<Vec<Tag>, ApiError> {
    let rows: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags_map m
        INNER JOIN tags t ON t.id = m.tag_id
        WHERE m.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(rows)
}
