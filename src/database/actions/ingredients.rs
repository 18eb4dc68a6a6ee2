use log::info;
use sqlx::{Pool, Postgres};

use crate::{
    constants::INGREDIENT_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    schema::{Ingredient, Uuid},
};

pub async fn get_ingredient(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY id")
        .fetch_all(&*pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(rows)
}

/// Quotes `%`, `_` and `\` so a caller-supplied string matches literally
/// inside an ILIKE pattern.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive name-prefix search over the reference data. The prefix
/// is matched literally, not as a pattern.
pub async fn search_ingredients(
    prefix: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = sqlx::query_as(
        "SELECT * FROM ingredients WHERE name ILIKE $1 || '%' ORDER BY name LIMIT $2",
    )
    .bind(escape_like(prefix))
    .bind(INGREDIENT_COUNT_PER_PAGE)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(rows)
}

/// Seeds the ingredient catalog from `(name, measurement_unit)` pairs in one
/// transaction, skipping pairs that already exist.
pub async fn bulk_import_ingredients(
    entries: &[(String, String)],
    pool: &Pool<Postgres>,
) -> Result<u64, ApiError> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| ApiError::Database(String::from("Could not start transaction")))?;

    let mut imported = 0;
    for (name, measurement_unit) in entries {
        let result = sqlx::query(
            "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(name)
        .bind(measurement_unit)
        .execute(&mut *tr)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

        imported += result.rows_affected();
    }

    tr.commit()
        .await
        .map_err(|_| ApiError::Database(String::from("Could not commit transaction")))?;

    info!("imported {imported} ingredients ({} given)", entries.len());
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prefixes_pass_through() {
        assert_eq!(escape_like("flour"), "flour");
    }

    #[test]
    fn wildcards_are_quoted() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
