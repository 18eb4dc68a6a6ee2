use log::info;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    authentication::permissions::ActionType,
    config::Config,
    error::{ApiError, QueryError},
    jwt::SessionData,
    media::image::{remove_image, save_image},
    schema::{IngredientLine, Recipe, Uuid},
    validate::RecipeInput,
};

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

/// Resolves a recipe for mutation. Only the author may update or delete;
/// admins may manage any recipe.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(ApiError::forbidden("Only the author can modify a recipe"))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(ApiError::not_found("No recipe exists with specified id")),
    }
}

pub async fn list_recipe_ingredients(
    pool: &Pool<Postgres>,
    recipe_id: Uuid,
) -> Result<Vec<IngredientLine>, ApiError> {
    let rows: Vec<IngredientLine> = sqlx::query_as(
        "
        SELECT l.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name,
               i.measurement_unit AS measurement_unit, l.amount AS amount
        FROM recipe_ingredients l
        INNER JOIN ingredients i ON i.id = l.ingredient_id
        WHERE l.recipe_id = $1
        ORDER BY l.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(rows)
}

/// Most recent recipes by one author, for the subscription previews.
pub async fn list_author_recipes(
    author_id: Uuid,
    limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, ApiError> {
    let rows: Vec<Recipe> = sqlx::query_as(
        "SELECT * FROM recipes WHERE author_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(rows)
}

pub async fn count_author_recipes(
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<i64, ApiError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row.0)
}

async fn insert_recipe_relations(
    recipe_id: Uuid,
    input: &RecipeInput,
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    for tag_id in &input.tags {
        sqlx::query("INSERT INTO recipe_tags_map (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tr)
            .await
            .map_err(|e| ApiError::from(QueryError::from(e)))?;
    }

    for line in &input.ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(recipe_id)
        .bind(line.id)
        .bind(line.amount)
        .execute(&mut **tr)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;
    }

    Ok(())
}

/// Validates the input, stores the image and persists the recipe together
/// with its tag and ingredient rows in one transaction. If the transaction
/// fails the stored image is removed again.
pub async fn create_recipe(
    session: &SessionData,
    input: &RecipeInput,
    config: &Config,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    session.authenticate(ActionType::CreateRecipes)?;
    input.validate(true)?;

    let image = input.image.as_deref().unwrap_or_default();
    let image_path = save_image(image, &config.media_root)?;

    match persist_new_recipe(session.user_id, input, &image_path, pool).await {
        Ok(id) => {
            info!("user {} created recipe {} ({id})", session.user_id, input.name);
            Ok(id)
        }
        Err(e) => {
            remove_image(&image_path, &config.media_root);
            Err(e)
        }
    }
}

async fn persist_new_recipe(
    author_id: Uuid,
    input: &RecipeInput,
    image_path: &str,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| ApiError::Database(String::from("Could not start transaction")))?;

    let id: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, cooking_time, image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&input.name)
    .bind(&input.text)
    .bind(input.cooking_time)
    .bind(image_path)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    insert_recipe_relations(id.0, input, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| ApiError::Database(String::from("Could not commit transaction")))?;

    Ok(id.0)
}

/// Replaces the recipe's fields and its full tag and ingredient sets. Callers
/// go through [`get_recipe_mut`] first, so ownership is already settled. A
/// freshly stored image is removed again if the transaction fails.
pub async fn update_recipe(
    recipe: &Recipe,
    input: &RecipeInput,
    config: &Config,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    input.validate(false)?;

    let new_image = match input.image.as_deref() {
        Some(data_url) if !data_url.is_empty() => Some(save_image(data_url, &config.media_root)?),
        _ => None,
    };
    let image_path = new_image.as_deref().unwrap_or(&recipe.image);

    match persist_recipe_update(recipe.id, input, image_path, pool).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Some(path) = new_image.as_deref() {
                remove_image(path, &config.media_root);
            }
            Err(e)
        }
    }
}

async fn persist_recipe_update(
    recipe_id: Uuid,
    input: &RecipeInput,
    image_path: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| ApiError::Database(String::from("Could not start transaction")))?;

    sqlx::query(
        "UPDATE recipes SET name = $1, text = $2, cooking_time = $3, image = $4 WHERE id = $5",
    )
    .bind(&input.name)
    .bind(&input.text)
    .bind(input.cooking_time)
    .bind(image_path)
    .bind(recipe_id)
    .execute(&mut *tr)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM recipe_tags_map WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    insert_recipe_relations(recipe_id, input, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| ApiError::Database(String::from("Could not commit transaction")))?;

    Ok(())
}

/// Deletes a recipe and every row hanging off it: ingredient lines, tag map,
/// favorites and shopping-list entries.
pub async fn delete_recipe(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| ApiError::Database(String::from("Could not start transaction")))?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM recipe_tags_map WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM user_favorites WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM user_shopping_list WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    tr.commit()
        .await
        .map_err(|_| ApiError::Database(String::from("Could not commit transaction")))?;

    info!("deleted recipe {recipe_id}");
    Ok(())
}
