use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use sqlx::{Pool, Postgres};

use crate::actions::{list_recipe_ingredients, list_shopping_list};
use crate::error::ApiError;
use crate::schema::{IngredientLine, Recipe, Uuid};

/// Formats the shopping-list report: one block per recipe, one line per
/// ingredient as `name — amount unit`.
pub fn format_report(recipes: &[(Recipe, Vec<IngredientLine>)]) -> String {
    let mut report = String::new();

    for (recipe, lines) in recipes {
        report.push_str(&format!("For \"{}\" you will need:\n", recipe.name));
        for line in lines {
            report.push_str(&format!(
                "{} — {} {}\n",
                line.name, line.amount, line.measurement_unit
            ));
        }
    }

    report
}

/// Builds the flat text report over every recipe in the user's shopping list.
pub async fn export_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let recipes = list_shopping_list(user_id, pool).await?;

    let mut blocks = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let lines = list_recipe_ingredients(pool, recipe.id).await?;
        blocks.push((recipe, lines));
    }

    Ok(format_report(&blocks))
}

/// Writes the report as a downloadable text attachment under `media_root`,
/// returning the file path.
pub async fn write_shopping_list_file(
    user_id: Uuid,
    media_root: &Path,
    pool: &Pool<Postgres>,
) -> Result<PathBuf, ApiError> {
    let report = export_shopping_list(user_id, pool).await?;

    let path = media_root
        .join("reports")
        .join(format!("shopping-list-{user_id}.txt"));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ApiError::Database(format!("Failed to create report dir: {e}")))?;
    }
    fs::write(&path, report)
        .map_err(|e| ApiError::Database(format!("Failed to write report: {e}")))?;

    info!("wrote shopping-list report for user {user_id}");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn recipe(id: Uuid, name: &str) -> Recipe {
        Recipe {
            id,
            author_id: 1,
            name: name.to_string(),
            text: String::new(),
            cooking_time: 10,
            image: String::from("recipes/r.png"),
            created_at: Utc::now(),
        }
    }

    fn line(recipe_id: Uuid, name: &str, amount: i32, unit: &str) -> IngredientLine {
        IngredientLine {
            recipe_id,
            ingredient_id: 0,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn report_groups_lines_under_recipe_names() {
        let blocks = vec![(
            recipe(1, "Pancakes"),
            vec![line(1, "flour", 200, "g"), line(1, "sugar", 100, "g")],
        )];

        let report = format_report(&blocks);
        assert!(report.contains("For \"Pancakes\" you will need:"));
        assert!(report.contains("flour — 200 g"));
        assert!(report.contains("sugar — 100 g"));
    }

    #[test]
    fn recipes_appear_in_relation_order() {
        let blocks = vec![
            (recipe(1, "Pancakes"), vec![line(1, "flour", 200, "g")]),
            (recipe(2, "Lemonade"), vec![line(2, "lemon", 2, "pcs")]),
        ];

        let report = format_report(&blocks);
        let pancakes = report.find("Pancakes").unwrap();
        let lemonade = report.find("Lemonade").unwrap();
        assert!(pancakes < lemonade);
    }

    #[test]
    fn empty_list_yields_an_empty_report() {
        assert_eq!(format_report(&[]), "");
    }
}
