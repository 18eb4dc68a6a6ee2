use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_AMOUNT, MAX_COOKING_TIME, MAX_NAME_LENGTH, MIN_AMOUNT, MIN_COOKING_TIME,
};
use crate::error::ApiError;
use crate::schema::Uuid;

/// Write shape of a recipe: tag ids, (ingredient, amount) pairs and an inline
/// base64 data-URL image.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInput {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

/// Per-field validation failures, keyed by field name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(|v| v.as_slice())
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl RecipeInput {
    /// Checks every invariant that must hold before any row is written. The
    /// image is required on create but may be omitted on update (`require_image`).
    pub fn validate(&self, require_image: bool) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::default();

        if self.name.trim().is_empty() {
            errors.push("name", "Must not be empty");
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            errors.push("name", "Too long");
        }

        if self.cooking_time < MIN_COOKING_TIME || self.cooking_time > MAX_COOKING_TIME {
            errors.push(
                "cooking_time",
                &format!("Must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME}"),
            );
        }

        if self.tags.is_empty() {
            errors.push("tags", "Must not be empty");
        }
        let unique_tags: HashSet<Uuid> = self.tags.iter().copied().collect();
        if unique_tags.len() != self.tags.len() {
            errors.push("tags", "Already added to this recipe");
        }

        if self.ingredients.is_empty() {
            errors.push("ingredients", "Must not be empty");
        }
        let unique_ingredients: HashSet<Uuid> =
            self.ingredients.iter().map(|line| line.id).collect();
        if unique_ingredients.len() != self.ingredients.len() {
            errors.push("ingredients", "Already added to this recipe");
        }
        for line in &self.ingredients {
            if line.amount < MIN_AMOUNT || line.amount > MAX_AMOUNT {
                errors.push(
                    "ingredients",
                    &format!("Amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}"),
                );
            }
        }

        if require_image && self.image.as_deref().map_or(true, |v| v.is_empty()) {
            errors.push("image", "Must not be empty");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RecipeInput {
        RecipeInput {
            name: String::from("Pancakes"),
            text: String::from("Mix and fry."),
            cooking_time: 20,
            image: Some(String::from("data:image/png;base64,aGVsbG8=")),
            tags: vec![1],
            ingredients: vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 100 },
            ],
        }
    }

    fn errors_of(input: &RecipeInput) -> ValidationErrors {
        match input.validate(true) {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate(true).is_ok());
    }

    #[test]
    fn empty_tag_list_fails() {
        let mut recipe = input();
        recipe.tags.clear();
        assert!(errors_of(&recipe).field("tags").is_some());
    }

    #[test]
    fn empty_ingredient_list_fails() {
        let mut recipe = input();
        recipe.ingredients.clear();
        assert!(errors_of(&recipe).field("ingredients").is_some());
    }

    #[test]
    fn duplicate_tag_ids_fail() {
        let mut recipe = input();
        recipe.tags = vec![1, 1];
        assert!(errors_of(&recipe).field("tags").is_some());
    }

    #[test]
    fn duplicate_ingredient_ids_fail() {
        let mut recipe = input();
        recipe.ingredients = vec![
            IngredientAmount { id: 1, amount: 200 },
            IngredientAmount { id: 1, amount: 100 },
        ];
        assert!(errors_of(&recipe).field("ingredients").is_some());
    }

    #[test]
    fn amount_bounds_are_enforced() {
        let mut recipe = input();
        recipe.ingredients[0].amount = 0;
        assert!(errors_of(&recipe).field("ingredients").is_some());

        recipe.ingredients[0].amount = MAX_AMOUNT + 1;
        assert!(errors_of(&recipe).field("ingredients").is_some());

        recipe.ingredients[0].amount = MAX_AMOUNT;
        assert!(recipe.validate(true).is_ok());
    }

    #[test]
    fn cooking_time_bounds_are_enforced() {
        let mut recipe = input();
        recipe.cooking_time = 0;
        assert!(errors_of(&recipe).field("cooking_time").is_some());

        recipe.cooking_time = MAX_COOKING_TIME + 1;
        assert!(errors_of(&recipe).field("cooking_time").is_some());
    }

    #[test]
    fn missing_image_fails_on_create_only() {
        let mut recipe = input();
        recipe.image = None;
        assert!(errors_of(&recipe).field("image").is_some());
        assert!(recipe.validate(false).is_ok());
    }

    #[test]
    fn multiple_failures_are_reported_per_field() {
        let mut recipe = input();
        recipe.name = String::new();
        recipe.tags.clear();
        recipe.ingredients.clear();
        let errors = errors_of(&recipe);
        assert!(errors.field("name").is_some());
        assert!(errors.field("tags").is_some());
        assert!(errors.field("ingredients").is_some());
    }
}
