use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::actions::{
    count_author_recipes, get_recipe, get_user_by_id, is_favorite, is_in_shopping_list,
    is_subscribed, list_author_recipes, list_following, list_recipe_ingredients, list_recipe_tags,
};
use crate::constants::MAX_PREVIEW_RECIPES;
use crate::error::ApiError;
use crate::jwt::SessionData;
use crate::schema::{IngredientLine, Recipe, Tag, User, Uuid};

/// Author profile with the caller-relative `is_subscribed` flag.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientLineView {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<IngredientLine> for IngredientLineView {
    fn from(line: IngredientLine) -> Self {
        Self {
            id: line.ingredient_id,
            name: line.name,
            measurement_unit: line.measurement_unit,
            amount: line.amount,
        }
    }
}

/// Full read shape of a recipe, including the two caller-relative flags.
/// Anonymous callers always see them as false.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
    pub text: String,
    pub ingredients: Vec<IngredientLineView>,
    pub tags: Vec<Tag>,
    pub author: UserProfile,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipePreview {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipePreview {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// A followed user with a capped list of their recipes and the total count.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserProfile,
    pub recipes: Vec<RecipePreview>,
    pub recipes_count: i64,
}

pub async fn build_user_profile(
    user: &User,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, ApiError> {
    let subscribed = match viewer {
        Some(session) => is_subscribed(session.user_id, user.id, pool).await?,
        None => false,
    };

    Ok(UserProfile {
        id: user.id,
        email: user.email.to_owned(),
        username: user.username.to_owned(),
        first_name: user.first_name.to_owned(),
        last_name: user.last_name.to_owned(),
        is_subscribed: subscribed,
    })
}

pub async fn build_recipe_view(
    recipe_id: Uuid,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let recipe = get_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No recipe exists with specified id"))?;

    let author = get_user_by_id(pool, recipe.author_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe author no longer exists"))?;
    let author = build_user_profile(&author, viewer, pool).await?;

    let tags = list_recipe_tags(pool, recipe.id).await?;
    let ingredients = list_recipe_ingredients(pool, recipe.id)
        .await?
        .into_iter()
        .map(IngredientLineView::from)
        .collect();

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(session) => (
            is_favorite(recipe.id, session.user_id, pool).await?,
            is_in_shopping_list(recipe.id, session.user_id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        id: recipe.id,
        name: recipe.name,
        image: recipe.image,
        cooking_time: recipe.cooking_time,
        text: recipe.text,
        ingredients,
        tags,
        author,
        is_favorited,
        is_in_shopping_cart,
    })
}

pub async fn build_subscription_view(
    user: &User,
    viewer: &SessionData,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, ApiError> {
    let profile = build_user_profile(user, Some(viewer), pool).await?;

    let limit = recipes_limit
        .filter(|limit| *limit > 0)
        .unwrap_or(MAX_PREVIEW_RECIPES)
        .min(MAX_PREVIEW_RECIPES);

    let recipes = list_author_recipes(user.id, limit, pool)
        .await?
        .into_iter()
        .map(RecipePreview::from)
        .collect();
    let recipes_count = count_author_recipes(user.id, pool).await?;

    Ok(SubscriptionView {
        user: profile,
        recipes,
        recipes_count,
    })
}

/// The caller's followed users, each with nested recipe previews.
pub async fn list_subscriptions(
    session: &SessionData,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<SubscriptionView>, ApiError> {
    let following = list_following(session.user_id, pool).await?;

    let mut views = Vec::with_capacity(following.len());
    for user in &following {
        views.push(build_subscription_view(user, session, recipes_limit, pool).await?);
    }

    Ok(views)
}
