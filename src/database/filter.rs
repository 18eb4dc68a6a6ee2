use serde::Deserialize;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::error::{ApiError, QueryError};
use crate::jwt::SessionData;
use crate::pagination::{PageContext, PageRequest};
use crate::schema::{Recipe, RecipeRow, Uuid};

/// Request-time narrowing of the recipe listing. The overlay filters
/// (`is_favorited`, `is_in_shopping_cart`) only apply for authenticated
/// callers; anonymous callers get the unfiltered set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

fn build_recipe_query(
    filter: &RecipeFilter,
    viewer: Option<&SessionData>,
    page_size: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("SELECT r.*, COUNT(*) OVER () AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }

    if !filter.tags.is_empty() {
        query
            .push(" AND EXISTS (SELECT 1 FROM recipe_tags_map m INNER JOIN tags t ON t.id = m.tag_id WHERE m.recipe_id = r.id AND t.slug = ANY(")
            .push_bind(filter.tags.clone())
            .push("))");
    }

    if let Some(viewer) = viewer {
        if filter.is_favorited == Some(true) {
            query
                .push(" AND EXISTS (SELECT 1 FROM user_favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(viewer.user_id)
                .push(")");
        }
        if filter.is_in_shopping_cart == Some(true) {
            query
                .push(" AND EXISTS (SELECT 1 FROM user_shopping_list s WHERE s.recipe_id = r.id AND s.user_id = ")
                .push_bind(viewer.user_id)
                .push(")");
        }
    }

    query.push(" ORDER BY r.created_at DESC LIMIT ");
    query.push_bind(page_size);
    query.push(" OFFSET ");
    query.push_bind(offset);

    query
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<&SessionData>,
    page: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Recipe>, ApiError> {
    let page_size = page.page_size();
    let mut query = build_recipe_query(filter, viewer, page_size, page.offset);

    let rows: Vec<RecipeRow> = query
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, page_size, page.offset);
    Ok(page.map(Recipe::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRole;

    fn viewer() -> SessionData {
        SessionData {
            user_id: 7,
            email: String::from("b@example.com"),
            username: String::from("b"),
            role: UserRole::User,
            is_admin: false,
        }
    }

    #[test]
    fn bare_filter_only_orders_and_pages() {
        let mut query = build_recipe_query(&RecipeFilter::default(), None, 6, 0);
        let sql = query.sql();
        assert!(sql.contains("ORDER BY r.created_at DESC"));
        assert!(!sql.contains("user_favorites"));
        assert!(!sql.contains("user_shopping_list"));
        assert!(!sql.contains("tags"));
    }

    #[test]
    fn author_and_tags_narrow_the_set() {
        let filter = RecipeFilter {
            author: Some(3),
            tags: vec![String::from("breakfast")],
            ..RecipeFilter::default()
        };
        let mut query = build_recipe_query(&filter, None, 6, 0);
        let sql = query.sql();
        assert!(sql.contains("r.author_id = "));
        assert!(sql.contains("t.slug = ANY("));
    }

    #[test]
    fn overlay_filters_apply_for_authenticated_viewer() {
        let filter = RecipeFilter {
            is_favorited: Some(true),
            is_in_shopping_cart: Some(true),
            ..RecipeFilter::default()
        };
        let session = viewer();
        let mut query = build_recipe_query(&filter, Some(&session), 6, 0);
        let sql = query.sql();
        assert!(sql.contains("user_favorites"));
        assert!(sql.contains("user_shopping_list"));
    }

    #[test]
    fn overlay_filters_are_noops_for_anonymous_viewer() {
        let filter = RecipeFilter {
            is_favorited: Some(true),
            is_in_shopping_cart: Some(true),
            ..RecipeFilter::default()
        };
        let mut query = build_recipe_query(&filter, None, 6, 0);
        let sql = query.sql();
        assert!(!sql.contains("user_favorites"));
        assert!(!sql.contains("user_shopping_list"));
    }

    #[test]
    fn false_overlay_values_are_noops() {
        let filter = RecipeFilter {
            is_favorited: Some(false),
            ..RecipeFilter::default()
        };
        let session = viewer();
        let mut query = build_recipe_query(&filter, Some(&session), 6, 0);
        assert!(!query.sql().contains("user_favorites"));
    }
}
