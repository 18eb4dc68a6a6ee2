pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 100;

/// Hard cap on nested recipe previews in subscription views, applied when the
/// caller passes no (or an unparseable) `recipes_limit` parameter.
pub const MAX_PREVIEW_RECIPES: i64 = 100;

pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 32_000;
pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32_000;

pub const MAX_NAME_LENGTH: usize = 64;
pub const MAX_TAG_LENGTH: usize = 32;

pub const DEFAULT_TAG_COLOR: &str = "#FF0000";

pub const SESSION_COOKIE: &str = "session";
