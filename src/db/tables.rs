use redb::{MultimapTableDefinition, TableDefinition};

/// Id sequences: collection name -> last issued id
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Users table: user_id (peppered SHA-256 hash) -> UserRecord (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Email lookup: normalized email -> user_id
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Ingredients table: ingredient id -> IngredientRecord (serialized)
pub const INGREDIENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("ingredients");

/// Ingredients by owner. Values sort ascending, so iteration follows insertion order
pub const INGREDIENTS_BY_USER: MultimapTableDefinition<&str, u64> =
    MultimapTableDefinition::new("ingredients_by_user");

/// Ingredients by name (not queried yet)
pub const INGREDIENTS_BY_NAME: MultimapTableDefinition<&str, u64> =
    MultimapTableDefinition::new("ingredients_by_name");

/// Recipes table: recipe id -> RecipeRecord (serialized)
pub const RECIPES: TableDefinition<u64, &[u8]> = TableDefinition::new("recipes");

pub const RECIPES_BY_USER: MultimapTableDefinition<&str, u64> =
    MultimapTableDefinition::new("recipes_by_user");

/// Recipes by title (not queried yet)
pub const RECIPES_BY_TITLE: MultimapTableDefinition<&str, u64> =
    MultimapTableDefinition::new("recipes_by_title");

/// Recipe ingredient links: link id -> RecipeIngredientRecord (serialized)
pub const RECIPE_INGREDIENTS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("recipe_ingredients");

/// recipe id -> link ids
/// Used for detail reads and cascade delete
pub const RECIPE_INGREDIENTS_BY_RECIPE: MultimapTableDefinition<u64, u64> =
    MultimapTableDefinition::new("recipe_ingredients_by_recipe");

/// ingredient id -> link ids
pub const RECIPE_INGREDIENTS_BY_INGREDIENT: MultimapTableDefinition<u64, u64> =
    MultimapTableDefinition::new("recipe_ingredients_by_ingredient");

/// Recipe steps: (recipe id, step number) -> instruction
/// The composite key keeps each recipe's steps contiguous and ordered
pub const RECIPE_STEPS: TableDefinition<(u64, u32), &str> = TableDefinition::new("recipe_steps");

/// Blobs table: storage id (SHA-256 of content) -> BlobRecord (serialized)
pub const BLOBS: TableDefinition<&str, &[u8]> = TableDefinition::new("blobs");
