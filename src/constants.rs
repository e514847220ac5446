/// Maximum uploaded image size in bytes (5MB)
/// Phone photos picked at 0.8 quality with a 4:3 crop land well under this
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5_242_880;

/// Default session lifetime (30 days)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 2_592_000;

/// Minimum accepted password length at sign-up
pub const MIN_PASSWORD_LEN: usize = 8;

/// Upper bound on a nutrient value (per 100g) accepted for an ingredient
pub const MAX_NUTRIENT_VALUE: f64 = 10_000.0;

/// Upper bound on the amount of a single recipe ingredient line
pub const MAX_LINE_AMOUNT: f64 = 1_000_000.0;

// =============================================================================
// Atwater factors (kcal per gram)
// =============================================================================

pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// Nutrient values on ingredients are expressed per this many grams
pub const NUTRIENT_BASIS_GRAMS: f64 = 100.0;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_NAME_REQUIRED: &str = "Please add a name for this ingredient";

pub const ERR_CALORIES_POSITIVE: &str = "Calories must be a positive number";

pub const ERR_TITLE_REQUIRED: &str = "Recipe title must not be empty";

pub const ERR_UNKNOWN_IMAGE: &str = "Image reference does not exist";

pub const ERR_INVALID_EMAIL: &str = "A valid email address is required";

pub const ERR_PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
