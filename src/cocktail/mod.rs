//! TheCocktailDB access: HTTP client, response records, text formatting and
//! the validating operations exposed as tools.

pub mod client;
pub mod format;
pub mod models;
pub mod toolbox;

pub use client::{CocktailApiError, CocktailDbClient, RetryPolicy, DEFAULT_API_BASE_URL};
pub use models::{Drink, Ingredient};
pub use toolbox::{CocktailToolbox, ToolSpec};
