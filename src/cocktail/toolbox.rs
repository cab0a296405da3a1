//! Validating lookup/search operations over the CocktailDB client.
//!
//! Each operation returns display text. Bad input and empty results are
//! answered with a fixed message rather than an error, so the agent can relay
//! them verbatim; only transport/decode failures surface as `Err`.

use rmcp::handler::server::tool::schema_for_type;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::client::{CocktailApiError, CocktailDbClient};
use super::format::{format_cocktail_details, format_cocktail_summary, format_ingredient, join_records};

pub const INVALID_LETTER: &str = "Invalid input: Please provide a single letter.";
pub const INVALID_COCKTAIL_ID: &str = "Invalid input: Cocktail ID must be a number.";
pub const NO_COCKTAILS_BY_NAME: &str = "No cocktails found with that name.";
pub const NO_INGREDIENT_BY_NAME: &str = "No ingredient found with that name.";
pub const NO_RANDOM_COCKTAIL: &str = "Could not fetch a random cocktail.";

/// Description of one operation, as advertised to the agent.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CocktailNameParams {
    /// Cocktail name or part of it, e.g. "margarita"
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FirstLetterParams {
    /// A single letter, e.g. "a"
    pub letter: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct IngredientNameParams {
    /// Ingredient name, e.g. "vodka"
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CocktailIdParams {
    /// Numeric cocktail ID, e.g. "11007"
    pub cocktail_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

/// JSON schema object for a parameter struct, in the dialect MCP clients expect.
pub fn params_schema<T: JsonSchema + 'static>() -> Map<String, Value> {
    schema_for_type::<T>().as_ref().clone()
}

#[derive(Debug, Clone)]
pub struct CocktailToolbox {
    client: CocktailDbClient,
}

impl CocktailToolbox {
    pub const SEARCH_COCKTAIL_BY_NAME: &'static str = "search_cocktail_by_name";
    pub const LIST_COCKTAILS_BY_FIRST_LETTER: &'static str = "list_cocktails_by_first_letter";
    pub const SEARCH_INGREDIENT_BY_NAME: &'static str = "search_ingredient_by_name";
    pub const LIST_RANDOM_COCKTAILS: &'static str = "list_random_cocktails";
    pub const LOOKUP_COCKTAIL_DETAILS_BY_ID: &'static str = "lookup_cocktail_details_by_id";

    pub fn new(client: CocktailDbClient) -> Self {
        Self { client }
    }

    pub fn specs() -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: Self::SEARCH_COCKTAIL_BY_NAME,
                description: "Search cocktails by name. Returns a short summary (ID, name, category, instructions) for every match.",
                parameters: Value::Object(params_schema::<CocktailNameParams>()),
            },
            ToolSpec {
                name: Self::LIST_COCKTAILS_BY_FIRST_LETTER,
                description: "List all cocktails whose name starts with the given letter.",
                parameters: Value::Object(params_schema::<FirstLetterParams>()),
            },
            ToolSpec {
                name: Self::SEARCH_INGREDIENT_BY_NAME,
                description: "Look up an ingredient by name. Returns type, alcohol content and description.",
                parameters: Value::Object(params_schema::<IngredientNameParams>()),
            },
            ToolSpec {
                name: Self::LIST_RANDOM_COCKTAILS,
                description: "Fetch one random cocktail with its full recipe.",
                parameters: Value::Object(params_schema::<NoParams>()),
            },
            ToolSpec {
                name: Self::LOOKUP_COCKTAIL_DETAILS_BY_ID,
                description: "Get the full recipe (ingredients, measures, glass, instructions) of a cocktail by its numeric ID.",
                parameters: Value::Object(params_schema::<CocktailIdParams>()),
            },
        ]
    }

    /// Dispatch by tool name with JSON arguments.
    pub async fn call(&self, name: &str, args: Value) -> anyhow::Result<String> {
        let text = match name {
            Self::SEARCH_COCKTAIL_BY_NAME => {
                let params: CocktailNameParams = parse_args(args)?;
                self.search_cocktail_by_name(&params.name).await?
            }
            Self::LIST_COCKTAILS_BY_FIRST_LETTER => {
                let params: FirstLetterParams = parse_args(args)?;
                self.list_cocktails_by_first_letter(&params.letter).await?
            }
            Self::SEARCH_INGREDIENT_BY_NAME => {
                let params: IngredientNameParams = parse_args(args)?;
                self.search_ingredient_by_name(&params.name).await?
            }
            Self::LIST_RANDOM_COCKTAILS => self.list_random_cocktails().await?,
            Self::LOOKUP_COCKTAIL_DETAILS_BY_ID => {
                let params: CocktailIdParams = parse_args(args)?;
                self.lookup_cocktail_details_by_id(&params.cocktail_id).await?
            }
            other => anyhow::bail!("Unknown tool: {}", other),
        };
        Ok(text)
    }

    pub async fn search_cocktail_by_name(&self, name: &str) -> Result<String, CocktailApiError> {
        match self.client.search_cocktails(name.trim()).await? {
            Some(drinks) => Ok(format!(
                "Found cocktails:\n\n{}",
                join_records(drinks.iter().map(format_cocktail_summary))
            )),
            None => Ok(NO_COCKTAILS_BY_NAME.to_string()),
        }
    }

    pub async fn list_cocktails_by_first_letter(
        &self,
        letter: &str,
    ) -> Result<String, CocktailApiError> {
        let Some(letter) = single_letter(letter) else {
            return Ok(INVALID_LETTER.to_string());
        };
        let shown = letter.to_ascii_uppercase();
        match self.client.cocktails_by_first_letter(letter).await? {
            Some(drinks) => Ok(format!(
                "Cocktails starting with '{}':\n\n{}",
                shown,
                join_records(drinks.iter().map(format_cocktail_summary))
            )),
            None => Ok(format!(
                "No cocktails found starting with the letter '{}'.",
                shown
            )),
        }
    }

    pub async fn search_ingredient_by_name(&self, name: &str) -> Result<String, CocktailApiError> {
        match self.client.search_ingredients(name.trim()).await? {
            Some(ingredients) => Ok(join_records(ingredients.iter().map(format_ingredient))),
            None => Ok(NO_INGREDIENT_BY_NAME.to_string()),
        }
    }

    pub async fn list_random_cocktails(&self) -> Result<String, CocktailApiError> {
        match self.client.random_cocktail().await? {
            Some(drinks) => Ok(join_records(drinks.iter().map(format_cocktail_details))),
            None => Ok(NO_RANDOM_COCKTAIL.to_string()),
        }
    }

    pub async fn lookup_cocktail_details_by_id(
        &self,
        cocktail_id: &str,
    ) -> Result<String, CocktailApiError> {
        let id = cocktail_id.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Ok(INVALID_COCKTAIL_ID.to_string());
        }
        match self.client.lookup_cocktail(id).await? {
            Some(drinks) => Ok(join_records(drinks.iter().map(format_cocktail_details))),
            None => Ok(format!("No cocktail found with ID {}.", id)),
        }
    }
}

/// Exactly one alphabetic character, lowercased.
fn single_letter(input: &str) -> Option<char> {
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphabetic() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

/// Decode tool arguments; a missing/`null` argument object counts as empty.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> anyhow::Result<T> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| anyhow::anyhow!("Invalid parameters: {}", e))
}
