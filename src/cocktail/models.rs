//! TheCocktailDB response records.
//!
//! Field names follow the upstream JSON (`idDrink`, `strDrink`, ...). Every
//! field is optional because the API returns `null` freely.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Highest numbered ingredient/measure slot the API exposes.
pub const MAX_INGREDIENT_SLOTS: usize = 15;

/// A cocktail record as returned by `search.php`, `lookup.php` and `random.php`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drink {
    #[serde(rename = "idDrink")]
    pub id: Option<String>,
    #[serde(rename = "strDrink")]
    pub name: Option<String>,
    #[serde(rename = "strDrinkAlternate")]
    pub alternate_name: Option<String>,
    /// Comma-separated tag list
    #[serde(rename = "strTags")]
    pub tags: Option<String>,
    #[serde(rename = "strCategory")]
    pub category: Option<String>,
    #[serde(rename = "strIBA")]
    pub iba: Option<String>,
    #[serde(rename = "strAlcoholic")]
    pub alcoholic: Option<String>,
    #[serde(rename = "strGlass")]
    pub glass: Option<String>,
    #[serde(rename = "strInstructions")]
    pub instructions: Option<String>,
    #[serde(rename = "strDrinkThumb")]
    pub thumbnail: Option<String>,
    #[serde(rename = "dateModified")]
    pub date_modified: Option<String>,

    /// Everything else, including the numbered `strIngredientN` / `strMeasureN`
    /// slots and localized instruction variants.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Drink {
    /// Ingredient/measure pairs in slot order, skipping slots where either side
    /// is missing or blank. Measures are trimmed.
    pub fn ingredients(&self) -> Vec<(String, String)> {
        (1..=MAX_INGREDIENT_SLOTS)
            .filter_map(|slot| {
                let ingredient = self.slot_value("strIngredient", slot)?;
                let measure = self.slot_value("strMeasure", slot)?;
                Some((measure, ingredient))
            })
            .collect()
    }

    fn slot_value(&self, prefix: &str, slot: usize) -> Option<String> {
        self.extra
            .get(&format!("{}{}", prefix, slot))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// An ingredient record as returned by `search.php?i=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(rename = "idIngredient")]
    pub id: Option<String>,
    #[serde(rename = "strIngredient")]
    pub name: Option<String>,
    #[serde(rename = "strDescription")]
    pub description: Option<String>,
    #[serde(rename = "strType")]
    pub kind: Option<String>,
    #[serde(rename = "strAlcohol")]
    pub alcohol: Option<String>,
    #[serde(rename = "strABV")]
    pub abv: Option<String>,
}

/// `{"drinks": [...]}` envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrinksResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub drinks: Option<Vec<Drink>>,
}

/// `{"ingredients": [...]}` envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientsResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub ingredients: Option<Vec<Ingredient>>,
}

/// The API answers "no results" with `null`, and on some endpoints with a
/// placeholder string such as `"no data found"`. Both map to `None`, as does
/// an empty array.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(items) if !items.is_empty() => {
            let parsed = items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<T>, _>>()
                .map_err(serde::de::Error::custom)?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}
