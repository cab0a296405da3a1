//! Plain-text renderings of CocktailDB records.
//!
//! These are what the tool server hands back to the agent, so they favour
//! stable `Label: value` lines the model can quote.

use super::models::{Drink, Ingredient};

/// Maximum length of the instructions field in the summary form, ellipsis
/// included.
pub const SUMMARY_INSTRUCTIONS_LIMIT: usize = 150;

const ELLIPSIS: &str = "...";
const MISSING: &str = "N/A";

fn or_missing(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING)
}

/// Truncate `text` to at most `limit` characters, replacing the tail with an
/// ellipsis when anything was cut. Limits too small for the ellipsis get a
/// plain cut.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit < ELLIPSIS.len() {
        return text.chars().take(limit).collect();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Short form used in search listings.
pub fn format_cocktail_summary(drink: &Drink) -> String {
    let instructions = truncate_with_ellipsis(
        or_missing(&drink.instructions),
        SUMMARY_INSTRUCTIONS_LIMIT,
    );
    format!(
        "ID: {}\nName: {}\nCategory: {}\nInstructions: {}",
        or_missing(&drink.id),
        or_missing(&drink.name),
        or_missing(&drink.category),
        instructions
    )
}

/// Full recipe including the compacted ingredient list.
pub fn format_cocktail_details(drink: &Drink) -> String {
    let ingredients = drink.ingredients();
    let ingredient_lines = if ingredients.is_empty() {
        format!("- {}", MISSING)
    } else {
        ingredients
            .iter()
            .map(|(measure, ingredient)| format!("- {} {}", measure, ingredient))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "ID: {}\nName: {}\nCategory: {}\nTags: {}\nGlass: {}\nAlcoholic: {}\nInstructions: {}\nIngredients:\n{}\nImage URL: {}",
        or_missing(&drink.id),
        or_missing(&drink.name),
        or_missing(&drink.category),
        or_missing(&drink.tags),
        or_missing(&drink.glass),
        or_missing(&drink.alcoholic),
        or_missing(&drink.instructions),
        ingredient_lines,
        or_missing(&drink.thumbnail),
    )
}

pub fn format_ingredient(ingredient: &Ingredient) -> String {
    let abv = match ingredient.abv.as_deref().map(str::trim) {
        Some(abv) if !abv.is_empty() => format!("{}%", abv),
        _ => MISSING.to_string(),
    };
    format!(
        "ID: {}\nName: {}\nType: {}\nAlcoholic: {}\nABV: {}\nDescription: {}",
        or_missing(&ingredient.id),
        or_missing(&ingredient.name),
        or_missing(&ingredient.kind),
        or_missing(&ingredient.alcohol),
        abv,
        or_missing(&ingredient.description),
    )
}

/// Join rendered records with a separator line.
pub fn join_records(records: impl IntoIterator<Item = String>) -> String {
    records.into_iter().collect::<Vec<_>>().join("\n---\n")
}


#[cfg(test)]
mod tests {
    use super::fixtures::{margarita, vodka};
    use super::*;

    fn instructions_line(summary: &str) -> &str {
        summary
            .lines()
            .find_map(|l| l.strip_prefix("Instructions: "))
            .unwrap()
    }

    #[test]
    fn summary_truncates_long_instructions() {
        let drink = margarita();
        let full = drink.instructions.clone().unwrap();
        assert!(full.chars().count() > SUMMARY_INSTRUCTIONS_LIMIT);

        let summary = format_cocktail_summary(&drink);
        assert!(summary.contains("ID: 11007"));
        assert!(summary.contains("Name: Margarita"));
        assert!(summary.contains("Category: Ordinary Drink"));

        let shown = instructions_line(&summary);
        let prefix = shown.strip_suffix("...").unwrap();
        assert!(full.starts_with(prefix));
        assert!(shown.chars().count() < full.chars().count());
        assert!(shown.starts_with("Rub the rim of the glass with the lime slice"));
    }

    #[test]
    fn summary_keeps_short_instructions_intact() {
        let mut drink = margarita();
        drink.instructions = Some("Stir.".to_string());
        let summary = format_cocktail_summary(&drink);
        assert_eq!(instructions_line(&summary), "Stir.");
    }

    #[test]
    fn truncation_is_char_safe() {
        let text = "é".repeat(200);
        let out = truncate_with_ellipsis(&text, 10);
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with("..."));
        // Exactly at the limit is left alone
        assert_eq!(truncate_with_ellipsis(&"a".repeat(10), 10), "a".repeat(10));
    }

    #[test]
    fn truncation_never_exceeds_tiny_limits() {
        for limit in 0..=4 {
            let out = truncate_with_ellipsis("abcdef", limit);
            assert!(out.chars().count() <= limit, "limit {} gave {:?}", limit, out);
        }
        assert_eq!(truncate_with_ellipsis("abcdef", 2), "ab");
        assert_eq!(truncate_with_ellipsis("abcdef", 0), "");
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "...");
        assert_eq!(truncate_with_ellipsis("abcdef", 4), "a...");
    }

    #[test]
    fn details_list_compacted_ingredients() {
        let details = format_cocktail_details(&margarita());
        assert!(details.contains("ID: 11007"));
        assert!(details.contains("Name: Margarita"));
        assert!(details.contains("Tags: IBA,ContemporaryClassic"));
        assert!(details.contains("Glass: Cocktail glass"));
        assert!(details.contains("Alcoholic: Alcoholic"));
        assert!(details.contains(
            "Ingredients:\n- 1 1/2 oz Tequila\n- 1/2 oz Triple sec\n- 1 oz Lime juice\nImage URL:"
        ));
        assert!(details.contains(
            "Image URL: https://www.thecocktaildb.com/images/media/drink/5noda61589575158.jpg"
        ));
        assert!(details.contains("and not get into the drink. Shake the other ingredients"));
    }

    #[test]
    fn details_skip_sparse_slots() {
        let mut drink = margarita();
        drink.extra.insert("strIngredient2".into(), serde_json::Value::Null);
        drink
            .extra
            .insert("strIngredient9".into(), serde_json::json!("Salt"));
        drink
            .extra
            .insert("strMeasure9".into(), serde_json::json!("1 pinch"));

        let details = format_cocktail_details(&drink);
        assert!(!details.contains("Triple sec"));
        let tequila = details.find("- 1 1/2 oz Tequila").unwrap();
        let lime = details.find("- 1 oz Lime juice").unwrap();
        let salt = details.find("- 1 pinch Salt").unwrap();
        assert!(tequila < lime && lime < salt);
    }

    #[test]
    fn ingredient_form() {
        let formatted = format_ingredient(&vodka());
        assert!(formatted.contains("ID: 1"));
        assert!(formatted.contains("Name: Vodka"));
        assert!(formatted.contains("Type: Vodka"));
        assert!(formatted.contains("Alcoholic: Yes"));
        assert!(formatted.contains("ABV: 40%"));
        assert!(formatted.contains("Description: Vodka is a clear distilled alcoholic beverage"));
    }

    #[test]
    fn missing_fields_render_placeholder() {
        let formatted = format_ingredient(&Ingredient::default());
        assert!(formatted.contains("Name: N/A"));
        assert!(formatted.contains("ABV: N/A"));
    }
}
