use serde::Deserialize;

use crate::models::{MAX_RECIPE_RESULTS, RecipeSummary};

/// One element of the `findByIngredients` array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientMatch {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    #[serde(default)]
    pub used_ingredients: Vec<MatchedIngredient>,
    #[serde(default)]
    pub missed_ingredients: Vec<MatchedIngredient>,
}

#[derive(Debug, Deserialize)]
pub struct MatchedIngredient {
    pub name: Option<String>,
}

fn names(ingredients: Vec<MatchedIngredient>) -> Vec<String> {
    ingredients.into_iter().filter_map(|i| i.name).collect()
}

#[must_use]
pub fn match_to_summary(m: IngredientMatch) -> RecipeSummary {
    RecipeSummary {
        id: m.id,
        title: m.title,
        image: m.image.filter(|i| !i.is_empty()),
        used_ingredients: names(m.used_ingredients),
        missed_ingredients: names(m.missed_ingredients),
    }
}

/// Project a search response, capped at the result limit.
#[must_use]
pub fn matches_to_summaries(matches: Vec<IngredientMatch>) -> Vec<RecipeSummary> {
    matches
        .into_iter()
        .take(MAX_RECIPE_RESULTS)
        .map(match_to_summary)
        .collect()
}

/// Comma-join ingredient names for the `ingredients` query parameter.
///
/// The caller's HTTP client is responsible for URL-escaping the result.
#[must_use]
pub fn join_ingredients<S: AsRef<str>>(ingredients: &[S]) -> String {
    ingredients
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
