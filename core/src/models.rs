use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Labels scoring at or below this are treated as noise.
pub const MIN_LABEL_SCORE: f64 = 0.5;

/// Upper bound on recipes requested from (and returned by) ingredient search.
pub const MAX_RECIPE_RESULTS: usize = 5;

/// Upper bound on labels requested from label detection.
pub const MAX_LABEL_RESULTS: u32 = 10;

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't understand that.";

pub const MISSING_FAVORITE_FIELDS: &str = "Missing required fields";
pub const MISSING_MESSAGE: &str = "Message is required";
pub const MISSING_IMAGE: &str = "No image uploaded";
pub const MISSING_INGREDIENTS: &str = "Ingredients array is required";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: i64,
    pub user_id: String,
    pub recipe_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub cook_time: Option<i64>,
    pub servings: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub user_id: String,
    pub recipe_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub cook_time: Option<i64>,
    pub servings: Option<i64>,
}

/// Favorite as submitted by a client, before presence checks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteInput {
    pub user_id: Option<String>,
    pub recipe_id: Option<i64>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub cook_time: Option<i64>,
    pub servings: Option<i64>,
}

impl FavoriteInput {
    /// Require `userId`, `recipeId` and `title`. Blank strings and a zero
    /// recipe id count as missing.
    pub fn validate(self) -> Result<NewFavorite> {
        let user_id = self.user_id.filter(|s| !s.trim().is_empty());
        let recipe_id = self.recipe_id.filter(|&id| id != 0);
        let title = self.title.filter(|s| !s.trim().is_empty());
        match (user_id, recipe_id, title) {
            (Some(user_id), Some(recipe_id), Some(title)) => Ok(NewFavorite {
                user_id,
                recipe_id,
                title,
                image: self.image.filter(|s| !s.is_empty()),
                cook_time: self.cook_time,
                servings: self.servings,
            }),
            _ => Err(Error::validation(MISSING_FAVORITE_FIELDS)),
        }
    }
}

/// A raw label as ranked by the label-detection service.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedIngredient {
    pub name: String,
    pub confidence: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub used_ingredients: Vec<String>,
    pub missed_ingredients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientAnalysis {
    pub ingredients: Vec<DetectedIngredient>,
    pub recipes: Vec<RecipeSummary>,
}

/// Keep confident labels, in upstream order, as percentage-scored ingredients.
#[must_use]
pub fn detect_ingredients(labels: &[Label]) -> Vec<DetectedIngredient> {
    labels
        .iter()
        .filter(|l| l.score > MIN_LABEL_SCORE)
        .map(|l| DetectedIngredient {
            name: l.description.clone(),
            confidence: (l.score * 100.0).round() as i64,
        })
        .collect()
}

pub fn validate_message(message: Option<&str>) -> Result<&str> {
    match message {
        Some(m) if !m.trim().is_empty() => Ok(m),
        _ => Err(Error::validation(MISSING_MESSAGE)),
    }
}

/// Require at least one ingredient name that is not blank.
pub fn validate_ingredients(ingredients: Option<&[String]>) -> Result<&[String]> {
    match ingredients {
        Some(list) if list.iter().any(|s| !s.trim().is_empty()) => Ok(list),
        _ => Err(Error::validation(MISSING_INGREDIENTS)),
    }
}
