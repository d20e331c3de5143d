use anyhow::{Context, Result};

use super::{ensure_success, require_key};
use sous_core::models::{MAX_RECIPE_RESULTS, RecipeSummary};
use sous_core::service::RecipeCatalog;
use sous_core::spoonacular::{IngredientMatch, join_ingredients, matches_to_summaries};

const FIND_BY_INGREDIENTS_URL: &str = "https://api.spoonacular.com/recipes/findByIngredients";
const RECIPES_URL: &str = "https://api.spoonacular.com/recipes";
const KEY_VAR: &str = "SPOONACULAR_API_KEY";

#[derive(Clone)]
pub struct SpoonacularClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl SpoonacularClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

impl RecipeCatalog for SpoonacularClient {
    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn find_by_ingredients(&self, ingredients: &[String]) -> Result<Vec<RecipeSummary>> {
        let key = require_key(self.api_key.as_deref(), KEY_VAR)?;
        let joined = join_ingredients(ingredients);
        let number = MAX_RECIPE_RESULTS.to_string();

        let resp = self
            .client
            .get(FIND_BY_INGREDIENTS_URL)
            .header("x-api-key", key)
            .query(&[("ingredients", joined.as_str()), ("number", number.as_str())])
            .send()
            .await
            .context("Failed to reach Spoonacular API")?;
        let resp = ensure_success(resp, "Spoonacular findByIngredients").await?;

        let matches: Vec<IngredientMatch> = resp
            .json()
            .await
            .context("Failed to parse Spoonacular search response")?;

        Ok(matches_to_summaries(matches))
    }

    async fn recipe_information(&self, recipe_id: i64) -> Result<serde_json::Value> {
        let key = require_key(self.api_key.as_deref(), KEY_VAR)?;
        let url = format!("{RECIPES_URL}/{recipe_id}/information");

        let resp = self
            .client
            .get(&url)
            .header("x-api-key", key)
            .query(&[("includeNutrition", "false")])
            .send()
            .await
            .context("Failed to reach Spoonacular API")?;
        let resp = ensure_success(resp, "Spoonacular information").await?;

        resp.json()
            .await
            .context("Failed to parse Spoonacular recipe information")
    }
}
