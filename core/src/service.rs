use std::path::Path;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    FALLBACK_REPLY, Favorite, FavoriteInput, IngredientAnalysis, Label, MISSING_IMAGE,
    RecipeSummary, detect_ingredients, validate_ingredients, validate_message,
};

/// Image label detection.
///
/// Implementations return labels in the upstream's own ranking.
pub trait LabelDetector: Send + Sync {
    fn detect_labels(
        &self,
        image: &[u8],
    ) -> impl Future<Output = anyhow::Result<Vec<Label>>> + Send;
}

/// Ingredient-based recipe search and recipe information lookup.
pub trait RecipeCatalog: Send + Sync {
    /// Whether search is usable at all (e.g. a key is configured).
    fn is_available(&self) -> bool {
        true
    }

    fn find_by_ingredients(
        &self,
        ingredients: &[String],
    ) -> impl Future<Output = anyhow::Result<Vec<RecipeSummary>>> + Send;

    fn recipe_information(
        &self,
        recipe_id: i64,
    ) -> impl Future<Output = anyhow::Result<serde_json::Value>> + Send;
}

/// Single-turn text generation.
pub trait ChatModel: Send + Sync {
    /// First reply text, or `None` when the model produced nothing usable.
    fn generate(&self, message: &str)
    -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
}

pub struct FavoritesService {
    db: Database,
}

impl FavoritesService {
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> anyhow::Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    pub fn add(&self, input: FavoriteInput) -> Result<Favorite> {
        let fav = input.validate()?;
        Ok(self.db.insert_favorite(&fav)?)
    }

    pub fn list(&self, user_id: &str) -> Result<Vec<Favorite>> {
        Ok(self.db.list_favorites(user_id)?)
    }

    /// Remove every favorite for the pair. Removing nothing is not an error.
    pub fn remove(&self, user_id: &str, recipe_id: i64) -> Result<usize> {
        Ok(self.db.delete_favorites(user_id, recipe_id)?)
    }
}

/// Label an image, keep confident labels, then search recipes for them.
///
/// Runs strictly in sequence; any upstream failure aborts the whole analysis.
pub async fn analyze_ingredients<L, R>(
    detector: &L,
    catalog: &R,
    image: &[u8],
) -> Result<IngredientAnalysis>
where
    L: LabelDetector,
    R: RecipeCatalog,
{
    if image.is_empty() {
        return Err(Error::validation(MISSING_IMAGE));
    }

    let labels = detector.detect_labels(image).await?;
    let ingredients = detect_ingredients(&labels);

    let recipes = if !ingredients.is_empty() && catalog.is_available() {
        let names: Vec<String> = ingredients.iter().map(|i| i.name.clone()).collect();
        catalog.find_by_ingredients(&names).await?
    } else {
        Vec::new()
    };

    Ok(IngredientAnalysis {
        ingredients,
        recipes,
    })
}

pub async fn find_by_ingredients<R: RecipeCatalog>(
    catalog: &R,
    ingredients: Option<&[String]>,
) -> Result<Vec<RecipeSummary>> {
    let ingredients = validate_ingredients(ingredients)?;
    Ok(catalog.find_by_ingredients(ingredients).await?)
}

pub async fn recipe_detail<R: RecipeCatalog>(
    catalog: &R,
    recipe_id: i64,
) -> Result<serde_json::Value> {
    Ok(catalog.recipe_information(recipe_id).await?)
}

pub async fn ask<C: ChatModel>(chat: &C, message: Option<&str>) -> Result<String> {
    let message = validate_message(message)?;
    let reply = chat.generate(message).await?;
    Ok(reply.unwrap_or_else(|| FALLBACK_REPLY.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::anyhow;

    use crate::models::DetectedIngredient;

    #[derive(Default)]
    struct FakeUpstream {
        labels: Vec<Label>,
        fail_labels: bool,
        fail_search: bool,
        search_disabled: bool,
        reply: Option<String>,
        searched: Mutex<Vec<Vec<String>>>,
    }

    impl LabelDetector for FakeUpstream {
        async fn detect_labels(&self, _image: &[u8]) -> anyhow::Result<Vec<Label>> {
            if self.fail_labels {
                return Err(anyhow!("vision down"));
            }
            Ok(self.labels.clone())
        }
    }

    impl RecipeCatalog for FakeUpstream {
        fn is_available(&self) -> bool {
            !self.search_disabled
        }

        async fn find_by_ingredients(
            &self,
            ingredients: &[String],
        ) -> anyhow::Result<Vec<RecipeSummary>> {
            self.searched.lock().unwrap().push(ingredients.to_vec());
            if self.fail_search {
                return Err(anyhow!("search down"));
            }
            Ok((1..=7)
                .map(|id| RecipeSummary {
                    id,
                    title: format!("Recipe {id}"),
                    image: None,
                    used_ingredients: ingredients.to_vec(),
                    missed_ingredients: Vec::new(),
                })
                .take(crate::models::MAX_RECIPE_RESULTS)
                .collect())
        }

        async fn recipe_information(&self, recipe_id: i64) -> anyhow::Result<serde_json::Value> {
            Ok(serde_json::json!({ "id": recipe_id, "title": "Shakshuka" }))
        }
    }

    impl ChatModel for FakeUpstream {
        async fn generate(&self, _message: &str) -> anyhow::Result<Option<String>> {
            Ok(self.reply.clone())
        }
    }

    fn labels(pairs: &[(&str, f64)]) -> Vec<Label> {
        pairs
            .iter()
            .map(|(d, s)| Label {
                description: (*d).to_string(),
                score: *s,
            })
            .collect()
    }

    fn input(user: &str, recipe_id: i64) -> FavoriteInput {
        FavoriteInput {
            user_id: Some(user.to_string()),
            recipe_id: Some(recipe_id),
            title: Some("Lemon Risotto".to_string()),
            image: None,
            cook_time: Some(40),
            servings: Some(3),
        }
    }

    #[test]
    fn test_add_then_list() {
        let svc = FavoritesService::new_in_memory().unwrap();
        let added = svc.add(input("u1", 99)).unwrap();

        let list = svc.list("u1").unwrap();
        assert_eq!(list, vec![added.clone()]);
        assert_eq!(added.title, "Lemon Risotto");
        assert_eq!(added.cook_time, Some(40));
        assert_eq!(added.servings, Some(3));
    }

    #[test]
    fn test_add_invalid_creates_nothing() {
        let svc = FavoritesService::new_in_memory().unwrap();
        let mut bad = input("u1", 99);
        bad.title = None;

        assert!(svc.add(bad).unwrap_err().is_validation());
        assert!(svc.list("u1").unwrap().is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let svc = FavoritesService::new_in_memory().unwrap();
        svc.add(input("u1", 5)).unwrap();

        assert_eq!(svc.remove("u1", 5).unwrap(), 1);
        assert!(svc.list("u1").unwrap().is_empty());
        assert_eq!(svc.remove("u1", 5).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_analyze_filters_and_searches() {
        let up = FakeUpstream {
            labels: labels(&[("apple", 0.9), ("blur", 0.3)]),
            ..FakeUpstream::default()
        };

        let result = analyze_ingredients(&up, &up, b"jpeg").await.unwrap();
        assert_eq!(
            result.ingredients,
            vec![DetectedIngredient {
                name: "apple".to_string(),
                confidence: 90,
            }]
        );
        assert_eq!(result.recipes.len(), 5);
        assert_eq!(*up.searched.lock().unwrap(), vec![vec!["apple".to_string()]]);
    }

    #[tokio::test]
    async fn test_analyze_no_confident_labels_skips_search() {
        let up = FakeUpstream {
            labels: labels(&[("blur", 0.3), ("shadow", 0.5)]),
            ..FakeUpstream::default()
        };

        let result = analyze_ingredients(&up, &up, b"jpeg").await.unwrap();
        assert!(result.ingredients.is_empty());
        assert!(result.recipes.is_empty());
        assert!(up.searched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_search_unavailable() {
        let up = FakeUpstream {
            labels: labels(&[("carrot", 0.8)]),
            search_disabled: true,
            ..FakeUpstream::default()
        };

        let result = analyze_ingredients(&up, &up, b"jpeg").await.unwrap();
        assert_eq!(result.ingredients.len(), 1);
        assert!(result.recipes.is_empty());
        assert!(up.searched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_requires_image() {
        let up = FakeUpstream::default();
        let err = analyze_ingredients(&up, &up, &[]).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), MISSING_IMAGE);
    }

    #[tokio::test]
    async fn test_analyze_upstream_failures_abort() {
        let vision_down = FakeUpstream {
            fail_labels: true,
            ..FakeUpstream::default()
        };
        let err = analyze_ingredients(&vision_down, &vision_down, b"jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(vision_down.searched.lock().unwrap().is_empty());

        let search_down = FakeUpstream {
            labels: labels(&[("egg", 0.95)]),
            fail_search: true,
            ..FakeUpstream::default()
        };
        let err = analyze_ingredients(&search_down, &search_down, b"jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    /// Detector that decodes a raw annotate body like the HTTP client does.
    struct RawVisionBody(&'static str);

    impl LabelDetector for RawVisionBody {
        async fn detect_labels(&self, _image: &[u8]) -> anyhow::Result<Vec<Label>> {
            let resp: crate::vision::AnnotateResponse = serde_json::from_str(self.0)?;
            crate::vision::labels_from_response(resp)
        }
    }

    #[tokio::test]
    async fn test_analyze_malformed_vision_body_aborts() {
        let catalog = FakeUpstream::default();
        for body in ["{}", r#"{"unexpected":"shape"}"#] {
            let err = analyze_ingredients(&RawVisionBody(body), &catalog, b"jpeg")
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Upstream(_)), "body {body}");
        }
        assert!(catalog.searched.lock().unwrap().is_empty());

        let no_images = RawVisionBody(r#"{"responses":[]}"#);
        let result = analyze_ingredients(&no_images, &catalog, b"jpeg").await.unwrap();
        assert!(result.ingredients.is_empty());
        assert!(result.recipes.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_ingredients() {
        let up = FakeUpstream::default();
        assert!(
            find_by_ingredients(&up, Some(&[]))
                .await
                .unwrap_err()
                .is_validation()
        );
        assert!(find_by_ingredients(&up, None).await.unwrap_err().is_validation());

        let wanted = vec!["egg".to_string(), "milk".to_string()];
        let recipes = find_by_ingredients(&up, Some(&wanted)).await.unwrap();
        assert!(recipes.len() <= 5);
        assert!(recipes.iter().all(|r| !r.title.is_empty()));
    }

    #[tokio::test]
    async fn test_recipe_detail_passthrough() {
        let up = FakeUpstream::default();
        let recipe = recipe_detail(&up, 715_415).await.unwrap();
        assert_eq!(recipe["id"], 715_415);
        assert_eq!(recipe["title"], "Shakshuka");
    }

    #[tokio::test]
    async fn test_ask() {
        let up = FakeUpstream {
            reply: Some("Roast them.".to_string()),
            ..FakeUpstream::default()
        };
        assert_eq!(ask(&up, Some("beets?")).await.unwrap(), "Roast them.");
        assert!(ask(&up, Some("")).await.unwrap_err().is_validation());
        assert!(ask(&up, None).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_ask_falls_back_without_reply() {
        let up = FakeUpstream::default();
        assert_eq!(ask(&up, Some("hello")).await.unwrap(), FALLBACK_REPLY);
    }
}
