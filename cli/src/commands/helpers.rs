use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use sous_core::models::{DetectedIngredient, Favorite, RecipeSummary};

pub(crate) fn print_favorites_table(favorites: &[Favorite]) {
    #[derive(Tabled)]
    struct FavoriteRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Recipe")]
        recipe_id: i64,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Cook time")]
        cook_time: String,
        #[tabled(rename = "Servings")]
        servings: String,
        #[tabled(rename = "Saved")]
        created_at: String,
    }

    let rows: Vec<FavoriteRow> = favorites
        .iter()
        .map(|f| FavoriteRow {
            id: f.id,
            recipe_id: f.recipe_id,
            title: truncate(&f.title, 40),
            cook_time: f.cook_time.map_or("-".into(), |m| format!("{m} min")),
            servings: f.servings.map_or("-".into(), |s| s.to_string()),
            created_at: short_timestamp(&f.created_at),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_recipes_table(recipes: &[RecipeSummary]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Uses")]
        used: String,
        #[tabled(rename = "Missing")]
        missed: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.id,
            title: truncate(&r.title, 40),
            used: truncate(&r.used_ingredients.join(", "), 30),
            missed: truncate(&r.missed_ingredients.join(", "), 30),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

pub(crate) fn print_ingredients_table(ingredients: &[DetectedIngredient]) {
    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Confidence")]
        confidence: String,
    }

    let rows: Vec<IngredientRow> = ingredients
        .iter()
        .map(|i| IngredientRow {
            name: i.name.clone(),
            confidence: format!("{}%", i.confidence),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Human-readable lines for a full recipe information payload.
///
/// Only the fields worth showing in a terminal are read; anything missing
/// is skipped.
pub(crate) fn recipe_lines(recipe: &serde_json::Value) -> Vec<String> {
    let mut lines = Vec::new();

    let title = recipe["title"].as_str().unwrap_or("Untitled recipe");
    match recipe["id"].as_i64() {
        Some(id) => lines.push(format!("{title} (#{id})")),
        None => lines.push(title.to_string()),
    }

    let mut facts = Vec::new();
    if let Some(m) = recipe["readyInMinutes"].as_i64() {
        facts.push(format!("ready in {m} min"));
    }
    if let Some(s) = recipe["servings"].as_i64() {
        facts.push(format!("serves {s}"));
    }
    if !facts.is_empty() {
        lines.push(format!("  {}", facts.join(", ")));
    }

    if let Some(ingredients) = recipe["extendedIngredients"].as_array() {
        lines.push(String::new());
        lines.push("Ingredients:".to_string());
        for ing in ingredients {
            if let Some(text) = ing["original"].as_str().or_else(|| ing["name"].as_str()) {
                lines.push(format!("  - {text}"));
            }
        }
    }

    if let Some(url) = recipe["sourceUrl"].as_str().filter(|u| !u.is_empty()) {
        lines.push(String::new());
        lines.push(format!("Source: {url}"));
    }

    lines
}

/// `2025-03-01T18:22:05.123+01:00` → `2025-03-01 18:22`.
fn short_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map_or_else(|_| ts.to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        // Should not panic on multi-byte characters
        assert_eq!(truncate("Crème brûlée tart", 10), "Crème b...");
        assert_eq!(truncate("Pho bò", 10), "Pho bò");
        assert_eq!(truncate("親子丼と味噌汁の定食", 8), "親子丼と味...");
    }

    #[test]
    fn test_short_timestamp() {
        assert_eq!(
            short_timestamp("2025-03-01T18:22:05.123+01:00"),
            "2025-03-01 18:22"
        );
        assert_eq!(short_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_recipe_lines_full() {
        let recipe = serde_json::json!({
            "id": 716_429,
            "title": "Pasta with Garlic",
            "readyInMinutes": 45,
            "servings": 2,
            "sourceUrl": "https://example.com/pasta",
            "extendedIngredients": [
                {"name": "garlic", "original": "3 cloves garlic, minced"},
                {"name": "pasta"}
            ]
        });

        let lines = recipe_lines(&recipe);
        assert_eq!(lines[0], "Pasta with Garlic (#716429)");
        assert_eq!(lines[1], "  ready in 45 min, serves 2");
        assert!(lines.contains(&"  - 3 cloves garlic, minced".to_string()));
        assert!(lines.contains(&"  - pasta".to_string()));
        assert_eq!(lines.last().unwrap(), "Source: https://example.com/pasta");
    }

    #[test]
    fn test_recipe_lines_sparse() {
        let lines = recipe_lines(&serde_json::json!({}));
        assert_eq!(lines, vec!["Untitled recipe".to_string()]);
    }
}
