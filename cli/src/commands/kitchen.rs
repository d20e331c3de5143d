use std::path::Path;

use anyhow::{Context, Result};

use sous_core::service::{self, ChatModel, LabelDetector, RecipeCatalog};

use super::helpers::{print_ingredients_table, print_recipes_table, recipe_lines};

pub(crate) async fn cmd_ask<C: ChatModel>(chat: &C, message: &str, json: bool) -> Result<()> {
    let reply = service::ask(chat, Some(message)).await?;

    if json {
        println!("{}", serde_json::json!({ "reply": reply }));
    } else {
        println!("{reply}");
    }

    Ok(())
}

pub(crate) async fn cmd_search<R: RecipeCatalog>(
    catalog: &R,
    ingredients: &[String],
    json: bool,
) -> Result<()> {
    let recipes = service::find_by_ingredients(catalog, Some(ingredients)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
    } else if recipes.is_empty() {
        eprintln!("No recipes found for {}", ingredients.join(", "));
    } else {
        print_recipes_table(&recipes);
    }

    Ok(())
}

pub(crate) async fn cmd_recipe<R: RecipeCatalog>(catalog: &R, id: i64, json: bool) -> Result<()> {
    let recipe = service::recipe_detail(catalog, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        for line in recipe_lines(&recipe) {
            println!("{line}");
        }
    }

    Ok(())
}

pub(crate) async fn cmd_scan<U>(upstream: &U, image_path: &Path, json: bool) -> Result<()>
where
    U: LabelDetector + RecipeCatalog,
{
    let image = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    let analysis = service::analyze_ingredients(upstream, upstream, &image).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    if analysis.ingredients.is_empty() {
        eprintln!("No ingredients recognized in {}", image_path.display());
        return Ok(());
    }
    print_ingredients_table(&analysis.ingredients);

    if analysis.recipes.is_empty() {
        eprintln!("No recipe suggestions (is SPOONACULAR_API_KEY set?)");
    } else {
        println!();
        print_recipes_table(&analysis.recipes);
    }

    Ok(())
}
