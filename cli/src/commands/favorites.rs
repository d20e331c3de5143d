use anyhow::Result;

use sous_core::models::FavoriteInput;
use sous_core::service::FavoritesService;

use super::helpers::print_favorites_table;

pub(crate) fn cmd_favorites_add(
    favorites: &FavoritesService,
    input: FavoriteInput,
    json: bool,
) -> Result<()> {
    let fav = favorites.add(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&fav)?);
    } else {
        println!(
            "Saved '{}' (recipe {}) for {} as favorite #{}",
            fav.title, fav.recipe_id, fav.user_id, fav.id
        );
    }

    Ok(())
}

pub(crate) fn cmd_favorites_list(
    favorites: &FavoritesService,
    user_id: &str,
    json: bool,
) -> Result<()> {
    let list = favorites.list(user_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else if list.is_empty() {
        eprintln!("No favorites for {user_id}. Use `sous favorites add` to save one.");
    } else {
        print_favorites_table(&list);
    }

    Ok(())
}

pub(crate) fn cmd_favorites_remove(
    favorites: &FavoritesService,
    user_id: &str,
    recipe_id: i64,
    json: bool,
) -> Result<()> {
    let removed = favorites.remove(user_id, recipe_id)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "message": "Favorite removed successfully", "removed": removed })
        );
    } else if removed == 0 {
        println!("Recipe {recipe_id} was not a favorite of {user_id}");
    } else {
        println!("Removed recipe {recipe_id} from {user_id}'s favorites");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(user: &str, recipe_id: i64) -> FavoriteInput {
        FavoriteInput {
            user_id: Some(user.to_string()),
            recipe_id: Some(recipe_id),
            title: Some("Mushroom Stroganoff".to_string()),
            cook_time: Some(30),
            ..FavoriteInput::default()
        }
    }

    #[test]
    fn test_add_list_remove() {
        let svc = FavoritesService::new_in_memory().unwrap();

        cmd_favorites_add(&svc, input("cli-user", 42), false).unwrap();
        cmd_favorites_list(&svc, "cli-user", true).unwrap();
        assert_eq!(svc.list("cli-user").unwrap().len(), 1);

        cmd_favorites_remove(&svc, "cli-user", 42, false).unwrap();
        assert!(svc.list("cli-user").unwrap().is_empty());

        // Removing again still succeeds.
        cmd_favorites_remove(&svc, "cli-user", 42, true).unwrap();
    }

    #[test]
    fn test_add_blank_title_fails() {
        let svc = FavoritesService::new_in_memory().unwrap();
        let mut bad = input("cli-user", 42);
        bad.title = Some("   ".to_string());

        let err = cmd_favorites_add(&svc, bad, false).unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields");
        assert!(svc.list("cli-user").unwrap().is_empty());
    }
}
