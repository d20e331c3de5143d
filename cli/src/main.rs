mod commands;
mod config;
mod keepalive;
mod server;
mod upstream;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::{EnvFilter, fmt};

use crate::commands::{
    cmd_ask, cmd_favorites_add, cmd_favorites_list, cmd_favorites_remove, cmd_recipe, cmd_scan,
    cmd_search,
};
use crate::config::Config;
use crate::upstream::HttpUpstreams;
use sous_core::models::FavoriteInput;
use sous_core::service::FavoritesService;

#[derive(Parser)]
#[command(
    name = "sous",
    version,
    about = "Recipe assistant backend: favorites, ingredient scanning, recipe search and chat"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on (default: $PORT or 5001)
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind to (default: $BIND_ADDR or 127.0.0.1)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Manage saved favorite recipes
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },
    /// Ask the cooking assistant a question
    Ask {
        /// Message to send
        message: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find recipes that use the given ingredients
    Search {
        /// Ingredient names (e.g. egg milk flour)
        #[arg(required = true)]
        ingredients: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show full information for a recipe
    Recipe {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Detect ingredients in a photo and suggest recipes
    Scan {
        /// Path to the image file
        image: std::path::PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FavoritesCommands {
    /// Save a recipe as a favorite
    Add {
        /// User ID
        user: String,
        /// Recipe ID
        recipe_id: i64,
        /// Recipe title
        title: String,
        /// Image URL
        #[arg(long)]
        image: Option<String>,
        /// Cook time in minutes
        #[arg(long)]
        cook_time: Option<i64>,
        /// Number of servings
        #[arg(long)]
        servings: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List a user's favorites
    List {
        /// User ID
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a recipe from a user's favorites
    Remove {
        /// User ID
        user: String,
        /// Recipe ID
        recipe_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `default_filter`.
fn init_tracing(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    match cli.command {
        Commands::Serve { port, bind } => {
            init_tracing("info", config.environment.is_production());
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            server::start_server(&config).await
        }
        Commands::Favorites { command } => {
            init_tracing("warn", false);
            let favorites = FavoritesService::new(&config.db_path)?;
            match command {
                FavoritesCommands::Add {
                    user,
                    recipe_id,
                    title,
                    image,
                    cook_time,
                    servings,
                    json,
                } => {
                    let input = FavoriteInput {
                        user_id: Some(user),
                        recipe_id: Some(recipe_id),
                        title: Some(title),
                        image,
                        cook_time,
                        servings,
                    };
                    cmd_favorites_add(&favorites, input, json)
                }
                FavoritesCommands::List { user, json } => {
                    cmd_favorites_list(&favorites, &user, json)
                }
                FavoritesCommands::Remove {
                    user,
                    recipe_id,
                    json,
                } => cmd_favorites_remove(&favorites, &user, recipe_id, json),
            }
        }
        Commands::Ask { message, json } => {
            init_tracing("warn", false);
            let upstream = HttpUpstreams::from_config(&config)?;
            cmd_ask(&upstream, &message, json).await
        }
        Commands::Search { ingredients, json } => {
            init_tracing("warn", false);
            let upstream = HttpUpstreams::from_config(&config)?;
            cmd_search(&upstream, &ingredients, json).await
        }
        Commands::Recipe { id, json } => {
            init_tracing("warn", false);
            let upstream = HttpUpstreams::from_config(&config)?;
            cmd_recipe(&upstream, id, json).await
        }
        Commands::Scan { image, json } => {
            init_tracing("warn", false);
            let upstream = HttpUpstreams::from_config(&config)?;
            cmd_scan(&upstream, &image, json).await
        }
    }
}
