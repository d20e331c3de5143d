use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;

const DEFAULT_PORT: u16 = 5001;
const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") || v.eq_ignore_ascii_case("prod") => {
                Self::Production
            }
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Process configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
    pub bind: String,
    pub environment: Environment,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub vision_api_key: Option<String>,
    pub spoonacular_api_key: Option<String>,
    pub keepalive_url: Option<String>,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let db_path = match get("DATABASE_URL") {
            Some(url) => sqlite_path(&url)?,
            None => default_db_path()?,
        };

        let port = match get("PORT") {
            Some(p) => p
                .parse()
                .with_context(|| format!("Invalid PORT '{p}'. Use a number between 1 and 65535"))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            db_path,
            port,
            bind: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            environment: Environment::parse(get("APP_ENV").as_deref()),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            vision_api_key: get("GOOGLE_CLOUD_VISION_KEY"),
            spoonacular_api_key: get("SPOONACULAR_API_KEY"),
            keepalive_url: get("API_URL"),
        })
    }
}

/// Accept a bare path or a `sqlite://` URL. Any other scheme is an error.
fn sqlite_path(url: &str) -> Result<PathBuf> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        return Ok(PathBuf::from(path));
    }
    if let Some((scheme, _)) = url.split_once("://") {
        bail!(
            "Unsupported DATABASE_URL scheme '{scheme}://'. Use a file path or sqlite://<path>"
        );
    }
    Ok(PathBuf::from(url))
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs =
        ProjectDirs::from("", "", "sous").context("Could not determine home directory")?;
    Ok(proj_dirs.data_dir().join("sous.db"))
}
