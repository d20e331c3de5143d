use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, Request, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, error, info, info_span, warn};

use crate::config::Config;
use crate::keepalive;
use crate::upstream::HttpUpstreams;
use sous_core::Error;
use sous_core::models::{
    DetectedIngredient, Favorite, FavoriteInput, MISSING_FAVORITE_FIELDS, MISSING_IMAGE,
    MISSING_INGREDIENTS, MISSING_MESSAGE, RecipeSummary,
};
use sous_core::service::{self, ChatModel, FavoritesService, LabelDetector, RecipeCatalog};

const BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

const STORE_FAILURE: &str = "Something went wrong";
const CHAT_FAILURE: &str = "Failed to get a reply from the assistant";
const ANALYZE_FAILURE: &str = "Failed to analyze image or fetch recipes";
const SEARCH_FAILURE: &str = "Failed to fetch recipes";
const DETAIL_FAILURE: &str = "Failed to fetch recipe details";

/// Everything the handlers need from the outside world.
pub trait Upstreams: LabelDetector + RecipeCatalog + ChatModel + 'static {}

impl<T> Upstreams for T where T: LabelDetector + RecipeCatalog + ChatModel + 'static {}

struct AppState<U> {
    favorites: Arc<Mutex<FavoritesService>>,
    upstream: Arc<U>,
}

impl<U> Clone for AppState<U> {
    fn clone(&self) -> Self {
        Self {
            favorites: Arc::clone(&self.favorites),
            upstream: Arc::clone(&self.upstream),
        }
    }
}

impl<U> AppState<U> {
    fn favorites(&self) -> MutexGuard<'_, FavoritesService> {
        self.favorites
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct ChatRequest {
    message: Option<String>,
}

#[derive(Deserialize)]
struct IngredientsRequest {
    ingredients: Option<Vec<String>>,
}

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    success: bool,
    ingredients: Vec<DetectedIngredient>,
    recipes: Vec<RecipeSummary>,
}

#[derive(Serialize)]
struct RecipesResponse {
    success: bool,
    recipes: Vec<RecipeSummary>,
}

#[derive(Serialize)]
struct RecipeDetailResponse {
    success: bool,
    recipe: serde_json::Value,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

// --- Error handling ---

enum ApiError {
    BadRequest(String),
    PayloadTooLarge,
    /// Upstream or store failure. `message` is what the caller sees.
    Upstream {
        message: &'static str,
        source: anyhow::Error,
    },
}

impl ApiError {
    fn from_core(err: Error, message: &'static str) -> Self {
        match err {
            Error::Validation(msg) => Self::BadRequest(msg),
            Error::Upstream(source) => Self::Upstream { message, source },
        }
    }

    /// Malformed JSON is reported with the endpoint's own validation message.
    fn from_json(rejection: &JsonRejection, message: &str) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        debug!(rejection = %rejection.body_text(), "rejected request body");
        Self::BadRequest(message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
            ),
            Self::Upstream { message, source } => {
                error!(error = %format!("{source:#}"), "{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };
        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    response
}

// --- Handlers ---

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { success: true })
}

async fn add_favorite<U: Upstreams>(
    State(state): State<AppState<U>>,
    payload: Result<Json<FavoriteInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    let Json(input) = payload.map_err(|r| ApiError::from_json(&r, MISSING_FAVORITE_FIELDS))?;

    let favorite = state
        .favorites()
        .add(input)
        .map_err(|e| ApiError::from_core(e, STORE_FAILURE))?;

    info!(
        id = favorite.id,
        user_id = %favorite.user_id,
        recipe_id = favorite.recipe_id,
        "favorite added"
    );
    Ok((StatusCode::CREATED, Json(favorite)))
}

async fn list_favorites<U: Upstreams>(
    State(state): State<AppState<U>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Favorite>>, ApiError> {
    let favorites = state
        .favorites()
        .list(&user_id)
        .map_err(|e| ApiError::from_core(e, STORE_FAILURE))?;
    Ok(Json(favorites))
}

async fn remove_favorite<U: Upstreams>(
    State(state): State<AppState<U>>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path((user_id, recipe_id)) =
        path.map_err(|_| ApiError::BadRequest("recipeId must be an integer".to_string()))?;

    let removed = state
        .favorites()
        .remove(&user_id, recipe_id)
        .map_err(|e| ApiError::from_core(e, STORE_FAILURE))?;

    info!(%user_id, recipe_id, removed, "favorite removed");
    Ok(Json(MessageResponse {
        message: "Favorite removed successfully",
    }))
}

async fn chatbot<U: Upstreams>(
    State(state): State<AppState<U>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|r| ApiError::from_json(&r, MISSING_MESSAGE))?;

    let reply = service::ask(state.upstream.as_ref(), req.message.as_deref())
        .await
        .map_err(|e| ApiError::from_core(e, CHAT_FAILURE))?;

    Ok(Json(ChatResponse { reply }))
}

async fn analyze_ingredients<U: Upstreams>(
    State(state): State<AppState<U>>,
    multipart: Result<Multipart, axum::extract::multipart::MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::BadRequest(MISSING_IMAGE.to_string()))?;

    // The upload only ever lives in this buffer; it drops with the request.
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(format!("Failed to read multipart field: {}", e.body_text()))
        }
    })? {
        if field.name() != Some("image") {
            continue;
        }
        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge
            } else {
                ApiError::BadRequest(format!("Failed to read image: {}", e.body_text()))
            }
        })?;
        image = Some(data);
    }

    let image = image.ok_or_else(|| ApiError::BadRequest(MISSING_IMAGE.to_string()))?;
    debug!(bytes = image.len(), "analyzing uploaded image");

    let upstream = state.upstream.as_ref();
    let analysis = service::analyze_ingredients(upstream, upstream, &image)
        .await
        .map_err(|e| ApiError::from_core(e, ANALYZE_FAILURE))?;

    info!(
        ingredients = analysis.ingredients.len(),
        recipes = analysis.recipes.len(),
        "image analyzed"
    );
    Ok(Json(AnalyzeResponse {
        success: true,
        ingredients: analysis.ingredients,
        recipes: analysis.recipes,
    }))
}

async fn recipes_by_ingredients<U: Upstreams>(
    State(state): State<AppState<U>>,
    payload: Result<Json<IngredientsRequest>, JsonRejection>,
) -> Result<Json<RecipesResponse>, ApiError> {
    let Json(req) = payload.map_err(|r| ApiError::from_json(&r, MISSING_INGREDIENTS))?;

    let recipes = service::find_by_ingredients(state.upstream.as_ref(), req.ingredients.as_deref())
        .await
        .map_err(|e| ApiError::from_core(e, SEARCH_FAILURE))?;

    Ok(Json(RecipesResponse {
        success: true,
        recipes,
    }))
}

async fn recipe_detail<U: Upstreams>(
    State(state): State<AppState<U>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<RecipeDetailResponse>, ApiError> {
    let Path(id) =
        path.map_err(|_| ApiError::BadRequest("Recipe id must be an integer".to_string()))?;

    let recipe = service::recipe_detail(state.upstream.as_ref(), id)
        .await
        .map_err(|e| ApiError::from_core(e, DETAIL_FAILURE))?;

    Ok(Json(RecipeDetailResponse {
        success: true,
        recipe,
    }))
}

// --- Router builder ---

fn build_router<U: Upstreams>(state: AppState<U>) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
            let uri = request.uri().path().to_string();
            info_span!("http_request", method = %request.method(), uri)
        });

    Router::new()
        .route("/api/health", get(health))
        .route("/api/favorites", post(add_favorite::<U>))
        .route("/api/favorites/{user_id}", get(list_favorites::<U>))
        .route("/api/favorites/{user_id}/{recipe_id}", delete(remove_favorite::<U>))
        .route("/api/chatbot", post(chatbot::<U>))
        .route("/api/analyze-ingredients", post(analyze_ingredients::<U>))
        .route("/api/recipes-by-ingredients", post(recipes_by_ingredients::<U>))
        .route("/api/recipe-detail/{id}", get(recipe_detail::<U>))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let favorites = FavoritesService::new(&config.db_path)?;
    let upstream = HttpUpstreams::from_config(config)?;

    if upstream.recipes.is_available() {
        info!("recipe search enabled");
    } else {
        warn!("SPOONACULAR_API_KEY not set; image analysis will return no recipes");
    }
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY not set; /api/chatbot will fail");
    }
    if config.vision_api_key.is_none() {
        warn!("GOOGLE_CLOUD_VISION_KEY not set; /api/analyze-ingredients will fail");
    }

    if let Some(url) = keepalive::target(config) {
        let _keepalive = keepalive::spawn(crate::upstream::http_client()?, url);
    }

    let state = AppState {
        favorites: Arc::new(Mutex::new(favorites)),
        upstream: Arc::new(upstream),
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        db = %config.db_path.display(),
        environment = ?config.environment,
        "server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
