use crate::config::{ApiConfig, StorageBackend};
use crate::{health, items, posts};
use application::{
    ApplicationError, ItemRepository, ItemService, PostRepository, PostService, StorageCheck,
};
use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use infrastructure::{
    InMemoryItemRepository, InMemoryPostRepository, MongoItemRepository, MongoPostRepository,
    MongoHealthCheck, connect,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub item_service: Arc<ItemService>,
    pub post_service: Arc<PostService>,
    /// Storage checks run by the readiness endpoint.
    pub health_checks: Vec<Arc<dyn StorageCheck>>,
}

impl AppState {
    pub fn new(items: Arc<dyn ItemRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self {
            item_service: Arc::new(ItemService::new(items)),
            post_service: Arc::new(PostService::new(posts)),
            health_checks: Vec::new(),
        }
    }

    pub fn with_health_check(mut self, check: Arc<dyn StorageCheck>) -> Self {
        self.health_checks.push(check);
        self
    }

    /// Volatile state over the seeded in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryItemRepository::new()),
            Arc::new(InMemoryPostRepository::new()),
        )
    }

    /// Wires the repository variant selected by `config`.
    pub async fn from_config(config: &ApiConfig) -> Result<Self, ApplicationError> {
        match config.storage_backend {
            StorageBackend::Memory => {
                info!("Using in-memory repositories");
                Ok(Self::in_memory())
            }
            StorageBackend::Mongodb => {
                info!(database = %config.mongodb_database, "Using document store repositories");
                let database = connect(&config.mongodb_uri, &config.mongodb_database).await?;
                Ok(Self::new(
                    Arc::new(MongoItemRepository::new(&database)),
                    Arc::new(MongoPostRepository::new(&database)),
                )
                .with_health_check(Arc::new(MongoHealthCheck::new(&database))))
            }
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Any origin, method and header may call the API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(health::live_handler))
        .route("/health/ready", get(health::ready_handler))
        // Item Endpoints
        .route(
            "/items",
            get(items::list_items_handler).post(items::create_item_handler),
        )
        .route(
            "/items/:id",
            get(items::get_item_handler)
                .put(items::update_item_handler)
                .delete(items::delete_item_handler),
        )
        // Post Endpoints
        .route(
            "/posts",
            get(posts::list_posts_handler).post(posts::create_post_handler),
        )
        .route(
            "/posts/:id",
            get(posts::get_post_handler)
                .put(posts::update_post_handler)
                .delete(posts::delete_post_handler),
        )
        // Comments are a sub-resource of their post
        .route(
            "/posts/:id/comments",
            get(posts::list_comments_handler).post(posts::add_comment_handler),
        )
        .route("/posts/:id/comments/:title", get(posts::get_comment_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}
