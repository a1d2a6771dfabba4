use crate::error::{body_rejection, map_application_error_to_response};
use crate::routes::AppState;
use application::{CreateItemDto, NameFilter, UpdateItemDto};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use domain::ItemId;
use tracing::{error, info};

/// Handler for listing items (GET /items?match=...).
pub async fn list_items_handler(
    State(state): State<AppState>,
    Query(filter): Query<NameFilter>,
) -> Response {
    info!(needle = ?filter.needle, "Received request to list items");
    match state.item_service.list_items(filter.needle.as_deref()).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => {
            error!("Failed to list items via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Handler for getting one item (GET /items/:id).
pub async fn get_item_handler(State(state): State<AppState>, Path(id): Path<ItemId>) -> Response {
    info!(item_id = %id, "Received request to get item");
    match state.item_service.get_item(&id).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for creating an item (POST /items). Answers 201 with a Location
/// pointing at the new item.
pub async fn create_item_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateItemDto>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return map_application_error_to_response(body_rejection(rejection)),
    };
    info!("Received request to create item");
    match state.item_service.create_item(request).await {
        Ok(item) => {
            info!(item_id = %item.id, "Item created successfully via handler");
            let location = format!("/items/{}", item.id);
            (StatusCode::CREATED, [(header::LOCATION, location)], Json(item)).into_response()
        }
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for replacing an item (PUT /items/:id).
pub async fn update_item_handler(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    payload: Result<Json<UpdateItemDto>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return map_application_error_to_response(body_rejection(rejection)),
    };
    info!(item_id = %id, "Received request to update item");
    match state.item_service.update_item(&id, request).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for deleting an item (DELETE /items/:id).
pub async fn delete_item_handler(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Response {
    info!(item_id = %id, "Received request to delete item");
    match state.item_service.delete_item(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}
