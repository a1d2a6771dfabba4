use crate::error::{body_rejection, map_application_error_to_response};
use crate::routes::AppState;
use application::{CreateCommentDto, CreatePostDto, NameFilter, UpdatePostDto};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use domain::PostId;
use tracing::{error, info};
use urlencoding::encode;

// --- Post Handlers ---

/// Handler for listing posts (GET /posts?match=...).
pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(filter): Query<NameFilter>,
) -> Response {
    info!(needle = ?filter.needle, "Received request to list posts");
    match state.post_service.list_posts(filter.needle.as_deref()).await {
        Ok(posts) => (StatusCode::OK, Json(posts)).into_response(),
        Err(e) => {
            error!("Failed to list posts via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

pub async fn get_post_handler(State(state): State<AppState>, Path(id): Path<PostId>) -> Response {
    info!(post_id = %id, "Received request to get post");
    match state.post_service.get_post(&id).await {
        Ok(post) => (StatusCode::OK, Json(post)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for creating a post, optionally with initial comments (POST /posts).
pub async fn create_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreatePostDto>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return map_application_error_to_response(body_rejection(rejection)),
    };
    info!("Received request to create post");
    match state.post_service.create_post(request).await {
        Ok(post) => {
            info!(post_id = %post.id, "Post created successfully via handler");
            let location = format!("/posts/{}", post.id);
            (StatusCode::CREATED, [(header::LOCATION, location)], Json(post)).into_response()
        }
        Err(e) => map_application_error_to_response(e),
    }
}

pub async fn update_post_handler(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    payload: Result<Json<UpdatePostDto>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return map_application_error_to_response(body_rejection(rejection)),
    };
    info!(post_id = %id, "Received request to update post");
    match state.post_service.update_post(&id, request).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Response {
    info!(post_id = %id, "Received request to delete post");
    match state.post_service.delete_post(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

// --- Comment Handlers ---

/// Handler for listing the comments of a post (GET /posts/:id/comments).
pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Response {
    info!(post_id = %id, "Received request to list comments");
    match state.post_service.list_comments(&id).await {
        Ok(comments) => (StatusCode::OK, Json(comments)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for finding a comment by exact title (GET /posts/:id/comments/:title).
pub async fn get_comment_handler(
    State(state): State<AppState>,
    Path((id, title)): Path<(PostId, String)>,
) -> Response {
    info!(post_id = %id, title = %title, "Received request to get comment");
    match state.post_service.get_comment(&id, &title).await {
        Ok(comment) => (StatusCode::OK, Json(comment)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Handler for appending a comment to a post (POST /posts/:id/comments).
/// The Location points at the get-by-title route of the new comment.
pub async fn add_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    payload: Result<Json<CreateCommentDto>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return map_application_error_to_response(body_rejection(rejection)),
    };
    info!(post_id = %id, "Received request to add comment");
    match state.post_service.add_comment(&id, request).await {
        Ok(comment) => {
            info!(comment_id = %comment.id, "Comment added successfully via handler");
            let location = format!("/posts/{}/comments/{}", id, encode(&comment.title));
            (StatusCode::CREATED, [(header::LOCATION, location)], Json(comment)).into_response()
        }
        Err(e) => map_application_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::{AppState, build_router};
    use application::{ApplicationError, CommentDto, PostDto, PostRepository};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use domain::{Post, PostId};
    use infrastructure::InMemoryItemRepository;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn app() -> Router {
        build_router(AppState::in_memory())
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Result<Request<Body>, axum::http::Error> {
        Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
    }

    fn empty_request(method: Method, uri: &str) -> Result<Request<Body>, axum::http::Error> {
        Request::builder().uri(uri).method(method).body(Body::empty())
    }

    async fn create_post(app: &Router, body: Value) -> Result<PostDto, Box<dyn std::error::Error>> {
        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/posts", body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        app: &Router,
        uri: &str,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let response = app.clone().oneshot(empty_request(Method::GET, uri)?).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn post_store_starts_empty() -> TestResult {
        let posts: Vec<PostDto> = get_json(&app(), "/posts").await?;
        assert!(posts.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn create_post_returns_location_and_stamps_comments() -> TestResult {
        let app = app();
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/posts",
                json!({
                    "title": "Post 1",
                    "content": "Hello",
                    "comments": [{ "title": "first", "content": "nice" }]
                }),
            )?)
            .await?;

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .ok_or("missing location header")?
            .to_str()?
            .to_string();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let created: PostDto = serde_json::from_slice(&bytes)?;

        assert_eq!(location, format!("/posts/{}", created.id));
        assert_eq!(created.comments.len(), 1);
        assert_eq!(created.comments[0].post_id, created.id);

        let fetched: PostDto = get_json(&app, &location).await?;
        assert_eq!(fetched, created);
        Ok(())
    }

    #[tokio::test]
    async fn list_posts_filters_by_title() -> TestResult {
        let app = app();
        for title in ["Post 1", "Post 2", "Post 3", "Post 4"] {
            create_post(&app, json!({ "title": title, "content": "body" })).await?;
        }

        let matching: Vec<PostDto> = get_json(&app, "/posts?match=Post%201").await?;
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].title, "Post 1");

        let all: Vec<PostDto> = get_json(&app, "/posts?match=post").await?;
        assert_eq!(all.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn create_post_without_title_is_400() -> TestResult {
        let response = app()
            .oneshot(json_request(Method::POST, "/posts", json!({ "content": "orphan" }))?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;
        assert_eq!(body["field"], "title");
        Ok(())
    }

    #[tokio::test]
    async fn update_then_delete_post() -> TestResult {
        let app = app();
        let created = create_post(
            &app,
            json!({ "title": "Draft", "comments": [{ "title": "old" }] }),
        )
        .await?;
        let uri = format!("/posts/{}", created.id);

        let response = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &uri,
                json!({ "title": "Final", "content": "done", "comments": [{ "title": "new" }] }),
            )?)
            .await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let updated: PostDto = get_json(&app, &uri).await?;
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.content, "done");
        assert_eq!(updated.created_date, created.created_date);
        assert_eq!(updated.comments.len(), 1);
        assert_eq!(updated.comments[0].title, "new");

        let response = app.clone().oneshot(empty_request(Method::DELETE, &uri)?).await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = app.oneshot(empty_request(Method::GET, &uri)?).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn update_unknown_post_is_404() -> TestResult {
        let uri = format!("/posts/{}", PostId::new());
        let response = app()
            .oneshot(json_request(Method::PUT, &uri, json!({ "title": "Ghost" }))?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn comments_are_added_listed_and_found_by_title() -> TestResult {
        let app = app();
        let post = create_post(&app, json!({ "title": "Hello" })).await?;
        let comments_uri = format!("/posts/{}/comments", post.id);

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &comments_uri,
                json!({ "title": "great post", "content": "agreed" }),
            )?)
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .ok_or("missing location header")?
            .to_str()?
            .to_string();
        assert_eq!(location, format!("{}/great%20post", comments_uri));
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let added: CommentDto = serde_json::from_slice(&bytes)?;
        assert_eq!(added.post_id, post.id);

        let listed: Vec<CommentDto> = get_json(&app, &comments_uri).await?;
        assert_eq!(listed, vec![added.clone()]);

        // The location resolves to the created comment
        let found: CommentDto = get_json(&app, &location).await?;
        assert_eq!(found, added);

        let response = app
            .oneshot(empty_request(Method::GET, &format!("{}/Great%20Post", comments_uri))?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn comments_of_unknown_post_are_404() -> TestResult {
        let app = app();
        let uri = format!("/posts/{}/comments", PostId::new());

        let response = app.clone().oneshot(empty_request(Method::GET, &uri)?).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(json_request(Method::POST, &uri, json!({ "title": "hi" }))?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    /// Store without the comment accessors.
    struct PostsOnlyRepository;

    #[async_trait]
    impl PostRepository for PostsOnlyRepository {
        async fn get(&self, _id: &PostId) -> Result<Option<Post>, ApplicationError> {
            Ok(None)
        }
        async fn list(&self) -> Result<Vec<Post>, ApplicationError> {
            Ok(Vec::new())
        }
        async fn insert(&self, _post: &Post) -> Result<(), ApplicationError> {
            Ok(())
        }
        async fn replace(&self, _post: &Post) -> Result<bool, ApplicationError> {
            Ok(false)
        }
        async fn delete(&self, _post: &Post) -> Result<bool, ApplicationError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn unsupported_comment_access_is_501() -> TestResult {
        let app = build_router(AppState::new(
            Arc::new(InMemoryItemRepository::new()),
            Arc::new(PostsOnlyRepository),
        ));
        let uri = format!("/posts/{}/comments", PostId::new());

        let response = app.oneshot(empty_request(Method::GET, &uri)?).await?;
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        Ok(())
    }

    #[tokio::test]
    async fn comment_location_encodes_reserved_characters() -> TestResult {
        let app = app();
        let post = create_post(&app, json!({ "title": "Hello" })).await?;

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/posts/{}/comments", post.id),
                json!({ "title": "why/how?" }),
            )?)
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .ok_or("missing location header")?
            .to_str()?
            .to_string();
        assert_eq!(
            location,
            format!("/posts/{}/comments/why%2Fhow%3F", post.id)
        );

        let found: CommentDto = get_json(&app, &location).await?;
        assert_eq!(found.title, "why/how?");
        Ok(())
    }
}
