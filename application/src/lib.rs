use async_trait::async_trait;
use domain::{Comment, DomainError, Item, ItemId, Post, PostId};
use thiserror::Error;
use tracing::{debug, instrument};

pub mod dto;
pub mod items;
pub mod posts;

pub use dto::{
    CommentDto, CreateCommentDto, CreateItemDto, CreatePostDto, DisplayName, ItemDto, NameFilter,
    PostDto, UpdateItemDto, UpdatePostDto, filter_by_name,
};
pub use items::ItemService;
pub use posts::PostService;

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
    #[error("Operation not supported: {0}")]
    Unsupported(String),
    #[error("Storage operation '{operation}' failed: {source}")]
    Storage {
        operation: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Wraps a backing-store failure together with the operation that hit it.
    pub fn storage(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ApplicationError::Storage {
            operation: operation.into(),
            source: source.into(),
        }
    }
}

// --- Infrastructure Interfaces (Traits) ---

/// Storage operations the item use cases depend on.
///
/// `replace` and `delete` report whether a record with the same identity was
/// present; an absent record is left alone and yields `false`.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Retrieves an item by its identity. A missing item is `Ok(None)`.
    async fn get(&self, id: &ItemId) -> Result<Option<Item>, ApplicationError>;
    /// Lists every item in the store's natural order.
    async fn list(&self) -> Result<Vec<Item>, ApplicationError>;
    /// Adds a new item. The identity is already assigned.
    async fn insert(&self, item: &Item) -> Result<(), ApplicationError>;
    /// Fully overwrites the stored item with the same identity.
    async fn replace(&self, item: &Item) -> Result<bool, ApplicationError>;
    /// Removes the stored item with the same identity.
    async fn delete(&self, item: &Item) -> Result<bool, ApplicationError>;
}

/// Storage operations the post use cases depend on. Comments are embedded in
/// their post; the comment accessors read them through the owning post.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn get(&self, id: &PostId) -> Result<Option<Post>, ApplicationError>;
    async fn list(&self) -> Result<Vec<Post>, ApplicationError>;
    async fn insert(&self, post: &Post) -> Result<(), ApplicationError>;
    /// Same contract as [`ItemRepository::replace`].
    async fn replace(&self, post: &Post) -> Result<bool, ApplicationError>;
    async fn delete(&self, post: &Post) -> Result<bool, ApplicationError>;

    /// Appends `comment` to the end of the comment list of `post_id` as a
    /// single atomic write. `false` when the post does not exist.
    #[instrument(skip(self, _comment))]
    async fn append_comment(
        &self,
        post_id: &PostId,
        _comment: &Comment,
    ) -> Result<bool, ApplicationError> {
        debug!(post_id = %post_id, "Comment append not supported by this store");
        Err(ApplicationError::Unsupported(
            "appending a comment to a post".to_string(),
        ))
    }

    /// Comments of a post, or `None` when the post does not exist.
    /// Stores without comment support keep this default.
    #[instrument(skip(self))]
    async fn comments_of(&self, post_id: &PostId) -> Result<Option<Vec<Comment>>, ApplicationError> {
        debug!(post_id = %post_id, "Comment listing not supported by this store");
        Err(ApplicationError::Unsupported(
            "listing comments of a post".to_string(),
        ))
    }

    /// First comment of a post whose title equals `title` exactly.
    #[instrument(skip(self))]
    async fn comment_of(
        &self,
        post_id: &PostId,
        title: &str,
    ) -> Result<Option<Comment>, ApplicationError> {
        debug!(post_id = %post_id, "Comment lookup not supported by this store");
        Err(ApplicationError::Unsupported(
            "looking up a comment by title".to_string(),
        ))
    }
}

/// Connectivity check against a backing store, reported by readiness.
#[async_trait]
pub trait StorageCheck: Send + Sync {
    /// Name the check is reported under.
    fn name(&self) -> &str;
    async fn ping(&self) -> Result<(), ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_keeps_operation_and_source() {
        let err = ApplicationError::storage("insert item", "connection reset");
        assert_eq!(
            err.to_string(),
            "Storage operation 'insert item' failed: connection reset"
        );
    }
}
