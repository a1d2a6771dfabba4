use application::{ApplicationError, ItemRepository, PostRepository};
use async_trait::async_trait;
use chrono::Utc;
use domain::{Comment, Item, ItemFields, ItemId, Post, PostId};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

// --- Item Repository Implementation ---

/// Volatile, list-backed item store. Keeps insertion order; lookups scan
/// linearly by identity. Clones share the same underlying list.
#[derive(Debug, Clone)]
pub struct InMemoryItemRepository {
    items: Arc<RwLock<Vec<Item>>>,
}

impl InMemoryItemRepository {
    /// Creates a store pre-seeded with the sample catalogue.
    pub fn new() -> Self {
        Self::with_items(sample_items())
    }

    pub fn empty() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }
}

impl Default for InMemoryItemRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn sample_items() -> Vec<Item> {
    let now = Utc::now();
    [("Potion", 9.0), ("Bronze Sword", 19.0), ("Silver Sword", 29.0)]
        .into_iter()
        .map(|(name, price)| {
            Item::create(
                ItemFields {
                    name: name.to_string(),
                    description: String::new(),
                    price,
                },
                now,
            )
        })
        .collect()
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    #[instrument(skip(self), fields(item_id = %id))]
    async fn get(&self, id: &ItemId) -> Result<Option<Item>, ApplicationError> {
        debug!("Getting item from in-memory store");
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id() == id).cloned())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Item>, ApplicationError> {
        debug!("Listing all items from in-memory store");
        Ok(self.items.read().await.clone())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id()))]
    async fn insert(&self, item: &Item) -> Result<(), ApplicationError> {
        debug!("Inserting item into in-memory store");
        self.items.write().await.push(item.clone());
        Ok(())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id()))]
    async fn replace(&self, item: &Item) -> Result<bool, ApplicationError> {
        debug!("Replacing item in in-memory store");
        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item.clone();
                Ok(true)
            }
            None => {
                warn!("Replace target not present in in-memory store");
                Ok(false)
            }
        }
    }

    #[instrument(skip(self, item), fields(item_id = %item.id()))]
    async fn delete(&self, item: &Item) -> Result<bool, ApplicationError> {
        debug!("Deleting item from in-memory store");
        let mut items = self.items.write().await;
        match items.iter().position(|existing| existing.id() == item.id()) {
            Some(index) => {
                items.remove(index);
                Ok(true)
            }
            None => {
                warn!("Delete target not present in in-memory store");
                Ok(false)
            }
        }
    }
}

// --- Post Repository Implementation ---

/// Volatile, list-backed post store. Comments live inside their post.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPostRepository {
    posts: Arc<RwLock<Vec<Post>>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Arc::new(RwLock::new(posts)),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    #[instrument(skip(self), fields(post_id = %id))]
    async fn get(&self, id: &PostId) -> Result<Option<Post>, ApplicationError> {
        debug!("Getting post from in-memory store");
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|post| post.id() == id).cloned())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Post>, ApplicationError> {
        debug!("Listing all posts from in-memory store");
        Ok(self.posts.read().await.clone())
    }

    #[instrument(skip(self, post), fields(post_id = %post.id()))]
    async fn insert(&self, post: &Post) -> Result<(), ApplicationError> {
        debug!("Inserting post into in-memory store");
        self.posts.write().await.push(post.clone());
        Ok(())
    }

    #[instrument(skip(self, post), fields(post_id = %post.id()))]
    async fn replace(&self, post: &Post) -> Result<bool, ApplicationError> {
        debug!("Replacing post in in-memory store");
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|existing| existing.id() == post.id()) {
            Some(slot) => {
                *slot = post.clone();
                Ok(true)
            }
            None => {
                warn!("Replace target not present in in-memory store");
                Ok(false)
            }
        }
    }

    #[instrument(skip(self, post), fields(post_id = %post.id()))]
    async fn delete(&self, post: &Post) -> Result<bool, ApplicationError> {
        debug!("Deleting post from in-memory store");
        let mut posts = self.posts.write().await;
        match posts.iter().position(|existing| existing.id() == post.id()) {
            Some(index) => {
                posts.remove(index);
                Ok(true)
            }
            None => {
                warn!("Delete target not present in in-memory store");
                Ok(false)
            }
        }
    }

    /// Find and push happen under one write guard.
    #[instrument(skip(self, comment), fields(post_id = %post_id))]
    async fn append_comment(
        &self,
        post_id: &PostId,
        comment: &Comment,
    ) -> Result<bool, ApplicationError> {
        debug!("Appending comment in in-memory store");
        let mut posts = self.posts.write().await;
        let Some(post) = posts.iter_mut().find(|post| post.id() == post_id) else {
            return Ok(false);
        };
        post.push_comment(comment.clone())?;
        Ok(true)
    }

    #[instrument(skip(self), fields(post_id = %post_id))]
    async fn comments_of(&self, post_id: &PostId) -> Result<Option<Vec<Comment>>, ApplicationError> {
        debug!("Reading comments from in-memory store");
        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .find(|post| post.id() == post_id)
            .map(|post| post.comments().to_vec()))
    }

    #[instrument(skip(self), fields(post_id = %post_id))]
    async fn comment_of(
        &self,
        post_id: &PostId,
        title: &str,
    ) -> Result<Option<Comment>, ApplicationError> {
        debug!("Looking up comment by title in in-memory store");
        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .find(|post| post.id() == post_id)
            .and_then(|post| post.find_comment(title).cloned()))
    }
}
