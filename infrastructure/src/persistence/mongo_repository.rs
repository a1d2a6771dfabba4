use super::records::{CommentRecord, ItemRecord, PostRecord};
use application::{ApplicationError, ItemRepository, PostRepository, StorageCheck};
use async_trait::async_trait;
use domain::{Comment, Item, ItemId, Post, PostId};
use futures::TryStreamExt;
use mongodb::bson::{Document, doc, to_bson};
use mongodb::{Client, Collection, Database};
use std::fmt::Display;
use tracing::{debug, error, info, instrument, warn};

pub const ITEMS_COLLECTION: &str = "items";
pub const POSTS_COLLECTION: &str = "posts";

/// Builds a client for `uri` and returns the handle of `database`.
/// The driver connects lazily; no round trip happens here.
#[instrument(skip(uri))]
pub async fn connect(uri: &str, database: &str) -> Result<Database, ApplicationError> {
    let client = Client::with_uri_str(uri).await.map_err(|e| {
        error!("Failed to create document store client: {}", e);
        ApplicationError::storage("connect", e)
    })?;
    info!("Document store client created");
    Ok(client.database(database))
}

/// Readiness check that pings the document store.
#[derive(Debug, Clone)]
pub struct MongoHealthCheck {
    database: Database,
}

impl MongoHealthCheck {
    pub fn new(database: &Database) -> Self {
        Self {
            database: database.clone(),
        }
    }
}

#[async_trait]
impl StorageCheck for MongoHealthCheck {
    fn name(&self) -> &str {
        "mongodb"
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), ApplicationError> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(storage_error("ping"))?;
        debug!("Document store answered ping");
        Ok(())
    }
}

/// Matches the document whose text `_id` equals `id`.
fn id_filter(id: impl Display) -> Document {
    doc! { "_id": id.to_string() }
}

/// Matches post `post_id` only when one of its embedded comments has
/// exactly `title`.
fn comment_filter(post_id: &PostId, title: &str) -> Document {
    let mut filter = id_filter(post_id);
    filter.insert("comments.title", title);
    filter
}

/// `$push` update appending `comment` to the embedded comment list.
fn push_comment_update(comment: &Comment) -> Result<Document, ApplicationError> {
    let record = to_bson(&CommentRecord::from(comment)).map_err(|e| {
        error!("Comment could not be encoded: {}", e);
        ApplicationError::storage("encode comment", e)
    })?;
    Ok(doc! { "$push": { "comments": record } })
}

fn storage_error(operation: &'static str) -> impl FnOnce(mongodb::error::Error) -> ApplicationError {
    move |e| {
        error!("Document store operation '{}' failed: {}", operation, e);
        ApplicationError::storage(operation, e)
    }
}

// --- Item Repository Implementation ---

/// Item store backed by the `items` collection.
#[derive(Debug, Clone)]
pub struct MongoItemRepository {
    collection: Collection<ItemRecord>,
}

impl MongoItemRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(ITEMS_COLLECTION),
        }
    }
}

fn decode_item(record: ItemRecord) -> Result<Item, ApplicationError> {
    Item::try_from(record).map_err(|e| {
        error!("Stored item could not be decoded: {}", e);
        ApplicationError::storage("decode item", e)
    })
}

#[async_trait]
impl ItemRepository for MongoItemRepository {
    #[instrument(skip(self), fields(item_id = %id))]
    async fn get(&self, id: &ItemId) -> Result<Option<Item>, ApplicationError> {
        debug!("Finding item document");
        self.collection
            .find_one(id_filter(id), None)
            .await
            .map_err(storage_error("find item"))?
            .map(decode_item)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Item>, ApplicationError> {
        debug!("Listing item documents");
        let records: Vec<ItemRecord> = self
            .collection
            .find(doc! {}, None)
            .await
            .map_err(storage_error("list items"))?
            .try_collect()
            .await
            .map_err(storage_error("list items"))?;
        records.into_iter().map(decode_item).collect()
    }

    #[instrument(skip(self, item), fields(item_id = %item.id()))]
    async fn insert(&self, item: &Item) -> Result<(), ApplicationError> {
        debug!("Inserting item document");
        self.collection
            .insert_one(ItemRecord::from(item), None)
            .await
            .map_err(storage_error("insert item"))?;
        Ok(())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id()))]
    async fn replace(&self, item: &Item) -> Result<bool, ApplicationError> {
        debug!("Replacing item document");
        let result = self
            .collection
            .replace_one(id_filter(item.id()), ItemRecord::from(item), None)
            .await
            .map_err(storage_error("replace item"))?;
        if result.matched_count == 0 {
            warn!("Replace target not present in document store");
        }
        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self, item), fields(item_id = %item.id()))]
    async fn delete(&self, item: &Item) -> Result<bool, ApplicationError> {
        debug!("Deleting item document");
        let result = self
            .collection
            .delete_one(id_filter(item.id()), None)
            .await
            .map_err(storage_error("delete item"))?;
        if result.deleted_count == 0 {
            warn!("Delete target not present in document store");
        }
        Ok(result.deleted_count > 0)
    }
}

// --- Post Repository Implementation ---

/// Post store backed by the `posts` collection. Comments are embedded in
/// each post document.
#[derive(Debug, Clone)]
pub struct MongoPostRepository {
    collection: Collection<PostRecord>,
}

impl MongoPostRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(POSTS_COLLECTION),
        }
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Post>, ApplicationError> {
        self.collection
            .find_one(filter, None)
            .await
            .map_err(storage_error("find post"))?
            .map(decode_post)
            .transpose()
    }
}

fn decode_post(record: PostRecord) -> Result<Post, ApplicationError> {
    Post::try_from(record).map_err(|e| {
        error!("Stored post could not be decoded: {}", e);
        ApplicationError::storage("decode post", e)
    })
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    #[instrument(skip(self), fields(post_id = %id))]
    async fn get(&self, id: &PostId) -> Result<Option<Post>, ApplicationError> {
        debug!("Finding post document");
        self.find_one(id_filter(id)).await
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Post>, ApplicationError> {
        debug!("Listing post documents");
        let records: Vec<PostRecord> = self
            .collection
            .find(doc! {}, None)
            .await
            .map_err(storage_error("list posts"))?
            .try_collect()
            .await
            .map_err(storage_error("list posts"))?;
        records.into_iter().map(decode_post).collect()
    }

    #[instrument(skip(self, post), fields(post_id = %post.id()))]
    async fn insert(&self, post: &Post) -> Result<(), ApplicationError> {
        debug!("Inserting post document");
        self.collection
            .insert_one(PostRecord::from(post), None)
            .await
            .map_err(storage_error("insert post"))?;
        Ok(())
    }

    #[instrument(skip(self, post), fields(post_id = %post.id()))]
    async fn replace(&self, post: &Post) -> Result<bool, ApplicationError> {
        debug!("Replacing post document");
        let result = self
            .collection
            .replace_one(id_filter(post.id()), PostRecord::from(post), None)
            .await
            .map_err(storage_error("replace post"))?;
        if result.matched_count == 0 {
            warn!("Replace target not present in document store");
        }
        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self, post), fields(post_id = %post.id()))]
    async fn delete(&self, post: &Post) -> Result<bool, ApplicationError> {
        debug!("Deleting post document");
        let result = self
            .collection
            .delete_one(id_filter(post.id()), None)
            .await
            .map_err(storage_error("delete post"))?;
        if result.deleted_count == 0 {
            warn!("Delete target not present in document store");
        }
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self, comment), fields(post_id = %post_id))]
    async fn append_comment(
        &self,
        post_id: &PostId,
        comment: &Comment,
    ) -> Result<bool, ApplicationError> {
        debug!("Pushing embedded comment");
        let result = self
            .collection
            .update_one(id_filter(post_id), push_comment_update(comment)?, None)
            .await
            .map_err(storage_error("append comment"))?;
        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self), fields(post_id = %post_id))]
    async fn comments_of(&self, post_id: &PostId) -> Result<Option<Vec<Comment>>, ApplicationError> {
        debug!("Reading embedded comments");
        let post = self.find_one(id_filter(post_id)).await?;
        Ok(post.map(|post| post.comments().to_vec()))
    }

    #[instrument(skip(self), fields(post_id = %post_id))]
    async fn comment_of(
        &self,
        post_id: &PostId,
        title: &str,
    ) -> Result<Option<Comment>, ApplicationError> {
        debug!("Matching embedded comment by title");
        let post = self.find_one(comment_filter(post_id, title)).await?;
        Ok(post.and_then(|post| post.find_comment(title).cloned()))
    }
}
