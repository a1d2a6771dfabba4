use crate::dto::{CreateItemDto, ItemDto, UpdateItemDto, filter_by_name};
use crate::{ApplicationError, ItemRepository};
use chrono::Utc;
use domain::{Item, ItemId};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Use cases for the items collection.
pub struct ItemService {
    repo: Arc<dyn ItemRepository>,
}

impl ItemService {
    pub fn new(repo: Arc<dyn ItemRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self, needle: Option<&str>) -> Result<Vec<ItemDto>, ApplicationError> {
        let items = self.repo.list().await?;
        let dtos = filter_by_name(items.iter().map(ItemDto::from).collect(), needle);
        info!(total = items.len(), returned = dtos.len(), "Retrieved items");
        Ok(dtos)
    }

    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn get_item(&self, id: &ItemId) -> Result<ItemDto, ApplicationError> {
        let item = self.find(id).await?;
        Ok(ItemDto::from(&item))
    }

    /// Validates the payload, assigns identity and creation time, and stores
    /// the new item.
    #[instrument(skip(self, request))]
    pub async fn create_item(&self, request: CreateItemDto) -> Result<ItemDto, ApplicationError> {
        let fields = request
            .into_fields()
            .inspect_err(|e| warn!("Item creation rejected: {}", e))?;
        let item = Item::create(fields, Utc::now());
        self.repo.insert(&item).await?;
        info!(item_id = %item.id(), "Item created");
        Ok(ItemDto::from(&item))
    }

    /// Replaces every mutable field of an existing item.
    #[instrument(skip(self, request), fields(item_id = %id))]
    pub async fn update_item(
        &self,
        id: &ItemId,
        request: UpdateItemDto,
    ) -> Result<(), ApplicationError> {
        let fields = request
            .into_fields()
            .inspect_err(|e| warn!("Item update rejected: {}", e))?;
        let mut item = self.find(id).await?;
        item.apply(fields);
        if !self.repo.replace(&item).await? {
            return Err(vanished(id));
        }
        info!("Item updated");
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn delete_item(&self, id: &ItemId) -> Result<(), ApplicationError> {
        let item = self.find(id).await?;
        if !self.repo.delete(&item).await? {
            return Err(vanished(id));
        }
        info!("Item deleted");
        Ok(())
    }

    async fn find(&self, id: &ItemId) -> Result<Item, ApplicationError> {
        self.repo.get(id).await?.ok_or_else(|| {
            warn!(item_id = %id, "Item not found");
            ApplicationError::NotFound(format!("Item '{}'", id))
        })
    }
}

/// The item was found but removed before the write landed.
fn vanished(id: &ItemId) -> ApplicationError {
    warn!(item_id = %id, "Item removed concurrently");
    ApplicationError::NotFound(format!("Item '{}'", id))
}
