pub mod in_memory_repository;
pub mod mongo_repository;
pub mod records;

// Re-export both backing stores
pub use in_memory_repository::{InMemoryItemRepository, InMemoryPostRepository};
pub use mongo_repository::{
    ITEMS_COLLECTION, MongoItemRepository, MongoPostRepository, MongoHealthCheck, POSTS_COLLECTION, connect,
};
