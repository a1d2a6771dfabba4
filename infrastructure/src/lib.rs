// Module declarations
pub mod persistence;

// Re-export all implementations
pub use persistence::{
    InMemoryItemRepository, InMemoryPostRepository, MongoItemRepository, MongoPostRepository, MongoHealthCheck,
    connect,
};
