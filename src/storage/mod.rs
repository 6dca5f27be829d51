pub mod store;

pub use store::create_redis_client;
pub use store::Storage;
pub use store::StorageWriterHandle;
pub use store::StoreKey;
