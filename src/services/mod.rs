pub mod accounts;
pub mod bootstrap;
pub mod credentials;
pub mod tasks;
mod memory_store;
mod redis_store;
mod store;

pub use credentials::CredentialService;
pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{RecordStore, TaskFilter, UserFilter};
