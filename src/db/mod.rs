pub mod db;
pub mod jobdb;
pub mod memorydb;
pub mod userdb;

pub use db::{DBClient, StoreError};
pub use jobdb::{JobExt, UpdatedJob};
pub use memorydb::MemoryStore;
pub use userdb::UserExt;

/// Everything the services need from persistence. Implemented by the
/// Postgres client and by the in-memory store.
pub trait MarketStore: UserExt + JobExt + std::fmt::Debug + Send + Sync {}

impl<T> MarketStore for T where T: UserExt + JobExt + std::fmt::Debug + Send + Sync {}
