mod error;
mod schema;
mod sqlite_store;
mod trait_def;

pub use error::{StoreError, StoreResult};
pub use sqlite_store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
