mod database;
pub use database::DbConnection;

pub mod entity;

mod error;
pub use error::{DatabaseError, DatabaseResult};

mod repo;
pub use repo::{CrudRepository, Page, PaginatableRepository};

pub mod sync;
pub use sync::{SyncedModel, derive_sync_uuid};

use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct ModelManager {
    database: DbConnection,
}

impl ModelManager {
    pub fn new(conn: DbConnection) -> Self {
        sync::register_syncing_models();
        Self { database: conn }
    }

    pub fn executor(&self) -> &SqlitePool {
        self.database.pool()
    }
}
