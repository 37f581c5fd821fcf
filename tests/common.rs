use kalog::model::entity::{FacilityUser, FacilityUserCreateUpdate};
use kalog::model::{CrudRepository, DbConnection, ModelManager};

/// `TestDatabase` is a fresh, migrated in-memory database. It disappears together with
/// its only connection when dropped.
pub struct TestDatabase {
    mm: ModelManager,
}

impl TestDatabase {
    pub fn mm(&self) -> &ModelManager {
        &self.mm
    }
}

pub async fn setup_test_db() -> TestDatabase {
    let _ = dotenvy::dotenv();

    let db = DbConnection::in_memory()
        .await
        .expect("Unable to open in-memory database");
    db.migrate().await.expect("Unable to apply migrations");

    TestDatabase {
        mm: ModelManager::new(db),
    }
}

#[allow(unused)]
pub async fn create_user(mm: &ModelManager, username: &str) -> FacilityUser {
    FacilityUser::create(
        mm,
        FacilityUserCreateUpdate {
            username: username.to_string(),
        },
    )
    .await
    .expect("Unable to create user")
}
