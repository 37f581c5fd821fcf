use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::impl_paginatable_for;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

/// Learner account that progress logs belong to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FacilityUser {
    id: Uuid,
    username: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FacilityUserCreateUpdate {
    pub username: String,
}

impl FacilityUser {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[async_trait]
impl CrudRepository<FacilityUser, FacilityUserCreateUpdate, Uuid> for FacilityUser {
    #[tracing::instrument(skip(mm))]
    async fn create(mm: &ModelManager, data: FacilityUserCreateUpdate) -> DatabaseResult<Self> {
        let user = sqlx::query_as(
            "INSERT INTO facility_users (id, username) VALUES (?, ?) RETURNING id, username",
        )
        .bind(Uuid::new_v4())
        .bind(&data.username)
        .fetch_one(mm.executor())
        .await?;

        Ok(user)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        data: FacilityUserCreateUpdate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE facility_users SET username = ? WHERE id = ?")
            .bind(&data.username)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.username = data.username;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM facility_users WHERE id = ?")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM facility_users WHERE id = ?")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(mm: &ModelManager, limit: i64, offset: i64) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM facility_users ORDER BY username LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM facility_users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(FacilityUser, FacilityUserCreateUpdate, Uuid);

impl FacilityUser {
    pub async fn find_by_username(
        mm: &ModelManager,
        username: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM facility_users WHERE username = ?")
            .bind(username)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}
