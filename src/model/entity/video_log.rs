use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::impl_paginatable_for;
use crate::model::sync::{SyncedModel, derive_sync_uuid};
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

/// Watch progress of one user on one video.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoLog {
    id: Uuid,
    user_id: Option<Uuid>,
    youtube_id: String,
    total_seconds_watched: i64,
    points: i64,
    complete: bool,
    counter: i64,
}

impl VideoLog {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn youtube_id(&self) -> &str {
        &self.youtube_id
    }

    pub fn total_seconds_watched(&self) -> i64 {
        self.total_seconds_watched
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    pub fn complete(&self) -> bool {
        self.complete
    }
}

impl SyncedModel for VideoLog {
    const MODEL_NAME: &'static str = "VideoLog";

    fn sync_id(&self) -> Uuid {
        self.id
    }

    fn counter(&self) -> i64 {
        self.counter
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoLogCreate {
    pub user_id: Option<Uuid>,
    pub youtube_id: String,
    pub total_seconds_watched: i64,
    pub points: i64,
    pub complete: bool,
}

impl VideoLogCreate {
    pub fn new(user_id: Option<Uuid>, youtube_id: impl Into<String>) -> Self {
        Self {
            user_id,
            youtube_id: youtube_id.into(),
            ..Default::default()
        }
    }

    pub fn sync_id(&self) -> Uuid {
        derive_sync_uuid(self.user_id, &self.youtube_id)
    }
}

#[async_trait]
impl CrudRepository<VideoLog, VideoLogCreate, Uuid> for VideoLog {
    #[tracing::instrument(skip(mm))]
    async fn create(mm: &ModelManager, data: VideoLogCreate) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO video_logs (id, user_id, youtube_id, total_seconds_watched, points, complete, counter)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            RETURNING id, user_id, youtube_id, total_seconds_watched, points, complete, counter
            "#,
        )
        .bind(data.sync_id())
        .bind(data.user_id)
        .bind(&data.youtube_id)
        .bind(data.total_seconds_watched)
        .bind(data.points)
        .bind(data.complete)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    /// The owner and video make up the sync identity and are kept; `data.user_id` and
    /// `data.youtube_id` are ignored.
    #[tracing::instrument(skip(self, mm))]
    async fn update(mut self, mm: &ModelManager, data: VideoLogCreate) -> DatabaseResult<Self> {
        sqlx::query(
            r#"
            UPDATE video_logs
            SET total_seconds_watched = ?, points = ?, complete = ?, counter = counter + 1
            WHERE id = ?
            "#,
        )
        .bind(data.total_seconds_watched)
        .bind(data.points)
        .bind(data.complete)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.total_seconds_watched = data.total_seconds_watched;
        self.points = data.points;
        self.complete = data.complete;
        self.counter += 1;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM video_logs WHERE id = ?")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM video_logs WHERE id = ?")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(mm: &ModelManager, limit: i64, offset: i64) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM video_logs LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_logs")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(VideoLog, VideoLogCreate, Uuid);

impl VideoLog {
    pub async fn find_for_user(
        mm: &ModelManager,
        user_id: Uuid,
        youtube_id: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM video_logs WHERE user_id = ? AND youtube_id = ?")
            .bind(user_id)
            .bind(youtube_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Writes `data` to the record carrying its sync identity, creating it on first use.
    #[tracing::instrument(skip(mm))]
    pub async fn save(mm: &ModelManager, data: VideoLogCreate) -> DatabaseResult<Self> {
        let existing = match data.user_id {
            Some(_) => Self::find_by_id(mm, data.sync_id()).await?,
            None => None,
        };

        match existing {
            Some(log) => log.update(mm, data).await,
            None => Self::create(mm, data).await,
        }
    }

    pub async fn get_points_for_user(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(points), 0) FROM video_logs WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(mm.executor())
                .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn create_data_sync_id_is_stable() {
        let user = Uuid::new_v4();
        let a = VideoLogCreate::new(Some(user), "dQw4w9WgXcQ");
        let b = VideoLogCreate {
            points: 750,
            complete: true,
            ..VideoLogCreate::new(Some(user), "dQw4w9WgXcQ")
        };
        assert_eq!(a.sync_id(), b.sync_id());
        assert_eq!(a.sync_id(), derive_sync_uuid(Some(user), "dQw4w9WgXcQ"));
    }

    #[test]
    fn create_data_defaults() {
        let data = VideoLogCreate::new(None, "abc");
        assert_eq!(data.total_seconds_watched, 0);
        assert_eq!(data.points, 0);
        assert!(!data.complete);
    }
}
