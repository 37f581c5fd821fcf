use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::impl_paginatable_for;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

/// Download queue entry for a video. Listings are ordered by `(priority, youtube_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoFile {
    youtube_id: String,
    flagged_for_download: bool,
    download_in_progress: bool,
    priority: i64,
    percent_complete: i64,
}

impl VideoFile {
    pub fn youtube_id(&self) -> &str {
        &self.youtube_id
    }

    pub fn flagged_for_download(&self) -> bool {
        self.flagged_for_download
    }

    pub fn download_in_progress(&self) -> bool {
        self.download_in_progress
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn percent_complete(&self) -> i64 {
        self.percent_complete
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoFileCreate {
    pub youtube_id: String,
    pub flagged_for_download: bool,
    pub download_in_progress: bool,
    pub priority: i64,
    pub percent_complete: i64,
}

impl VideoFileCreate {
    pub fn new(youtube_id: impl Into<String>) -> Self {
        Self {
            youtube_id: youtube_id.into(),
            ..Default::default()
        }
    }
}

impl From<VideoFile> for VideoFileCreate {
    fn from(file: VideoFile) -> Self {
        Self {
            youtube_id: file.youtube_id,
            flagged_for_download: file.flagged_for_download,
            download_in_progress: file.download_in_progress,
            priority: file.priority,
            percent_complete: file.percent_complete,
        }
    }
}

#[async_trait]
impl CrudRepository<VideoFile, VideoFileCreate, String> for VideoFile {
    #[tracing::instrument(skip(mm))]
    async fn create(mm: &ModelManager, data: VideoFileCreate) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO video_files (youtube_id, flagged_for_download, download_in_progress, priority, percent_complete)
            VALUES (?, ?, ?, ?, ?)
            RETURNING youtube_id, flagged_for_download, download_in_progress, priority, percent_complete
            "#,
        )
        .bind(&data.youtube_id)
        .bind(data.flagged_for_download)
        .bind(data.download_in_progress)
        .bind(data.priority)
        .bind(data.percent_complete)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    /// The primary key is kept; `data.youtube_id` is ignored.
    async fn update(mut self, mm: &ModelManager, data: VideoFileCreate) -> DatabaseResult<Self> {
        sqlx::query(
            r#"
            UPDATE video_files
            SET flagged_for_download = ?, download_in_progress = ?, priority = ?, percent_complete = ?
            WHERE youtube_id = ?
            "#,
        )
        .bind(data.flagged_for_download)
        .bind(data.download_in_progress)
        .bind(data.priority)
        .bind(data.percent_complete)
        .bind(&self.youtube_id)
        .execute(mm.executor())
        .await?;

        self.flagged_for_download = data.flagged_for_download;
        self.download_in_progress = data.download_in_progress;
        self.priority = data.priority;
        self.percent_complete = data.percent_complete;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM video_files WHERE youtube_id = ?")
            .bind(&self.youtube_id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(mm: &ModelManager, youtube_id: String) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM video_files WHERE youtube_id = ?")
            .bind(youtube_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(mm: &ModelManager, limit: i64, offset: i64) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM video_files ORDER BY priority, youtube_id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_files")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(VideoFile, VideoFileCreate, String);

impl VideoFile {
    pub async fn list_flagged(mm: &ModelManager) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM video_files WHERE flagged_for_download = TRUE ORDER BY priority, youtube_id",
        )
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
