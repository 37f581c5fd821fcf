use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::impl_paginatable_for;
use crate::model::sync::{SyncedModel, derive_sync_uuid};
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

/// Attempts past which an unfinished exercise flags the learner as struggling.
pub const STRUGGLING_ATTEMPTS: i64 = 20;
/// Streak progress at which an exercise counts as mastered.
pub const MASTERY_STREAK: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStatus {
    InProgress,
    Struggling,
    Complete,
}

/// Fields of an exercise log that are derived on save rather than reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MasteryState {
    pub complete: bool,
    pub struggling: bool,
    pub attempts_before_completion: Option<i64>,
}

impl MasteryState {
    /// State after saving `streak_progress` and `attempts` on top of `self`.
    ///
    /// `struggling` is sticky, and the completion snapshot is taken once, on the
    /// first transition into `complete`. Dropping below mastery and recovering does
    /// not take a second snapshot; that difference from re-snapshotting on every
    /// transition is deliberate.
    pub fn next(self, streak_progress: i64, attempts: i64) -> Self {
        let struggling = self.struggling || (attempts > STRUGGLING_ATTEMPTS && !self.complete);
        let complete = streak_progress >= MASTERY_STREAK;

        let attempts_before_completion = match self.attempts_before_completion {
            None if complete && !self.complete => Some(attempts),
            snapshot => snapshot,
        };

        Self {
            complete,
            struggling,
            attempts_before_completion,
        }
    }

    pub fn status(&self) -> ExerciseStatus {
        if self.complete {
            ExerciseStatus::Complete
        } else if self.struggling {
            ExerciseStatus::Struggling
        } else {
            ExerciseStatus::InProgress
        }
    }
}

/// Mastery progress of one user on one exercise.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseLog {
    id: Uuid,
    user_id: Option<Uuid>,
    exercise_id: String,
    streak_progress: i64,
    attempts: i64,
    points: i64,
    complete: bool,
    struggling: bool,
    attempts_before_completion: Option<i64>,
    counter: i64,
}

impl ExerciseLog {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn exercise_id(&self) -> &str {
        &self.exercise_id
    }

    pub fn streak_progress(&self) -> i64 {
        self.streak_progress
    }

    pub fn attempts(&self) -> i64 {
        self.attempts
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    pub fn complete(&self) -> bool {
        self.complete
    }

    pub fn struggling(&self) -> bool {
        self.struggling
    }

    pub fn attempts_before_completion(&self) -> Option<i64> {
        self.attempts_before_completion
    }

    pub fn mastery(&self) -> MasteryState {
        MasteryState {
            complete: self.complete,
            struggling: self.struggling,
            attempts_before_completion: self.attempts_before_completion,
        }
    }

    pub fn status(&self) -> ExerciseStatus {
        self.mastery().status()
    }
}

impl SyncedModel for ExerciseLog {
    const MODEL_NAME: &'static str = "ExerciseLog";

    fn sync_id(&self) -> Uuid {
        self.id
    }

    fn counter(&self) -> i64 {
        self.counter
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseLogCreate {
    pub user_id: Option<Uuid>,
    pub exercise_id: String,
    pub streak_progress: i64,
    pub attempts: i64,
    pub points: i64,
}

impl ExerciseLogCreate {
    pub fn new(user_id: Option<Uuid>, exercise_id: impl Into<String>) -> Self {
        Self {
            user_id,
            exercise_id: exercise_id.into(),
            ..Default::default()
        }
    }

    pub fn sync_id(&self) -> Uuid {
        derive_sync_uuid(self.user_id, &self.exercise_id)
    }
}

#[async_trait]
impl CrudRepository<ExerciseLog, ExerciseLogCreate, Uuid> for ExerciseLog {
    #[tracing::instrument(skip(mm))]
    async fn create(mm: &ModelManager, data: ExerciseLogCreate) -> DatabaseResult<Self> {
        let mastery = MasteryState::default().next(data.streak_progress, data.attempts);

        let row = sqlx::query_as(
            r#"
            INSERT INTO exercise_logs (id, user_id, exercise_id, streak_progress, attempts, points,
                complete, struggling, attempts_before_completion, counter)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            RETURNING id, user_id, exercise_id, streak_progress, attempts, points,
                complete, struggling, attempts_before_completion, counter
            "#,
        )
        .bind(data.sync_id())
        .bind(data.user_id)
        .bind(&data.exercise_id)
        .bind(data.streak_progress)
        .bind(data.attempts)
        .bind(data.points)
        .bind(mastery.complete)
        .bind(mastery.struggling)
        .bind(mastery.attempts_before_completion)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    /// The owner and exercise make up the sync identity and are kept; `data.user_id` and
    /// `data.exercise_id` are ignored.
    #[tracing::instrument(skip(self, mm))]
    async fn update(mut self, mm: &ModelManager, data: ExerciseLogCreate) -> DatabaseResult<Self> {
        let before = self.mastery();
        let mastery = before.next(data.streak_progress, data.attempts);

        if mastery.struggling && !before.struggling {
            tracing::info!("learner flagged as struggling on {}", self.exercise_id);
        }
        if mastery.complete && !before.complete {
            tracing::info!("exercise {} mastered after {} attempts", self.exercise_id, data.attempts);
        }

        sqlx::query(
            r#"
            UPDATE exercise_logs
            SET streak_progress = ?, attempts = ?, points = ?,
                complete = ?, struggling = ?, attempts_before_completion = ?, counter = counter + 1
            WHERE id = ?
            "#,
        )
        .bind(data.streak_progress)
        .bind(data.attempts)
        .bind(data.points)
        .bind(mastery.complete)
        .bind(mastery.struggling)
        .bind(mastery.attempts_before_completion)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.streak_progress = data.streak_progress;
        self.attempts = data.attempts;
        self.points = data.points;
        self.complete = mastery.complete;
        self.struggling = mastery.struggling;
        self.attempts_before_completion = mastery.attempts_before_completion;
        self.counter += 1;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM exercise_logs WHERE id = ?")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM exercise_logs WHERE id = ?")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(mm: &ModelManager, limit: i64, offset: i64) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM exercise_logs LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercise_logs")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(ExerciseLog, ExerciseLogCreate, Uuid);

impl ExerciseLog {
    pub async fn find_for_user(
        mm: &ModelManager,
        user_id: Uuid,
        exercise_id: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM exercise_logs WHERE user_id = ? AND exercise_id = ?")
                .bind(user_id)
                .bind(exercise_id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result)
    }

    /// Writes `data` to the record carrying its sync identity, creating it on first use.
    #[tracing::instrument(skip(mm))]
    pub async fn save(mm: &ModelManager, data: ExerciseLogCreate) -> DatabaseResult<Self> {
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
        let result: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(points), 0) FROM exercise_logs WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn replay(saves: &[(i64, i64)]) -> MasteryState {
        saves
            .iter()
            .fold(MasteryState::default(), |state, (streak, attempts)| {
                state.next(*streak, *attempts)
            })
    }

    #[test]
    fn not_struggling_within_threshold() {
        for attempts in 0..=STRUGGLING_ATTEMPTS {
            assert!(!MasteryState::default().next(10, attempts).struggling);
            assert!(!MasteryState::default().next(100, attempts).struggling);
        }
    }

    #[test]
    fn struggling_past_threshold_while_incomplete() {
        let state = MasteryState::default().next(40, 21);
        assert!(state.struggling);
        assert!(!state.complete);
        assert_eq!(state.status(), ExerciseStatus::Struggling);
    }

    #[test]
    fn struggling_is_sticky() {
        let state = replay(&[(40, 21), (100, 25), (100, 30)]);
        assert!(state.struggling);
        assert!(state.complete);
        assert_eq!(state.status(), ExerciseStatus::Complete);
    }

    #[test]
    fn many_attempts_after_completion_not_struggling() {
        let state = replay(&[(100, 5), (100, 50)]);
        assert!(!state.struggling);
    }

    #[test]
    fn complete_tracks_streak_progress() {
        for streak in [-5, 0, 50, 99, 100, 101, 250] {
            let state = MasteryState::default().next(streak, 1);
            assert_eq!(state.complete, streak >= MASTERY_STREAK);
        }

        let dropped = replay(&[(100, 3), (80, 4)]);
        assert!(!dropped.complete);
    }

    #[test]
    fn snapshot_taken_on_first_completion() {
        let state = replay(&[(30, 4), (70, 8), (100, 11)]);
        assert_eq!(state.attempts_before_completion, Some(11));
    }

    #[test]
    fn snapshot_never_changes() {
        let state = replay(&[(100, 11), (100, 15), (60, 16), (100, 20)]);
        assert_eq!(state.attempts_before_completion, Some(11));
    }

    #[test]
    fn no_snapshot_while_incomplete() {
        let state = replay(&[(10, 1), (99, 30)]);
        assert_eq!(state.attempts_before_completion, None);
        assert_eq!(MasteryState::default().status(), ExerciseStatus::InProgress);
    }

    #[test]
    fn completion_on_first_save() {
        let state = MasteryState::default().next(100, 2);
        assert!(state.complete);
        assert_eq!(state.attempts_before_completion, Some(2));
    }
}
