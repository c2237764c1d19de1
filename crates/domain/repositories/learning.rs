use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{lessons::LessonEntity, tracks::TrackEntity, user_tracks::UserTrackEntity},
    value_objects::learning::ActiveEnrollment,
};

#[async_trait]
#[automock]
pub trait LearningRepository {
    async fn list_tracks(&self) -> Result<Vec<TrackEntity>>;

    async fn list_active_enrollments(&self, user_id: Uuid) -> Result<Vec<ActiveEnrollment>>;

    /// Creates the enrollment or reactivates a soft-deactivated one.
    async fn enroll_in_track(&self, user_id: Uuid, track_id: Uuid) -> Result<UserTrackEntity>;

    async fn completed_lesson_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    async fn count_completed_in_track(&self, user_id: Uuid, track_id: Uuid) -> Result<i64>;

    /// Lowest `lesson_number` in the track whose id is not in `excluding`.
    async fn next_lesson(
        &self,
        track_id: Uuid,
        excluding: Vec<Uuid>,
    ) -> Result<Option<LessonEntity>>;

    /// Appends a completion record and refreshes the enrollment's progress. Returns `false`
    /// when the lesson was already completed.
    async fn record_lesson_completion(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        quiz_score: Option<i32>,
    ) -> Result<bool>;
}
