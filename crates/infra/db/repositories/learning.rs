use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, dsl::not, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            lesson_progress::InsertLessonProgressEntity,
            lessons::LessonEntity,
            tracks::TrackEntity,
            user_tracks::{InsertUserTrackEntity, UserTrackEntity},
        },
        repositories::learning::LearningRepository,
        value_objects::learning::{ActiveEnrollment, lesson_progress_percent},
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{learning_tracks, lessons, user_lesson_progress, user_tracks},
    },
};

pub struct LearningPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LearningPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LearningRepository for LearningPostgres {
    async fn list_tracks(&self) -> Result<Vec<TrackEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<TrackEntity>> {
            let mut conn = db_pool.get()?;

            let tracks = learning_tracks::table
                .order(learning_tracks::name.asc())
                .select(TrackEntity::as_select())
                .load::<TrackEntity>(&mut conn)?;

            Ok(tracks)
        })
        .await?
    }

    async fn list_active_enrollments(&self, user_id: Uuid) -> Result<Vec<ActiveEnrollment>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<ActiveEnrollment>> {
            let mut conn = db_pool.get()?;

            let rows = user_tracks::table
                .inner_join(learning_tracks::table)
                .filter(user_tracks::user_id.eq(user_id))
                .filter(user_tracks::is_active.eq(true))
                .order(user_tracks::started_at.asc())
                .select((UserTrackEntity::as_select(), TrackEntity::as_select()))
                .load::<(UserTrackEntity, TrackEntity)>(&mut conn)?;

            Ok(rows
                .into_iter()
                .map(|(user_track, track)| ActiveEnrollment { user_track, track })
                .collect())
        })
        .await?
    }

    async fn enroll_in_track(&self, user_id: Uuid, track_id: Uuid) -> Result<UserTrackEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<UserTrackEntity> {
            let mut conn = db_pool.get()?;

            let enrollment = InsertUserTrackEntity {
                user_id,
                track_id,
                progress: 0,
                is_active: true,
            };

            let saved = insert_into(user_tracks::table)
                .values(&enrollment)
                .on_conflict((user_tracks::user_id, user_tracks::track_id))
                .do_update()
                .set((
                    user_tracks::is_active.eq(true),
                    user_tracks::updated_at.eq(Utc::now()),
                ))
                .returning(UserTrackEntity::as_returning())
                .get_result::<UserTrackEntity>(&mut conn)?;

            Ok(saved)
        })
        .await?
    }

    async fn completed_lesson_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<Uuid>> {
            let mut conn = db_pool.get()?;

            let ids = user_lesson_progress::table
                .filter(user_lesson_progress::user_id.eq(user_id))
                .select(user_lesson_progress::lesson_id)
                .load::<Uuid>(&mut conn)?;

            Ok(ids)
        })
        .await?
    }

    async fn count_completed_in_track(&self, user_id: Uuid, track_id: Uuid) -> Result<i64> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<i64> {
            let mut conn = db_pool.get()?;

            let completed = user_lesson_progress::table
                .inner_join(lessons::table)
                .filter(user_lesson_progress::user_id.eq(user_id))
                .filter(lessons::track_id.eq(track_id))
                .count()
                .get_result::<i64>(&mut conn)?;

            Ok(completed)
        })
        .await?
    }

    async fn next_lesson(
        &self,
        track_id: Uuid,
        excluding: Vec<Uuid>,
    ) -> Result<Option<LessonEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<LessonEntity>> {
            let mut conn = db_pool.get()?;

            let lesson = lessons::table
                .filter(lessons::track_id.eq(track_id))
                .filter(not(lessons::id.eq_any(excluding)))
                .order(lessons::lesson_number.asc())
                .select(LessonEntity::as_select())
                .first::<LessonEntity>(&mut conn)
                .optional()?;

            Ok(lesson)
        })
        .await?
    }

    async fn record_lesson_completion(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        quiz_score: Option<i32>,
    ) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            conn.transaction::<_, anyhow::Error, _>(|conn| {
                let completion = InsertLessonProgressEntity {
                    user_id,
                    lesson_id,
                    completed_at: Utc::now(),
                    quiz_score,
                };

                let inserted = insert_into(user_lesson_progress::table)
                    .values(&completion)
                    .on_conflict((user_lesson_progress::user_id, user_lesson_progress::lesson_id))
                    .do_nothing()
                    .execute(conn)?;

                if inserted == 0 {
                    return Ok(false);
                }

                let (track_id, total_lessons) = lessons::table
                    .inner_join(learning_tracks::table)
                    .filter(lessons::id.eq(lesson_id))
                    .select((lessons::track_id, learning_tracks::total_lessons))
                    .first::<(Uuid, i32)>(conn)?;

                let completed = user_lesson_progress::table
                    .inner_join(lessons::table)
                    .filter(user_lesson_progress::user_id.eq(user_id))
                    .filter(lessons::track_id.eq(track_id))
                    .count()
                    .get_result::<i64>(conn)?;

                update(
                    user_tracks::table
                        .filter(user_tracks::user_id.eq(user_id))
                        .filter(user_tracks::track_id.eq(track_id)),
                )
                .set((
                    user_tracks::progress.eq(lesson_progress_percent(completed, total_lessons)),
                    user_tracks::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

                Ok(true)
            })
        })
        .await?
    }
}
