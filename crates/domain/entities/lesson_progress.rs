use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::user_lesson_progress;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = user_lesson_progress)]
pub struct LessonProgressEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub quiz_score: Option<i32>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_lesson_progress)]
pub struct InsertLessonProgressEntity {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub quiz_score: Option<i32>,
}
