use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::lessons;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = lessons)]
pub struct LessonEntity {
    pub id: Uuid,
    pub track_id: Uuid,
    pub lesson_number: i32,
    pub title: String,
    pub content: String,
    pub estimated_reading_time_minutes: i32,
    pub quiz_question: Option<String>,
    pub created_at: DateTime<Utc>,
}
