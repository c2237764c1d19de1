use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::learning_tracks;

/// Catalog data; never written by the application.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = learning_tracks)]
pub struct TrackEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub total_lessons: i32,
    pub duration_weeks: i32,
    pub created_at: DateTime<Utc>,
}
