use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::user_tracks;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = user_tracks)]
pub struct UserTrackEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub track_id: Uuid,
    pub progress: i32,
    pub is_active: bool,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_tracks)]
pub struct InsertUserTrackEntity {
    pub user_id: Uuid,
    pub track_id: Uuid,
    pub progress: i32,
    pub is_active: bool,
}
