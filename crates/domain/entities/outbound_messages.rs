use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::whatsapp_messages;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = whatsapp_messages)]
pub struct OutboundMessageEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message_type: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub delivery_status: String,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = whatsapp_messages)]
pub struct NewOutboundMessageEntity {
    pub user_id: Uuid,
    pub message_type: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub delivery_status: String,
}
