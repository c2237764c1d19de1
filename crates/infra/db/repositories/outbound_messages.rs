use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::outbound_messages::NewOutboundMessageEntity,
        repositories::outbound_messages::OutboundMessageRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::whatsapp_messages},
};

pub struct OutboundMessagePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OutboundMessagePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OutboundMessageRepository for OutboundMessagePostgres {
    async fn log_message(&self, message: NewOutboundMessageEntity) -> Result<Uuid> {
        let db_pool = Arc::clone(&self.db_pool);

        tokio::task::spawn_blocking(move || -> Result<Uuid> {
            let mut conn = db_pool.get()?;

            let message_id = insert_into(whatsapp_messages::table)
                .values(&message)
                .returning(whatsapp_messages::id)
                .get_result::<Uuid>(&mut conn)?;

            Ok(message_id)
        })
        .await?
    }
}
