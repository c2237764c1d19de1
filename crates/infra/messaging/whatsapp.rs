use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::domain::{
    repositories::messaging::OutboundChannel,
    value_objects::phone_numbers::to_channel_format,
};

const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
const GRAPH_API_VERSION: &str = "v18.0";

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub access_token: String,
    pub phone_number_id: String,
    pub base_url: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("whatsapp api rejected message: {0}")]
    Rejected(String),
    #[error("whatsapp api unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("whatsapp api returned no message id")]
    MissingMessageId,
}

#[derive(Debug, Serialize)]
struct TextMessageRequest<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: String,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    preview_url: bool,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct GraphErrorEnvelope {
    error: Option<GraphErrorDetails>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetails {
    message: Option<String>,
    code: Option<i64>,
    fbtrace_id: Option<String>,
}

/// WhatsApp Cloud API text sender.
pub struct WhatsAppClient {
    http: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppClient {
    pub fn new(config: WhatsAppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    fn messages_url(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_GRAPH_BASE_URL)
            .trim_end_matches('/');
        format!(
            "{base}/{GRAPH_API_VERSION}/{}/messages",
            self.config.phone_number_id
        )
    }

    pub async fn send_text_message(&self, to: &str, body: &str) -> Result<String, ChannelError> {
        let request = TextMessageRequest {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: to_channel_format(to),
            kind: "text",
            text: TextBody {
                preview_url: false,
                body,
            },
        };

        let resp = self
            .http
            .post(self.messages_url())
            .bearer_auth(&self.config.access_token)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let details = serde_json::from_str::<GraphErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error);
            let (code, message, trace_id) = match details {
                Some(d) => (d.code, d.message, d.fbtrace_id),
                None => (None, None, None),
            };

            error!(
                status = %status,
                whatsapp_error_code = ?code,
                whatsapp_error_message = ?message,
                fbtrace_id = ?trace_id,
                response_body = %body,
                "whatsapp api request failed"
            );

            return Err(ChannelError::Rejected(
                message.unwrap_or_else(|| format!("status {status}")),
            ));
        }

        let parsed: SendResponse = resp.json().await?;
        parsed
            .messages
            .into_iter()
            .next()
            .map(|message| message.id)
            .ok_or(ChannelError::MissingMessageId)
    }
}

#[async_trait]
impl OutboundChannel for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<String> {
        Ok(self.send_text_message(to, body).await?)
    }
}
