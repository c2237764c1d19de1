use serde::Deserialize;

use crate::domain::value_objects::phone_numbers::normalize_phone_number;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhatsAppWebhookEnvelope {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<WebhookValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMessage {
    pub from: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<WebhookText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookText {
    #[serde(default)]
    pub body: Option<String>,
}

/// One inbound message, sender already in canonical `+254...` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub from: String,
    pub message_id: Option<String>,
    pub text: Option<String>,
}

impl WhatsAppWebhookEnvelope {
    /// Every message across all entries and changes, in delivery order. Status-only
    /// notifications carry no messages and yield nothing.
    pub fn inbound_messages(&self) -> Vec<InboundMessage> {
        self.entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .filter_map(|change| change.value.as_ref())
            .flat_map(|value| value.messages.iter())
            .map(|message| InboundMessage {
                from: normalize_phone_number(&message.from),
                message_id: message.id.clone(),
                text: message
                    .text
                    .as_ref()
                    .and_then(|text| text.body.clone())
                    .filter(|body| !body.trim().is_empty()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_text_messages_with_canonical_sender() {
        let envelope: WhatsAppWebhookEnvelope = serde_json::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1029384756",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "from": "254712345678",
                            "id": "wamid.HBgM",
                            "type": "text",
                            "text": { "body": "PROGRESS" }
                        }]
                    }
                }]
            }]
        }))
        .unwrap();

        let messages = envelope.inbound_messages();
        assert_eq!(
            messages,
            vec![InboundMessage {
                from: "+254712345678".to_string(),
                message_id: Some("wamid.HBgM".to_string()),
                text: Some("PROGRESS".to_string()),
            }]
        );
    }

    #[test]
    fn media_message_has_no_text() {
        let envelope: WhatsAppWebhookEnvelope = serde_json::from_value(json!({
            "entry": [{ "changes": [{ "value": { "messages": [{
                "from": "254712345678",
                "type": "image",
                "image": { "id": "media-1" }
            }]}}]}]
        }))
        .unwrap();

        let messages = envelope.inbound_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, None);
    }

    #[test]
    fn status_notifications_yield_no_messages() {
        let envelope: WhatsAppWebhookEnvelope = serde_json::from_value(json!({
            "entry": [{ "changes": [{ "value": { "statuses": [{ "id": "wamid.1", "status": "delivered" }] } }] }]
        }))
        .unwrap();

        assert!(envelope.inbound_messages().is_empty());
    }
}
