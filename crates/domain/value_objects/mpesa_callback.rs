use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct MpesaCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: MpesaCallbackBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MpesaCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode", deserialize_with = "deserialize_result_code")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<CallbackItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

/// Flattened view of a push-payment result. Metadata fields are optional because the provider
/// does not guarantee them on every callback variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackResult {
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub result_code: i64,
    pub result_desc: String,
    pub amount: Option<i64>,
    pub receipt_number: Option<String>,
    pub transaction_date: Option<String>,
    pub phone_number: Option<String>,
}

impl CallbackResult {
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }
}

impl From<StkCallback> for CallbackResult {
    fn from(callback: StkCallback) -> Self {
        let metadata = callback.callback_metadata.unwrap_or_default();
        let find = |name: &str| {
            metadata
                .items
                .iter()
                .find(|item| item.name == name)
                .and_then(|item| item.value.as_ref())
        };

        Self {
            amount: find("Amount").and_then(value_as_i64),
            receipt_number: find("MpesaReceiptNumber").and_then(value_as_string),
            transaction_date: find("TransactionDate").and_then(value_as_string),
            phone_number: find("PhoneNumber").and_then(value_as_string),
            merchant_request_id: callback.merchant_request_id,
            checkout_request_id: callback.checkout_request_id,
            result_code: callback.result_code,
            result_desc: callback.result_desc,
        }
    }
}

pub fn parse_callback(payload: &[u8]) -> Result<CallbackResult, serde_json::Error> {
    let envelope: MpesaCallbackEnvelope = serde_json::from_slice(payload)?;
    Ok(CallbackResult::from(envelope.body.stk_callback))
}

/// Body returned to the provider after handling a callback.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MpesaCallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i32,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl MpesaCallbackAck {
    pub fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted".to_string(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            result_code: 1,
            result_desc: reason.into(),
        }
    }
}

fn deserialize_result_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    value_as_i64(&raw).ok_or_else(|| serde::de::Error::custom("ResultCode must be numeric"))
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn success_payload() -> Value {
        json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            { "Name": "Amount", "Value": 150.00 },
                            { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
                            { "Name": "Balance" },
                            { "Name": "TransactionDate", "Value": 20191219102115u64 },
                            { "Name": "PhoneNumber", "Value": 254708374149u64 }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn success_callback_extracts_metadata() {
        let payload = serde_json::to_vec(&success_payload()).unwrap();
        let result = parse_callback(&payload).unwrap();

        assert!(result.is_success());
        assert_eq!(result.checkout_request_id, "ws_CO_191220191020363925");
        assert_eq!(result.amount, Some(150));
        assert_eq!(result.receipt_number.as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(result.transaction_date.as_deref(), Some("20191219102115"));
        assert_eq!(result.phone_number.as_deref(), Some("254708374149"));
    }

    #[test]
    fn missing_metadata_fields_become_none() {
        let payload = json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "m-1",
                    "CheckoutRequestID": "c-1",
                    "ResultCode": 0,
                    "ResultDesc": "ok",
                    "CallbackMetadata": { "Item": [ { "Name": "Amount", "Value": 50 } ] }
                }
            }
        });
        let result = parse_callback(&serde_json::to_vec(&payload).unwrap()).unwrap();

        assert_eq!(result.amount, Some(50));
        assert_eq!(result.receipt_number, None);
        assert_eq!(result.phone_number, None);
    }

    #[test]
    fn cancelled_callback_is_not_success() {
        let payload = json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "m-2",
                    "CheckoutRequestID": "c-2",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }
            }
        });
        let result = parse_callback(&serde_json::to_vec(&payload).unwrap()).unwrap();

        assert!(!result.is_success());
        assert_eq!(result.result_code, 1032);
        assert_eq!(result.amount, None);
    }

    #[test]
    fn string_result_code_is_accepted() {
        let payload = br#"{"Body":{"stkCallback":{"MerchantRequestID":"m","CheckoutRequestID":"c","ResultCode":"0","ResultDesc":"ok"}}}"#;
        assert!(parse_callback(payload).unwrap().is_success());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_callback(br#"{"Body":{}}"#).is_err());
        assert!(parse_callback(b"not json").is_err());
    }
}
