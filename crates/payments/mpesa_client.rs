use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::value_objects::phone_numbers::to_provider_format;

const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";
const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MpesaEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl MpesaEnvironment {
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "live" => MpesaEnvironment::Production,
            _ => MpesaEnvironment::Sandbox,
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            MpesaEnvironment::Sandbox => SANDBOX_BASE_URL,
            MpesaEnvironment::Production => PRODUCTION_BASE_URL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub environment: MpesaEnvironment,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    pub callback_url: String,
    /// Overrides the environment's host, e.g. a local mock server.
    pub base_url: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("access token request rejected: {0}")]
    Auth(String),
    #[error("push request rejected: {0}")]
    Rejected(String),
    #[error("gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected gateway response: {0}")]
    Decode(String),
}

/// Result of a push request. Gateway failures are carried in `error` instead of being returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushOutcome {
    pub success: bool,
    pub checkout_request_id: Option<String>,
    pub merchant_request_id: Option<String>,
    pub response_code: Option<String>,
    pub response_description: Option<String>,
    pub customer_message: Option<String>,
    pub error: Option<String>,
}

impl PushOutcome {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusQueryResult {
    pub result_code: Option<String>,
    pub result_desc: Option<String>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(rename = "requestId")]
    request_id: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
    #[serde(rename = "ResponseDescription")]
    response_description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PushRequest<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    transaction_type: &'a str,
    amount: i64,
    party_a: String,
    party_b: &'a str,
    phone_number: String,
    #[serde(rename = "CallBackURL")]
    callback_url: &'a str,
    account_reference: &'a str,
    transaction_desc: &'a str,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: Option<String>,
    #[serde(rename = "MerchantRequestID")]
    merchant_request_id: Option<String>,
    #[serde(rename = "ResponseCode")]
    response_code: Option<String>,
    #[serde(rename = "ResponseDescription")]
    response_description: Option<String>,
    #[serde(rename = "CustomerMessage")]
    customer_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StatusQueryRequest<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: &'a str,
}

/// 14-digit `YYYYMMDDHHMMSS` timestamp used in the password derivation.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

pub fn build_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{shortcode}{passkey}{timestamp}"))
}

/// M-Pesa Daraja client built on reqwest.
pub struct MpesaClient {
    http: reqwest::Client,
    config: MpesaConfig,
}

impl MpesaClient {
    pub fn new(config: MpesaConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    pub fn callback_url(&self) -> &str {
        &self.config.callback_url
    }

    fn url(&self, path: &str) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.config.environment.base_url());
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, String> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let details = serde_json::from_str::<ProviderErrorBody>(&body).unwrap_or_default();

        error!(
            status = %status,
            mpesa_request_id = ?details.request_id,
            mpesa_error_code = ?details.error_code,
            mpesa_error_message = ?details.error_message,
            response_body = %body,
            context = %context,
            "mpesa api request failed"
        );

        Err(details
            .error_message
            .or(details.response_description)
            .unwrap_or_else(|| format!("{context} failed with status {status}")))
    }

    /// Fetches a fresh OAuth token; tokens are not cached between calls.
    pub async fn get_access_token(&self) -> Result<String, GatewayError> {
        let credentials = STANDARD.encode(format!(
            "{}:{}",
            self.config.consumer_key, self.config.consumer_secret
        ));

        let resp = self
            .http
            .get(self.url("/oauth/v1/generate"))
            .query(&[("grant_type", "client_credentials")])
            .header(AUTHORIZATION, format!("Basic {credentials}"))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "generate access token")
            .await
            .map_err(GatewayError::Auth)?;

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        Ok(token.access_token)
    }

    pub async fn initiate_push(
        &self,
        phone: &str,
        amount: i64,
        account_reference: &str,
        description: &str,
        callback_url: &str,
    ) -> PushOutcome {
        match self
            .try_initiate_push(phone, amount, account_reference, description, callback_url)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, account_reference, "mpesa: push request failed");
                PushOutcome::failed(err.to_string())
            }
        }
    }

    async fn try_initiate_push(
        &self,
        phone: &str,
        amount: i64,
        account_reference: &str,
        description: &str,
        callback_url: &str,
    ) -> Result<PushOutcome, GatewayError> {
        let token = self.get_access_token().await?;
        let timestamp = timestamp(Utc::now());
        let payer = to_provider_format(phone);

        let request = PushRequest {
            business_short_code: &self.config.shortcode,
            password: build_password(&self.config.shortcode, &self.config.passkey, &timestamp),
            timestamp,
            transaction_type: TRANSACTION_TYPE,
            amount,
            party_a: payer.clone(),
            party_b: &self.config.shortcode,
            phone_number: payer,
            callback_url,
            account_reference,
            transaction_desc: description,
        };

        let resp = self
            .http
            .post(self.url("/mpesa/stkpush/v1/processrequest"))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "stk push")
            .await
            .map_err(GatewayError::Rejected)?;

        let parsed: PushResponse = resp
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))?;

        let Some(checkout_request_id) = parsed.checkout_request_id else {
            return Err(GatewayError::Decode(
                "CheckoutRequestID missing from push response".to_string(),
            ));
        };

        info!(
            %checkout_request_id,
            merchant_request_id = ?parsed.merchant_request_id,
            "mpesa: push accepted"
        );

        Ok(PushOutcome {
            success: true,
            checkout_request_id: Some(checkout_request_id),
            merchant_request_id: parsed.merchant_request_id,
            response_code: parsed.response_code,
            response_description: parsed.response_description,
            customer_message: parsed.customer_message,
            error: None,
        })
    }

    /// Probes the provider for the outcome of an earlier push.
    pub async fn query_status(
        &self,
        checkout_request_id: &str,
    ) -> Result<StatusQueryResult, GatewayError> {
        let token = self.get_access_token().await?;
        let timestamp = timestamp(Utc::now());

        let request = StatusQueryRequest {
            business_short_code: &self.config.shortcode,
            password: build_password(&self.config.shortcode, &self.config.passkey, &timestamp),
            timestamp,
            checkout_request_id,
        };

        let resp = self
            .http
            .post(self.url("/mpesa/stkpushquery/v1/query"))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "stk push query")
            .await
            .map_err(GatewayError::Rejected)?;

        let raw: serde_json::Value = resp
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))?;

        Ok(StatusQueryResult {
            result_code: raw.get("ResultCode").and_then(value_as_string),
            result_desc: raw.get("ResultDesc").and_then(value_as_string),
            raw,
        })
    }
}

// ResultCode is documented as a string but some environments send a number.
fn value_as_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MpesaClient {
        MpesaClient::new(MpesaConfig {
            environment: MpesaEnvironment::Sandbox,
            consumer_key: "key".to_string(),
            consumer_secret: "secret".to_string(),
            shortcode: "174379".to_string(),
            passkey: "passkey".to_string(),
            callback_url: "https://example.test/callback".to_string(),
            base_url: Some(server.uri()),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/oauth/v1/generate"))
            .and(query_param("grant_type", "client_credentials"))
            .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "token-1", "expires_in": "3599" })),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn timestamp_is_fourteen_digits() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(timestamp(now), "20240307090501");
    }

    #[test]
    fn password_encodes_shortcode_passkey_and_timestamp() {
        let password = build_password("174379", "passkey", "20240307090501");
        let decoded = STANDARD.decode(password).unwrap();
        assert_eq!(decoded, b"174379passkey20240307090501");
    }

    #[test]
    fn environment_selects_host() {
        assert_eq!(
            MpesaEnvironment::from_str("production").base_url(),
            PRODUCTION_BASE_URL
        );
        assert_eq!(MpesaEnvironment::from_str("anything").base_url(), SANDBOX_BASE_URL);
    }

    #[tokio::test]
    async fn push_returns_correlation_ids() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/mpesa/stkpush/v1/processrequest"))
            .and(header("authorization", "Bearer token-1"))
            .and(body_partial_json(json!({
                "BusinessShortCode": "174379",
                "TransactionType": "CustomerPayBillOnline",
                "Amount": 50,
                "PartyA": "254712345678",
                "PartyB": "174379",
                "PhoneNumber": "254712345678",
                "CallBackURL": "https://example.test/callback",
                "AccountReference": "SB-1234",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MerchantRequestID": "m-1",
                "CheckoutRequestID": "ws_CO_1",
                "ResponseCode": "0",
                "ResponseDescription": "Success. Request accepted for processing",
                "CustomerMessage": "Success. Request accepted for processing",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let outcome = client
            .initiate_push(
                "+254712345678",
                50,
                "SB-1234",
                "Weekly Plan subscription",
                "https://example.test/callback",
            )
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.checkout_request_id.as_deref(), Some("ws_CO_1"));
        assert_eq!(outcome.merchant_request_id.as_deref(), Some("m-1"));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn rejected_push_is_reported_not_raised() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/mpesa/stkpush/v1/processrequest"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "requestId": "r-1",
                "errorCode": "400.002.02",
                "errorMessage": "Bad Request - Invalid PhoneNumber",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let outcome = client
            .initiate_push("+254712345678", 50, "SB-1", "Weekly", "https://example.test/cb")
            .await;

        assert!(!outcome.success);
        assert!(
            outcome
                .error
                .unwrap()
                .contains("Bad Request - Invalid PhoneNumber")
        );
    }

    #[tokio::test]
    async fn token_failure_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/v1/generate"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "errorCode": "401.002.01",
                "errorMessage": "Invalid Access Token",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get_access_token().await.unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));

        let outcome = client
            .initiate_push("+254712345678", 50, "SB-1", "Weekly", "https://example.test/cb")
            .await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn status_query_reads_result_code() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/mpesa/stkpushquery/v1/query"))
            .and(body_partial_json(json!({ "CheckoutRequestID": "ws_CO_1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ResponseCode": "0",
                "MerchantRequestID": "m-1",
                "CheckoutRequestID": "ws_CO_1",
                "ResultCode": "1032",
                "ResultDesc": "Request cancelled by user",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.query_status("ws_CO_1").await.unwrap();

        assert_eq!(result.result_code.as_deref(), Some("1032"));
        assert_eq!(result.result_desc.as_deref(), Some("Request cancelled by user"));
        assert_eq!(result.raw["MerchantRequestID"], "m-1");
    }
}
