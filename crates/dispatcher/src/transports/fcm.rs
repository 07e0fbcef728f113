//! FcmTransport - Firebase Cloud Messaging HTTP v1
//!
//! FCM v1 addresses one token per request, so a multicast is a bounded set
//! of concurrent sends. Responses come back in token order.

use std::time::Duration;

use contracts::{
    ContractError, MulticastReport, PushMessage, PushTransport, SendResponse, TransportConfig,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::error::DispatcherError;

const TRANSPORT: &str = "fcm";

/// Upper bound on tokens per chunk, matching the FCM multicast limit
pub const MAX_BATCH_SIZE: usize = 500;

/// Maximum length of a WebPush `Topic` header
const MAX_TOPIC_LEN: usize = 32;

/// Resolved FCM connection settings
#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// API base URL, e.g. `https://fcm.googleapis.com`
    pub base_url: String,
    /// Cloud project id
    pub project_id: String,
    /// OAuth2 bearer token
    pub access_token: Option<String>,
    /// Tokens per chunk
    pub batch_size: usize,
    /// Concurrent requests within a chunk
    pub max_in_flight: usize,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl FcmConfig {
    /// Build from service configuration, reading the token from the
    /// configured environment variable.
    pub fn from_transport_config(config: &TransportConfig) -> Result<Self, DispatcherError> {
        let project_id = config
            .project_id
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| DispatcherError::transport_creation(TRANSPORT, "project_id is required"))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            project_id,
            access_token: std::env::var(&config.access_token_env).ok(),
            batch_size: config.batch_size,
            max_in_flight: config.max_in_flight,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }
}

/// FCM HTTP v1 transport
pub struct FcmTransport {
    client: reqwest::Client,
    config: FcmConfig,
    send_url: String,
}

impl FcmTransport {
    /// Create a new transport
    pub fn new(config: FcmConfig) -> Result<Self, DispatcherError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DispatcherError::transport_creation(TRANSPORT, e.to_string()))?;

        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            config.base_url.trim_end_matches('/'),
            config.project_id
        );

        Ok(Self {
            client,
            config,
            send_url,
        })
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    /// Send to a single token
    ///
    /// Only refused credentials are an error here; they would hit every
    /// token. A request that never got an answer is reported as
    /// [`Attempt::Unanswered`] and judged once the whole call is in.
    async fn send_one(&self, token: &str, message: &PushMessage) -> Result<Attempt, ContractError> {
        let mut request = self
            .client
            .post(&self.send_url)
            .json(&request_body(token, message));
        if let Some(access_token) = &self.config.access_token {
            request = request.bearer_auth(access_token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, timeout = e.is_timeout(), "FCM request failed");
                return Ok(Attempt::Unanswered {
                    token: token.to_string(),
                    error: format!("request failed: {e}"),
                });
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(ContractError::transport(
                TRANSPORT,
                format!("credentials rejected (HTTP {}): {body}", status.as_u16()),
            ));
        }

        if status.is_success() {
            let sent = match response.json::<SendResult>().await {
                Ok(sent) => sent,
                Err(e) => {
                    debug!(error = %e, "Could not read FCM send response, message id lost");
                    SendResult::default()
                }
            };
            return Ok(Attempt::Answered(SendResponse::delivered(token, sent.name)));
        }

        let body = response.text().await.unwrap_or_default();
        let (code, detail) = error_code(status, &body);
        debug!(status = status.as_u16(), code = %code, "Token rejected");
        Ok(Attempt::Answered(SendResponse::failed(token, code, detail)))
    }
}

impl PushTransport for FcmTransport {
    fn name(&self) -> &str {
        TRANSPORT
    }

    /// Send to every token, chunk by chunk.
    ///
    /// The call fails only when credentials are refused or when no request
    /// got an answer at all. A token whose request alone failed is reported
    /// as `UNAVAILABLE` next to the tokens that went through.
    #[instrument(
        name = "fcm_transport_send",
        skip(self, message),
        fields(tokens = message.tokens.len(), batch_size = self.batch_size())
    )]
    async fn send_multicast(&self, message: &PushMessage) -> Result<MulticastReport, ContractError> {
        let mut attempts: Vec<Attempt> = Vec::with_capacity(message.tokens.len());

        for chunk in message.tokens.chunks(self.batch_size()) {
            let sends: Vec<_> = chunk
                .iter()
                .map(|token| self.send_one(token, message))
                .collect();
            let answered: Vec<Attempt> = stream::iter(sends)
                .buffered(self.config.max_in_flight.max(1))
                .try_collect()
                .await?;
            attempts.extend(answered);
        }

        if let Some(error) = unreachable_service(&attempts) {
            return Err(ContractError::transport(TRANSPORT, error));
        }

        let report = MulticastReport::new(attempts.into_iter().map(Attempt::into_response).collect());
        if report.failure_count() > 0 {
            warn!(
                failed = report.failure_count(),
                total = message.tokens.len(),
                "FCM rejected some tokens"
            );
        }
        Ok(report)
    }
}

/// Outcome of one token's request
#[derive(Debug)]
enum Attempt {
    /// FCM answered, either way
    Answered(SendResponse),
    /// The request failed or timed out before an answer
    Unanswered { token: String, error: String },
}

impl Attempt {
    fn into_response(self) -> SendResponse {
        match self {
            Attempt::Answered(response) => response,
            Attempt::Unanswered { token, error } => SendResponse::failed(token, "UNAVAILABLE", error),
        }
    }
}

/// The first request error, when not a single request got an answer
fn unreachable_service(attempts: &[Attempt]) -> Option<String> {
    let mut first_error = None;
    for attempt in attempts {
        match attempt {
            Attempt::Answered(_) => return None,
            Attempt::Unanswered { error, .. } => {
                first_error.get_or_insert_with(|| error.clone());
            }
        }
    }
    first_error
}

/// FCM v1 request body for one token
fn request_body(token: &str, message: &PushMessage) -> Value {
    let mut body = json!({
        "token": token,
        "notification": {
            "title": message.notification.title,
            "body": message.notification.body,
        },
        "data": message.data,
    });

    if let Some(key) = &message.idempotency_key {
        body["android"] = json!({ "collapse_key": key });
        body["webpush"] = json!({ "headers": { "Topic": webpush_topic(key) } });
    }

    json!({ "message": body })
}

/// WebPush topics allow only URL-safe base64 characters, at most 32 of them
fn webpush_topic(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_TOPIC_LEN)
        .collect()
}

/// Extract the FCM error code from an error response
///
/// Prefers `details[].errorCode` (e.g. `UNREGISTERED`), then the canonical
/// `error.status`, then the HTTP status.
fn error_code(status: StatusCode, body: &str) -> (String, String) {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let Some(error) = parsed.map(|r| r.error) else {
        return (format!("HTTP_{}", status.as_u16()), body.to_string());
    };

    let code = error
        .details
        .iter()
        .find_map(|d| d.error_code.clone())
        .or(error.status)
        .unwrap_or_else(|| format!("HTTP_{}", status.as_u16()));
    (code, error.message.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct SendResult {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    error_code: Option<String>,
}
