//! HTTP gateway transport.
//!
//! Calls `POST {broker}/{service}/{method}` with the params object as the
//! JSON body and reads the JSON response as the result. Uses `ureq` (sync)
//! wrapped in `tokio::task::spawn_blocking` so the async runtime is never
//! blocked.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::client::RpcClient;
use crate::config::AMQP_URI_CONFIG_KEY;
use crate::error::RpcError;

pub struct HttpRpcClient {
    base_url: String,
    timeout_secs: u64,
    agent: ureq::Agent,
}

impl HttpRpcClient {
    /// Build a client from transport settings (`{"AMQP_URI": broker}`) and a
    /// timeout that bounds every request.
    ///
    /// Non-2xx statuses are returned as responses, not transport errors, so
    /// the remote error body can be reported.
    pub fn new(
        transport: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, RpcError> {
        let broker = transport.get(AMQP_URI_CONFIG_KEY).ok_or_else(|| {
            RpcError::InvalidConfig(format!(
                "missing {} in transport config",
                AMQP_URI_CONFIG_KEY
            ))
        })?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Ok(HttpRpcClient {
            base_url: broker.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
            agent,
        })
    }

    /// `service.method` → `{base_url}/service/method`
    pub fn call_url(&self, service: &str, method: &str) -> String {
        format!("{}/{}/{}", self.base_url, service, method)
    }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn invoke(
        &self,
        service: &str,
        method: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, RpcError> {
        let url = self.call_url(service, method);
        let agent = self.agent.clone();
        let body = Value::Object(params.clone());
        let broker = self.base_url.clone();
        let seconds = self.timeout_secs;
        let service = service.to_string();
        let method = method.to_string();

        tokio::task::spawn_blocking(move || {
            let response = match agent.post(&url).send_json(&body) {
                Ok(response) => response,
                Err(ureq::Error::Timeout(_)) => {
                    return Err(RpcError::Timeout {
                        service,
                        method,
                        seconds,
                    })
                }
                Err(e) => {
                    return Err(RpcError::Connect {
                        broker,
                        message: e.to_string(),
                    })
                }
            };

            let status = response.status();
            let mut body = response.into_body();
            if !status.is_success() {
                let text = body.read_to_string().unwrap_or_default();
                let message = remote_message(&text)
                    .unwrap_or_else(|| format!("HTTP status {}", status.as_u16()));
                return Err(RpcError::Remote {
                    service,
                    method,
                    message,
                });
            }

            let value = match body.read_json::<Value>() {
                Ok(value) => value,
                Err(e) => {
                    return Err(RpcError::Remote {
                        service,
                        method,
                        message: format!("response is not JSON: {}", e),
                    })
                }
            };
            // Gateways report remote exceptions as `{"error": ...}` with 200.
            match error_field(&value) {
                Some(message) => Err(RpcError::Remote {
                    service,
                    method,
                    message,
                }),
                None => Ok(value),
            }
        })
        .await
        .map_err(|e| RpcError::Internal(format!("task join error: {}", e)))?
    }

    fn transport_id(&self) -> &str {
        "http"
    }
}

/// Pull a human-readable message out of an error response body: the `error`
/// field of a JSON object, or else the raw text.
fn remote_message(text: &str) -> Option<String> {
    if let Some(message) = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| error_field(&value))
    {
        return Some(message);
    }
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The `error` member of a JSON object, as text.
fn error_field(value: &Value) -> Option<String> {
    match value.as_object()?.get("error")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
