//! In-process transport with canned answers.
//!
//! Backs the `echo://` broker scheme and lets tests exercise the dispatcher
//! without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::client::RpcClient;
use crate::error::RpcError;

/// Client answering from a fixed table keyed by `"service.method"`.
///
/// Lookup order:
/// 1. Canned responses (from `with_responses()`); `Err` entries become
///    remote errors.
/// 2. In echo mode, `{"service", "method", "params"}` is returned.
/// 3. Otherwise the call fails with a remote "unknown method" error.
pub struct StaticRpcClient {
    responses: HashMap<String, Result<Value, String>>,
    echo: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    shut_down: AtomicBool,
}

impl StaticRpcClient {
    /// Answer every call by echoing its identity and params.
    pub fn echo() -> Self {
        StaticRpcClient {
            responses: HashMap::new(),
            echo: true,
            delay: None,
            calls: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn with_responses(responses: HashMap<String, Result<Value, String>>) -> Self {
        StaticRpcClient {
            responses,
            echo: false,
            ..Self::echo()
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `invoke` calls seen so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RpcClient for StaticRpcClient {
    async fn invoke(
        &self,
        service: &str,
        method: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, RpcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let key = format!("{}.{}", service, method);
        match self.responses.get(&key) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(RpcError::Remote {
                service: service.to_string(),
                method: method.to_string(),
                message: message.clone(),
            }),
            None if self.echo => Ok(json!({
                "service": service,
                "method": method,
                "params": params,
            })),
            None => Err(RpcError::Remote {
                service: service.to_string(),
                method: method.to_string(),
                message: format!("unknown method '{}'", key),
            }),
        }
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }

    fn transport_id(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_returns_call_identity() {
        let client = StaticRpcClient::echo();
        let mut params = Map::new();
        params.insert("page".to_string(), json!(1));
        let value = client.invoke("props", "list", &params).await.unwrap();
        assert_eq!(
            value,
            json!({"service": "props", "method": "list", "params": {"page": 1}})
        );
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn canned_responses_and_failures() {
        let client = StaticRpcClient::with_responses(
            [
                ("s.ok".to_string(), Ok(json!([1, 2]))),
                ("s.bad".to_string(), Err("ValueError: nope".to_string())),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(client.invoke("s", "ok", &Map::new()).await, Ok(json!([1, 2])));
        assert!(matches!(
            client.invoke("s", "bad", &Map::new()).await,
            Err(RpcError::Remote { message, .. }) if message == "ValueError: nope"
        ));
        assert!(matches!(
            client.invoke("s", "missing", &Map::new()).await,
            Err(RpcError::Remote { .. })
        ));
    }

    #[test]
    fn shutdown_is_recorded() {
        let client = StaticRpcClient::echo();
        assert!(!client.is_shut_down());
        client.shutdown();
        assert!(client.is_shut_down());
    }
}
