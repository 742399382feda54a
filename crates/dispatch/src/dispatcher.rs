//! Single-slot call dispatcher.
//!
//! The dispatcher is driven from one coordinating task (the interface
//! loop). `dispatch` spawns the remote call and returns at once; the outcome
//! arrives later as exactly one [`Completion`] on an internal channel, read
//! through [`Dispatcher::next_completion`] or [`Dispatcher::try_completion`].
//! Only the completion message crosses from the call task back to the
//! coordinator.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use rpcman_catalog::MethodPath;

use crate::client::{ClientFactory, RpcClient};
use crate::config::ClientConfig;
use crate::error::{DispatchError, RpcError};

/// Sequence number of a dispatched call.
pub type DispatchId = u64;

/// One call to make: the method leaf it belongs to and the named arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub path: MethodPath,
    pub params: Map<String, Value>,
}

/// Outcome of one dispatched call, echoing what was sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub id: DispatchId,
    pub request: CallRequest,
    pub outcome: Result<Value, RpcError>,
}

impl Completion {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The result value, or an `{"error": ...}` envelope on failure.
    pub fn result_value(&self) -> Value {
        match &self.outcome {
            Ok(value) => value.clone(),
            Err(e) => rpcman_format::error_envelope(e.to_string()),
        }
    }
}

enum Handle {
    Absent,
    Active {
        config: ClientConfig,
        client: Arc<dyn RpcClient>,
    },
}

pub struct Dispatcher {
    factory: Arc<dyn ClientFactory>,
    handle: Handle,
    next_id: DispatchId,
    in_flight: Option<DispatchId>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Dispatcher {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Dispatcher {
            factory,
            handle: Handle::Absent,
            next_id: 1,
            in_flight: None,
            tx,
            rx,
        }
    }

    /// Make sure a client handle for `config` exists.
    ///
    /// Absent → build one. Active with the same broker and timeout → no-op.
    /// Active with a different config → shut the old handle down and build a
    /// new one. If building fails the dispatcher is left without a handle.
    pub fn ensure_client(&mut self, config: &ClientConfig) -> Result<(), RpcError> {
        if let Handle::Active { config: current, .. } = &self.handle {
            if current == config {
                return Ok(());
            }
        }
        self.release_client();
        let client = self.factory.connect(config)?;
        self.handle = Handle::Active {
            config: config.clone(),
            client,
        };
        Ok(())
    }

    /// Config of the current handle, if any.
    pub fn active_config(&self) -> Option<&ClientConfig> {
        match &self.handle {
            Handle::Active { config, .. } => Some(config),
            Handle::Absent => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start `request` on the current runtime and return without waiting.
    ///
    /// The call is bounded by the handle's timeout. A failing or panicking
    /// call still yields one completion carrying the error.
    pub fn dispatch(&mut self, request: CallRequest) -> Result<DispatchId, DispatchError> {
        if self.in_flight.is_some() {
            return Err(DispatchError::Busy);
        }
        let Handle::Active { config, client } = &self.handle else {
            return Err(DispatchError::NoClient);
        };
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;

        let id = self.next_id;
        self.next_id += 1;
        self.in_flight = Some(id);

        let client = Arc::clone(client);
        let timeout = config.timeout();
        let seconds = config.timeout_secs();
        let tx = self.tx.clone();

        tracing::info!(id, method = %request.path, "dispatching call");
        runtime.spawn(async move {
            let service = request.path.service.clone();
            let method = request.path.method.clone();
            let params = request.params.clone();
            let mut call = tokio::spawn(async move {
                client.invoke(&service, &method, &params).await
            });

            let outcome = match tokio::time::timeout(timeout, &mut call).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(RpcError::Internal(format!(
                    "call task failed: {}",
                    join_err
                ))),
                Err(_) => {
                    call.abort();
                    Err(RpcError::Timeout {
                        service: request.path.service.clone(),
                        method: request.path.method.clone(),
                        seconds,
                    })
                }
            };

            match &outcome {
                Ok(_) => tracing::info!(id, method = %request.path, "call completed"),
                Err(e) => tracing::warn!(id, method = %request.path, error = ?e, "call failed"),
            }
            // The receiver lives as long as the dispatcher; a closed channel
            // just means nobody is waiting any more.
            let _ = tx.send(Completion {
                id,
                request,
                outcome,
            });
        });
        Ok(id)
    }

    /// Wait for the outstanding call to finish.
    ///
    /// Returns `None` at once when nothing is in flight and nothing is queued.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.in_flight.is_none() {
            return self.try_completion();
        }
        let completion = self.rx.recv().await?;
        self.settle(&completion);
        Some(completion)
    }

    /// Take a finished completion without waiting.
    pub fn try_completion(&mut self) -> Option<Completion> {
        let completion = self.rx.try_recv().ok()?;
        self.settle(&completion);
        Some(completion)
    }

    fn settle(&mut self, completion: &Completion) {
        if self.in_flight == Some(completion.id) {
            self.in_flight = None;
        }
    }

    /// Drop the current handle after asking it to release its connections.
    ///
    /// An outstanding call keeps its own reference and may still complete.
    pub fn shutdown(&mut self) {
        self.release_client();
    }

    fn release_client(&mut self) {
        if let Handle::Active { config, client } =
            std::mem::replace(&mut self.handle, Handle::Absent)
        {
            tracing::info!(broker = %config.broker(), "closing RPC client");
            client.shutdown();
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.release_client();
    }
}
