/// Failures producing a call result. The dispatcher turns these into
/// `{"error": ...}` envelopes rather than propagating them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    #[error("invalid client config: {0}")]
    InvalidConfig(String),

    #[error("no transport registered for broker scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("could not reach broker {broker}: {message}")]
    Connect { broker: String, message: String },

    #[error("{service}.{method} failed: {message}")]
    Remote {
        service: String,
        method: String,
        message: String,
    },

    #[error("{service}.{method} timed out after {seconds}s")]
    Timeout {
        service: String,
        method: String,
        seconds: u64,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Reasons a call could not be started at all.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// One call is already outstanding; only one may be in flight.
    #[error("a call is already in flight")]
    Busy,

    #[error("no RPC client configured")]
    NoClient,

    #[error("dispatch requires a running tokio runtime")]
    NoRuntime,
}
