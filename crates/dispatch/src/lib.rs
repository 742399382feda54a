//! Remote call dispatch.
//!
//! Two levels of abstraction:
//! - [`RpcClient`]: invokes one `service.method` with named arguments.
//! - [`Dispatcher`]: owns at most one client handle, recreates it when the
//!   broker or timeout changes, and runs each call on the tokio runtime so the
//!   caller never waits on the network. Results come back as [`Completion`]s.

mod client;
mod config;
mod dispatcher;
mod error;
pub mod http;
pub mod static_client;

pub use client::{ClientFactory, RpcClient, TransportRegistry};
pub use config::{
    ClientConfig, AMQP_URI_CONFIG_KEY, DEFAULT_BROKER, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS,
    MIN_TIMEOUT_SECS,
};
pub use dispatcher::{CallRequest, Completion, DispatchId, Dispatcher};
pub use error::{DispatchError, RpcError};
