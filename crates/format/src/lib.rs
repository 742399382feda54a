//! Presentation helpers shared by the catalog, the dispatcher and the CLI.
//!
//! Everything here is a pure function over `serde_json::Value` or text:
//! canonical pretty printing, best-effort repair of hand-typed near-JSON,
//! `{"error": ...}` envelopes and display truncation.

mod error;
mod render;
mod repair;

pub use error::FormatError;
pub use render::{
    canonicalize, error_envelope, error_json, looks_like_error, pretty, truncate_for_display,
    MAX_DISPLAY_LENGTH,
};
pub use repair::{parse_object, repair};
