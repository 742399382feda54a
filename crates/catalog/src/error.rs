use std::path::PathBuf;

/// Failures reading or writing the catalog file.
///
/// Naming conflicts and missing paths are not errors: store operations report
/// them through their boolean return value.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The temp file was written but could not be moved over the catalog.
    #[error("could not replace catalog file {path}: {message}")]
    Persist { path: PathBuf, message: String },
}
