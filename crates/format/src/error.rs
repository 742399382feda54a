/// Errors raised while turning user-supplied text into request params.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The text is not valid JSON.
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    /// The text is valid JSON but not an object, so it cannot be expanded
    /// into named arguments.
    #[error("params must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}
