use analysis_core::CoreError;

/// Errors from handling one send-analysis request.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The request carried no body.
    #[error("request body is missing")]
    MissingBody,
    /// The body is not a JSON object with an `inputs` object.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    /// Error from DynamoDB operations.
    #[error("storage error: {0}")]
    Core(#[from] CoreError),
}
