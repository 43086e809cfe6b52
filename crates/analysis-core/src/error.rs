use thiserror::Error;

/// Core errors for analysis storage.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("DynamoDB error: {0}")]
    Dynamo(#[from] aws_sdk_dynamodb::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_dynamo::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),
}
