use std::collections::HashMap;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::debug;

use crate::TABLE_NAME_ENV;
use crate::error::CoreError;
use crate::model::Analysis;

/// DynamoDB client wrapper for the analysis table.
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    /// Create a new `DynamoStore` by loading AWS configuration from the
    /// environment and constructing a DynamoDB client.
    pub async fn new(table_name: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let client = Client::new(&config);
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Create a store for the table named by `DDB_TABLE`.
    pub async fn from_env() -> Result<Self, CoreError> {
        let table_name =
            std::env::var(TABLE_NAME_ENV).map_err(|_| CoreError::MissingEnv(TABLE_NAME_ENV))?;
        Ok(Self::new(table_name).await)
    }

    /// The DynamoDB table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Write one analysis record. An existing item with the same id is replaced.
    pub async fn put_analysis(&self, analysis: &Analysis) -> Result<(), CoreError> {
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(analysis)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;

        debug!(id = %analysis.id, table = %self.table_name, "put analysis item");
        Ok(())
    }
}
