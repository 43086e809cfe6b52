use std::collections::BTreeMap;

use serde_json::json;

use crate::name::{LogicalId, TableName};
use crate::template::{RemovalPolicy, Resource, ResourceRef, render_tags};

pub const TABLE_TYPE: &str = "AWS::DynamoDB::Table";

/// Capacity mode of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    /// On-demand: billed per request.
    PayPerRequest,
}

impl BillingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PayPerRequest => "PAY_PER_REQUEST",
        }
    }
}

/// A DynamoDB table with a single string partition key.
///
/// The key type is always `S` and the table is always retained when the
/// stack is deleted or the table replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    logical_id: LogicalId,
    table_name: TableName,
    partition_key: String,
    billing_mode: BillingMode,
}

impl TableSpec {
    pub fn new(
        logical_id: LogicalId,
        table_name: TableName,
        partition_key: impl Into<String>,
    ) -> Self {
        Self {
            logical_id,
            table_name,
            partition_key: partition_key.into(),
            billing_mode: BillingMode::PayPerRequest,
        }
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn table_name(&self) -> &TableName {
        &self.table_name
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn billing_mode(&self) -> BillingMode {
        self.billing_mode
    }

    pub fn retention(&self) -> RemovalPolicy {
        RemovalPolicy::Retain
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.logical_id.clone(), TABLE_TYPE)
    }

    pub(crate) fn render(&self, tags: &BTreeMap<String, String>) -> Resource {
        let mut properties = json!({
            "TableName": self.table_name,
            "AttributeDefinitions": [
                { "AttributeName": self.partition_key, "AttributeType": "S" }
            ],
            "KeySchema": [
                { "AttributeName": self.partition_key, "KeyType": "HASH" }
            ],
            "BillingMode": self.billing_mode.as_str(),
        });

        if !tags.is_empty() {
            properties["Tags"] = render_tags(tags);
        }

        Resource::new(TABLE_TYPE, properties).with_removal_policy(Some(self.retention()))
    }
}
