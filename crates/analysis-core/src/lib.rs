pub mod db;
pub mod error;
pub mod model;

pub use db::DynamoStore;
pub use error::CoreError;
pub use model::{Analysis, AnalysisInputs};

/// Environment variable through which the function receives the table name.
pub const TABLE_NAME_ENV: &str = "DDB_TABLE";

/// Partition key attribute of the analysis table.
pub const PARTITION_KEY: &str = "id";
