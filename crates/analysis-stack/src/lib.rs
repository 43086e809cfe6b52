//! Resource graph for the property analysis service and its synthesis to an
//! AWS CloudFormation template.

pub mod api;
pub mod error;
pub mod function;
pub mod name;
pub mod role;
pub mod stack;
pub mod table;
pub mod template;

pub use api::{ApiSpec, CorsPolicy, HttpMethod, Route};
pub use error::StackError;
pub use function::{CodeAsset, FunctionSpec, Runtime};
pub use name::{
    ApiName, FunctionName, LogicalId, NameError, PathPart, RoleName, StackName, StageName,
    TableName,
};
pub use role::{ManagedPolicy, PolicyStatement, RoleSpec};
pub use stack::{AnalysisStack, Environment, StackProps};
pub use table::{BillingMode, TableSpec};
pub use template::{RemovalPolicy, ResourceRef, Template};
