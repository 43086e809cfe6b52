use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use analysis_core::{PARTITION_KEY, TABLE_NAME_ENV};
use serde_json::json;
use tracing::{debug, info};

use crate::api::{ApiSpec, CorsPolicy, HttpMethod};
use crate::error::StackError;
use crate::function::{
    ASSET_BUCKET_PARAMETER, ASSET_KEY_PARAMETER, CodeAsset, FunctionSpec, Runtime,
};
use crate::name::{
    ApiName, FunctionName, LogicalId, PathPart, RoleName, StackName, StageName, TableName,
};
use crate::role::{PolicyStatement, RoleSpec};
use crate::table::TableSpec;
use crate::template::{Export, Output, Parameter, RemovalPolicy, Template};

pub const TABLE_ID: &str = "AnalysisTable";
pub const TABLE_NAME: &str = "property-analysis";
pub const ROLE_ID: &str = "AnalysisLambdaRole";
pub const ROLE_NAME: &str = "property-analysis-lambda-role";
pub const FUNCTION_ID: &str = "SendAnalysisFunction";
pub const FUNCTION_NAME: &str = "property-analysis-send";
pub const API_ID: &str = "AnalysisApi";
pub const API_NAME: &str = "property-analysis-api";
pub const STAGE: &str = "prod";
pub const ROUTE_PATH: &str = "send-analysis";
pub const TABLE_NAME_OUTPUT: &str = "AnalysisTableName";

/// Entry point of a `provided.*` runtime bundle.
pub const HANDLER: &str = "bootstrap";

/// Actions the function may perform on the analysis table.
pub const TABLE_ACTIONS: [&str; 3] = [
    "dynamodb:PutItem",
    "dynamodb:GetItem",
    "dynamodb:UpdateItem",
];

const FUNCTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Default location of the function bundle, as built by `cargo lambda build`
/// from the workspace root.
pub fn default_asset_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../target/lambda/analysis-lambda")
}

/// Target account and region, recorded in the template metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub account: Option<String>,
    pub region: Option<String>,
}

/// Optional stack-level settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackProps {
    /// Deployed stack name; defaults to the scope id.
    pub stack_name: Option<String>,
    pub description: Option<String>,
    pub env: Option<Environment>,
    /// Applied to the table, role, function and API.
    pub tags: BTreeMap<String, String>,
    /// Directory holding the function bundle; defaults to [`default_asset_dir`].
    pub asset_dir: Option<PathBuf>,
}

/// Parse a `key=value` tag.
pub fn parse_tag(s: &str) -> Result<(String, String), StackError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(StackError::InvalidTag(s.to_string())),
    }
}

/// The property analysis stack: a table, the function's execution role, the
/// function, and the REST API in front of it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisStack {
    stack_name: StackName,
    props: StackProps,
    table: TableSpec,
    role: RoleSpec,
    function: FunctionSpec,
    api: ApiSpec,
}

impl AnalysisStack {
    /// Declare every resource and wire the references between them.
    pub fn new(scope_id: &str, props: StackProps) -> Result<Self, StackError> {
        let stack_name = StackName::new(props.stack_name.as_deref().unwrap_or(scope_id))?;

        let table = TableSpec::new(
            LogicalId::new(TABLE_ID)?,
            TableName::new(TABLE_NAME)?,
            PARTITION_KEY,
        );
        debug!(id = %table.logical_id(), name = %table.table_name(), "declared table");

        let role = RoleSpec::for_lambda(LogicalId::new(ROLE_ID)?, RoleName::new(ROLE_NAME)?)
            .with_grant(PolicyStatement::allow(TABLE_ACTIONS, &table.reference()))
            .with_retention(RemovalPolicy::Retain);
        debug!(id = %role.logical_id(), name = %role.role_name(), "declared role");

        let asset_dir = props.asset_dir.clone().unwrap_or_else(default_asset_dir);
        let function = FunctionSpec::new(
            LogicalId::new(FUNCTION_ID)?,
            FunctionName::new(FUNCTION_NAME)?,
            Runtime::ProvidedAl2023,
            HANDLER,
            CodeAsset::from_path(asset_dir),
            role.reference(),
        )
        .with_timeout(FUNCTION_TIMEOUT)
        .with_environment(TABLE_NAME_ENV, table.reference().name());
        debug!(
            id = %function.logical_id(),
            name = %function.function_name(),
            asset = %function.code().path().display(),
            "declared function"
        );

        let api = ApiSpec::new(
            LogicalId::new(API_ID)?,
            ApiName::new(API_NAME)?,
            StageName::new(STAGE)?,
        )?
        .with_cors(CorsPolicy::permissive())
        .with_route(PathPart::new(ROUTE_PATH)?, HttpMethod::Post, &function)?;
        debug!(id = %api.logical_id(), name = %api.api_name(), "declared api");

        Ok(Self {
            stack_name,
            props,
            table,
            role,
            function,
            api,
        })
    }

    pub fn stack_name(&self) -> &StackName {
        &self.stack_name
    }

    pub fn props(&self) -> &StackProps {
        &self.props
    }

    pub fn table(&self) -> &TableSpec {
        &self.table
    }

    pub fn role(&self) -> &RoleSpec {
        &self.role
    }

    pub fn function(&self) -> &FunctionSpec {
        &self.function
    }

    pub fn api(&self) -> &ApiSpec {
        &self.api
    }

    /// The stack's outputs: only the generated table name.
    pub fn outputs(&self) -> BTreeMap<String, Output> {
        let mut outputs = BTreeMap::new();
        outputs.insert(
            TABLE_NAME_OUTPUT.to_string(),
            Output {
                value: self.table.reference().name(),
                description: Some("Name of the analysis table".to_string()),
                export: Some(Export {
                    name: format!("{}-{TABLE_NAME_OUTPUT}", self.stack_name),
                }),
            },
        );
        outputs
    }

    /// Render the declared graph as a CloudFormation template.
    pub fn synth(&self) -> Result<Template, StackError> {
        let tags = &self.props.tags;
        let mut template = Template::new(self.props.description.clone());

        template.metadata.insert("StackName".to_string(), json!(self.stack_name));
        if let Some(env) = &self.props.env {
            template.metadata.insert(
                "Environment".to_string(),
                json!({ "Account": env.account, "Region": env.region }),
            );
        }

        template.parameters.insert(
            ASSET_BUCKET_PARAMETER.to_string(),
            Parameter::string(format!(
                "S3 bucket holding the bundle for {}",
                self.function.logical_id()
            )),
        );
        template.parameters.insert(
            ASSET_KEY_PARAMETER.to_string(),
            Parameter::string(format!(
                "S3 key of the bundle for {}",
                self.function.logical_id()
            )),
        );

        template.add_resource(self.table.logical_id(), self.table.render(tags));
        template.add_resource(self.role.logical_id(), self.role.render(tags));
        template.add_resource(self.function.logical_id(), self.function.render(tags));
        for (id, resource) in self.api.render(tags)? {
            template.add_resource(&id, resource);
        }

        template.outputs = self.outputs();

        info!(
            stack = %self.stack_name,
            resources = template.resources.len(),
            outputs = template.outputs.len(),
            "synthesized template"
        );
        Ok(template)
    }

    /// Synthesize and serialize to JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String, StackError> {
        Ok(self.synth()?.to_json(pretty)?)
    }
}
