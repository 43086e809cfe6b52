use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Value, json};

use crate::name::{FunctionName, LogicalId};
use crate::template::{Resource, ResourceRef, reference, render_tags};

pub const FUNCTION_TYPE: &str = "AWS::Lambda::Function";

/// Template parameter carrying the S3 bucket of the uploaded code bundle.
pub const ASSET_BUCKET_PARAMETER: &str = "AssetBucket";
/// Template parameter carrying the S3 key of the uploaded code bundle.
pub const ASSET_KEY_PARAMETER: &str = "AssetKey";

/// Lambda runtime identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    /// OS-only runtime for a native `bootstrap` executable.
    ProvidedAl2023,
}

impl Runtime {
    pub fn id(self) -> &'static str {
        match self {
            Self::ProvidedAl2023 => "provided.al2023",
        }
    }
}

/// A local code bundle, uploaded out of band to the location given by the
/// template's asset parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAsset {
    path: PathBuf,
}

impl CodeAsset {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(&self) -> Value {
        json!({
            "S3Bucket": reference(ASSET_BUCKET_PARAMETER),
            "S3Key": reference(ASSET_KEY_PARAMETER),
        })
    }
}

/// A Lambda function bound to one execution role.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    logical_id: LogicalId,
    function_name: FunctionName,
    runtime: Runtime,
    handler: String,
    code: CodeAsset,
    timeout: Duration,
    role: ResourceRef,
    environment: BTreeMap<String, Value>,
}

impl FunctionSpec {
    pub fn new(
        logical_id: LogicalId,
        function_name: FunctionName,
        runtime: Runtime,
        handler: impl Into<String>,
        code: CodeAsset,
        role: ResourceRef,
    ) -> Self {
        Self {
            logical_id,
            function_name,
            runtime,
            handler: handler.into(),
            code,
            timeout: Duration::from_secs(3),
            role,
            environment: BTreeMap::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add an environment variable. `value` is usually an intrinsic such as
    /// another resource's `Ref`.
    pub fn with_environment(mut self, key: impl Into<String>, value: Value) -> Self {
        self.environment.insert(key.into(), value);
        self
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn function_name(&self) -> &FunctionName {
        &self.function_name
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn code(&self) -> &CodeAsset {
        &self.code
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn role(&self) -> &ResourceRef {
        &self.role
    }

    pub fn environment(&self) -> &BTreeMap<String, Value> {
        &self.environment
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.logical_id.clone(), FUNCTION_TYPE)
    }

    pub(crate) fn render(&self, tags: &BTreeMap<String, String>) -> Resource {
        let mut properties = json!({
            "FunctionName": self.function_name,
            "Runtime": self.runtime.id(),
            "Handler": self.handler,
            "Code": self.code.render(),
            "Timeout": self.timeout.as_secs(),
            "Role": self.role.arn(),
        });

        if !self.environment.is_empty() {
            properties["Environment"] = json!({ "Variables": self.environment });
        }

        if !tags.is_empty() {
            properties["Tags"] = render_tags(tags);
        }

        Resource::new(FUNCTION_TYPE, properties)
            .depends_on(self.role.logical_id())
            .with_metadata(json!({
                "aws:asset:path": self.code.path().display().to_string(),
                "aws:asset:property": "Code",
            }))
    }
}
