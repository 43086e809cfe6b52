use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};

use crate::name::LogicalId;

/// The only template format version CloudFormation accepts.
pub const FORMAT_VERSION: &str = "2010-09-09";

// ---------------------------------------------------------------------------
// Template document
// ---------------------------------------------------------------------------

/// A synthesized CloudFormation template.
///
/// All maps are ordered so that synthesizing the same graph twice yields
/// byte-identical output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,

    pub resources: BTreeMap<String, Resource>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new(description: Option<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description,
            metadata: BTreeMap::new(),
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn add_resource(&mut self, id: &LogicalId, resource: Resource) {
        self.resources.insert(id.to_string(), resource);
    }

    /// Resources of the given CloudFormation type, keyed by logical id.
    pub fn resources_of_type<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.kind == kind)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// A template input parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            kind: "String".to_string(),
            description: Some(description.into()),
        }
    }
}

/// A single resource entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,

    pub properties: Value,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Resource {
    pub fn new(kind: impl Into<String>, properties: Value) -> Self {
        Self {
            kind: kind.into(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
            metadata: None,
        }
    }

    /// Apply a removal policy to both stack deletion and replacement.
    /// `None` leaves the platform default in place.
    pub fn with_removal_policy(mut self, policy: Option<RemovalPolicy>) -> Self {
        self.deletion_policy = policy;
        self.update_replace_policy = policy;
        self
    }

    pub fn depends_on(mut self, id: &LogicalId) -> Self {
        self.depends_on.push(id.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// What happens to a physical resource when the stack deletes or replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalPolicy {
    Retain,
}

/// A stack output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Export {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Intrinsic functions
// ---------------------------------------------------------------------------

/// `{"Ref": id}`
pub fn reference(id: impl AsRef<str>) -> Value {
    json!({ "Ref": id.as_ref() })
}

/// `{"Fn::GetAtt": [id, attribute]}`
pub fn get_att(id: impl AsRef<str>, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id.as_ref(), attribute] })
}

/// `{"Fn::Join": ["", parts]}`
pub fn concat(parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": ["", parts] })
}

pub fn partition() -> Value {
    reference("AWS::Partition")
}

pub fn region() -> Value {
    reference("AWS::Region")
}

pub fn account_id() -> Value {
    reference("AWS::AccountId")
}

/// `arn:<partition>:iam::aws:policy/<name>`
pub fn aws_managed_policy_arn(name: &str) -> Value {
    concat(vec![
        json!("arn:"),
        partition(),
        json!(format!(":iam::aws:policy/{name}")),
    ])
}

// ---------------------------------------------------------------------------
// ResourceRef
// ---------------------------------------------------------------------------

/// A typed handle to a declared resource.
///
/// Cross-references are always rendered as intrinsics against the logical id,
/// never as literal names or ARNs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    logical_id: LogicalId,
    kind: &'static str,
}

impl ResourceRef {
    pub fn new(logical_id: LogicalId, kind: &'static str) -> Self {
        Self { logical_id, kind }
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    /// CloudFormation resource type of the target.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The physical name (or id) as returned by `Ref`.
    pub fn name(&self) -> Value {
        reference(&self.logical_id)
    }

    pub fn arn(&self) -> Value {
        self.attribute("Arn")
    }

    pub fn attribute(&self, attribute: &str) -> Value {
        get_att(&self.logical_id, attribute)
    }
}

/// Render tags as the CloudFormation `[{Key, Value}]` list.
pub(crate) fn render_tags(tags: &BTreeMap<String, String>) -> Value {
    Value::Array(
        tags.iter()
            .map(|(k, v)| json!({ "Key": k, "Value": v }))
            .collect(),
    )
}
