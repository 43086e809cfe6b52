use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::name::{LogicalId, RoleName};
use crate::template::{
    RemovalPolicy, Resource, ResourceRef, aws_managed_policy_arn, render_tags,
};

pub const ROLE_TYPE: &str = "AWS::IAM::Role";

/// Service principal of AWS Lambda.
pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

const POLICY_VERSION: &str = "2012-10-17";

/// An IAM managed policy attached to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagedPolicy {
    /// An AWS-owned policy, by its path-qualified name.
    AwsManaged(String),
}

impl ManagedPolicy {
    /// Permission to write function logs to CloudWatch.
    pub fn lambda_basic_execution() -> Self {
        Self::AwsManaged("service-role/AWSLambdaBasicExecutionRole".to_string())
    }

    fn render(&self) -> Value {
        match self {
            Self::AwsManaged(name) => aws_managed_policy_arn(name),
        }
    }
}

/// An `Allow` statement over a set of declared resources.
///
/// Resources are handles into the stack, so a statement can only ever name
/// concrete ARNs of resources the stack owns.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<ResourceRef>,
}

impl PolicyStatement {
    pub fn allow<I, S>(actions: I, resource: &ResourceRef) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            resources: vec![resource.clone()],
        }
    }

    fn render(&self) -> Value {
        let resources: Vec<Value> = self.resources.iter().map(ResourceRef::arn).collect();
        // A single resource renders as a scalar.
        let resource = match resources.as_slice() {
            [only] => only.clone(),
            _ => Value::Array(resources),
        };
        json!({
            "Effect": "Allow",
            "Action": self.actions,
            "Resource": resource,
        })
    }
}

/// An IAM role assumable by one service principal.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleSpec {
    logical_id: LogicalId,
    role_name: RoleName,
    trusted_service: String,
    managed_policies: Vec<ManagedPolicy>,
    inline_grants: Vec<PolicyStatement>,
    retention: Option<RemovalPolicy>,
}

impl RoleSpec {
    pub fn new(
        logical_id: LogicalId,
        role_name: RoleName,
        trusted_service: impl Into<String>,
    ) -> Self {
        Self {
            logical_id,
            role_name,
            trusted_service: trusted_service.into(),
            managed_policies: Vec::new(),
            inline_grants: Vec::new(),
            retention: None,
        }
    }

    /// A role for a Lambda function, with basic execution logging attached.
    pub fn for_lambda(logical_id: LogicalId, role_name: RoleName) -> Self {
        Self::new(logical_id, role_name, LAMBDA_SERVICE_PRINCIPAL)
            .with_managed_policy(ManagedPolicy::lambda_basic_execution())
    }

    pub fn with_managed_policy(mut self, policy: ManagedPolicy) -> Self {
        self.managed_policies.push(policy);
        self
    }

    pub fn with_grant(mut self, statement: PolicyStatement) -> Self {
        self.inline_grants.push(statement);
        self
    }

    pub fn with_retention(mut self, policy: RemovalPolicy) -> Self {
        self.retention = Some(policy);
        self
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn role_name(&self) -> &RoleName {
        &self.role_name
    }

    pub fn trusted_service(&self) -> &str {
        &self.trusted_service
    }

    pub fn managed_policies(&self) -> &[ManagedPolicy] {
        &self.managed_policies
    }

    pub fn inline_grants(&self) -> &[PolicyStatement] {
        &self.inline_grants
    }

    pub fn retention(&self) -> Option<RemovalPolicy> {
        self.retention
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.logical_id.clone(), ROLE_TYPE)
    }

    fn default_policy_name(&self) -> String {
        format!("{}DefaultPolicy", self.logical_id)
    }

    pub(crate) fn render(&self, tags: &BTreeMap<String, String>) -> Resource {
        let mut properties = json!({
            "RoleName": self.role_name,
            "AssumeRolePolicyDocument": {
                "Version": POLICY_VERSION,
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": self.trusted_service },
                    "Action": "sts:AssumeRole",
                }],
            },
        });

        if !self.managed_policies.is_empty() {
            properties["ManagedPolicyArns"] = Value::Array(
                self.managed_policies
                    .iter()
                    .map(ManagedPolicy::render)
                    .collect(),
            );
        }

        if !self.inline_grants.is_empty() {
            let statements: Vec<Value> =
                self.inline_grants.iter().map(PolicyStatement::render).collect();
            properties["Policies"] = json!([{
                "PolicyName": self.default_policy_name(),
                "PolicyDocument": {
                    "Version": POLICY_VERSION,
                    "Statement": statements,
                },
            }]);
        }

        if !tags.is_empty() {
            properties["Tags"] = render_tags(tags);
        }

        Resource::new(ROLE_TYPE, properties).with_removal_policy(self.retention)
    }
}
