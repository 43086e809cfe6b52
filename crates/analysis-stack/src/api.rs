use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use crate::error::StackError;
use crate::function::FunctionSpec;
use crate::name::{ApiName, LogicalId, NameError, PathPart, StageName};
use crate::template::{
    Resource, ResourceRef, account_id, concat, partition, reference, region, render_tags,
};

pub const REST_API_TYPE: &str = "AWS::ApiGateway::RestApi";
pub const API_RESOURCE_TYPE: &str = "AWS::ApiGateway::Resource";
pub const METHOD_TYPE: &str = "AWS::ApiGateway::Method";
pub const DEPLOYMENT_TYPE: &str = "AWS::ApiGateway::Deployment";
pub const STAGE_TYPE: &str = "AWS::ApiGateway::Stage";
pub const PERMISSION_TYPE: &str = "AWS::Lambda::Permission";

const API_GATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";

/// Hex characters of the shape hash appended to the deployment id.
const DEPLOYMENT_HASH_LEN: usize = 16;

/// Headers allowed by default in CORS preflight responses.
pub const DEFAULT_CORS_HEADERS: [&str; 6] = [
    "Content-Type",
    "X-Amz-Date",
    "Authorization",
    "X-Api-Key",
    "X-Amz-Security-Token",
    "X-Amz-User-Agent",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HttpMethod {
    Options,
    Get,
    Put,
    Post,
    Delete,
    Patch,
    Head,
}

impl HttpMethod {
    /// Every method, in preflight order.
    pub const ALL: [HttpMethod; 7] = [
        Self::Options,
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Patch,
        Self::Head,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Options => "OPTIONS",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
        }
    }
}

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

/// Origin value that allows every caller.
pub const ALL_ORIGINS: &str = "*";

/// CORS preflight configuration, answered by a mock `OPTIONS` method on
/// every API resource.
///
/// The origin list is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_origins: Vec<String>,
    pub allow_methods: Vec<HttpMethod>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
    pub status_code: u16,
}

impl CorsPolicy {
    /// All origins, all methods, the default headers, credentials allowed.
    pub fn permissive() -> Self {
        Self {
            allow_origins: vec![ALL_ORIGINS.to_string()],
            allow_methods: HttpMethod::ALL.to_vec(),
            allow_headers: DEFAULT_CORS_HEADERS.iter().map(|h| h.to_string()).collect(),
            allow_credentials: true,
            status_code: 204,
        }
    }

    /// Replace the allowed origins. Fails if `origins` is empty.
    pub fn with_origins<I, S>(mut self, origins: I) -> Result<Self, StackError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: Vec<String> = origins.into_iter().map(Into::into).collect();
        if origins.is_empty() {
            return Err(StackError::EmptyCorsOrigins);
        }
        self.allow_origins = origins;
        Ok(self)
    }

    pub fn allow_origins(&self) -> &[String] {
        &self.allow_origins
    }

    fn primary_origin(&self) -> &str {
        self.allow_origins.first().map(String::as_str).unwrap_or(ALL_ORIGINS)
    }

    /// Header name to quoted static value, as API Gateway expects for
    /// integration response parameters.
    fn headers(&self) -> BTreeMap<&'static str, String> {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Access-Control-Allow-Headers",
            format!("'{}'", self.allow_headers.join(",")),
        );
        // The first origin is the static answer; the others are echoed by
        // the response template.
        let origin = self.primary_origin();
        headers.insert("Access-Control-Allow-Origin", format!("'{origin}'"));
        if origin != ALL_ORIGINS {
            headers.insert("Vary", "'Origin'".to_string());
        }
        let methods: Vec<&str> = self.allow_methods.iter().map(|m| m.as_str()).collect();
        headers.insert(
            "Access-Control-Allow-Methods",
            format!("'{}'", methods.join(",")),
        );
        if self.allow_credentials {
            headers.insert("Access-Control-Allow-Credentials", "'true'".to_string());
        }
        headers
    }

    /// VTL that answers with the caller's origin when it is one of the
    /// additional allowed origins.
    fn origin_template(&self) -> Option<String> {
        let others = self.allow_origins.get(1..).filter(|o| !o.is_empty())?;
        let condition = others
            .iter()
            .map(|o| format!("$origin == \"{o}\""))
            .collect::<Vec<_>>()
            .join(" || ");
        Some(format!(
            "#set($origin = $input.params().header.get(\"Origin\"))\n\
             #if($origin == \"\") #set($origin = $input.params().header.get(\"origin\")) #end\n\
             #if({condition})\n  \
             #set($context.responseOverride.header.Access-Control-Allow-Origin = $origin)\n\
             #end"
        ))
    }

    fn render_preflight(&self, resource_id: Value, rest_api_id: Value) -> Value {
        let headers = self.headers();
        let integration_params: Map<String, Value> = headers
            .iter()
            .map(|(name, value)| (format!("method.response.header.{name}"), json!(value)))
            .collect();
        let method_params: Map<String, Value> = headers
            .keys()
            .map(|name| (format!("method.response.header.{name}"), json!(true)))
            .collect();
        let status = self.status_code.to_string();

        let mut integration_response = json!({
            "StatusCode": status,
            "ResponseParameters": integration_params,
        });
        if let Some(template) = self.origin_template() {
            integration_response["ResponseTemplates"] = json!({ "application/json": template });
        }

        json!({
            "HttpMethod": HttpMethod::Options.as_str(),
            "ResourceId": resource_id,
            "RestApiId": rest_api_id,
            "AuthorizationType": "NONE",
            "Integration": {
                "Type": "MOCK",
                "RequestTemplates": { "application/json": "{ statusCode: 200 }" },
                "IntegrationResponses": [integration_response],
            },
            "MethodResponses": [{
                "StatusCode": status,
                "ResponseParameters": method_params,
            }],
        })
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Logical ids of the resources backing one path under the API root.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathIds {
    resource: LogicalId,
    preflight: LogicalId,
}

/// One method on one path, proxied to a Lambda function.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    path: PathPart,
    method: HttpMethod,
    target: ResourceRef,
    method_id: LogicalId,
    permission_id: LogicalId,
}

impl Route {
    pub fn path(&self) -> &PathPart {
        &self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn target(&self) -> &ResourceRef {
        &self.target
    }

    pub fn method_id(&self) -> &LogicalId {
        &self.method_id
    }
}

fn derive_id(parts: &[&str]) -> Result<LogicalId, NameError> {
    LogicalId::new(parts.concat())
}

// ---------------------------------------------------------------------------
// ApiSpec
// ---------------------------------------------------------------------------

/// A REST API with single-segment paths under its root, deployed to one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSpec {
    logical_id: LogicalId,
    api_name: ApiName,
    stage_name: StageName,
    cors: Option<CorsPolicy>,
    paths: BTreeMap<PathPart, PathIds>,
    routes: Vec<Route>,
    root_preflight_id: LogicalId,
    stage_id: LogicalId,
}

impl ApiSpec {
    pub fn new(
        logical_id: LogicalId,
        api_name: ApiName,
        stage_name: StageName,
    ) -> Result<Self, NameError> {
        let id = logical_id.as_str();
        // The hashed deployment id must fit too.
        derive_id(&[id, "Deployment", &"0".repeat(DEPLOYMENT_HASH_LEN)])?;
        Ok(Self {
            root_preflight_id: derive_id(&[id, "RootOPTIONSMethod"])?,
            stage_id: derive_id(&[id, "Stage"])?,
            logical_id,
            api_name,
            stage_name,
            cors: None,
            paths: BTreeMap::new(),
            routes: Vec::new(),
        })
    }

    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Add `method /path`, proxied to `target`.
    pub fn with_route(
        mut self,
        path: PathPart,
        method: HttpMethod,
        target: &FunctionSpec,
    ) -> Result<Self, NameError> {
        let api = self.logical_id.as_str();
        let pascal = path.to_pascal_case();

        if !self.paths.contains_key(&path) {
            let ids = PathIds {
                resource: derive_id(&[api, &pascal, "Resource"])?,
                preflight: derive_id(&[api, &pascal, "OPTIONSMethod"])?,
            };
            self.paths.insert(path.clone(), ids);
        }

        let route = Route {
            method_id: derive_id(&[api, &pascal, method.as_str(), "Method"])?,
            permission_id: derive_id(&[api, &pascal, method.as_str(), "Permission"])?,
            path,
            method,
            target: target.reference(),
        };
        self.routes.push(route);
        Ok(self)
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn api_name(&self) -> &ApiName {
        &self.api_name
    }

    pub fn stage_name(&self) -> &StageName {
        &self.stage_name
    }

    pub fn cors(&self) -> Option<&CorsPolicy> {
        self.cors.as_ref()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.logical_id.clone(), REST_API_TYPE)
    }

    /// Render the API, its path resources, methods, deployment, stage and the
    /// invoke permissions on each integrated function.
    pub(crate) fn render(
        &self,
        tags: &BTreeMap<String, String>,
    ) -> Result<Vec<(LogicalId, Resource)>, NameError> {
        let mut out = Vec::new();
        let api = self.reference();
        let mut method_ids = Vec::new();

        let mut api_props = json!({ "Name": self.api_name });
        if !tags.is_empty() {
            api_props["Tags"] = render_tags(tags);
        }
        out.push((self.logical_id.clone(), Resource::new(REST_API_TYPE, api_props)));

        if let Some(cors) = &self.cors {
            let props = cors.render_preflight(api.attribute("RootResourceId"), api.name());
            out.push((
                self.root_preflight_id.clone(),
                Resource::new(METHOD_TYPE, props),
            ));
            method_ids.push(self.root_preflight_id.clone());
        }

        for (path, ids) in &self.paths {
            let props = json!({
                "ParentId": api.attribute("RootResourceId"),
                "PathPart": path,
                "RestApiId": api.name(),
            });
            out.push((ids.resource.clone(), Resource::new(API_RESOURCE_TYPE, props)));

            if let Some(cors) = &self.cors {
                let props = cors.render_preflight(reference(&ids.resource), api.name());
                out.push((ids.preflight.clone(), Resource::new(METHOD_TYPE, props)));
                method_ids.push(ids.preflight.clone());
            }
        }

        for route in &self.routes {
            let Some(ids) = self.paths.get(&route.path) else {
                continue;
            };

            let props = json!({
                "HttpMethod": route.method.as_str(),
                "ResourceId": reference(&ids.resource),
                "RestApiId": api.name(),
                "AuthorizationType": "NONE",
                "Integration": {
                    "Type": "AWS_PROXY",
                    "IntegrationHttpMethod": "POST",
                    "Uri": concat(vec![
                        json!("arn:"),
                        partition(),
                        json!(":apigateway:"),
                        region(),
                        json!(":lambda:path/2015-03-31/functions/"),
                        route.target.arn(),
                        json!("/invocations"),
                    ]),
                },
            });
            out.push((route.method_id.clone(), Resource::new(METHOD_TYPE, props)));
            method_ids.push(route.method_id.clone());

            let props = json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": route.target.arn(),
                "Principal": API_GATEWAY_PRINCIPAL,
                "SourceArn": concat(vec![
                    json!("arn:"),
                    partition(),
                    json!(":execute-api:"),
                    region(),
                    json!(":"),
                    account_id(),
                    json!(":"),
                    api.name(),
                    json!("/"),
                    reference(&self.stage_id),
                    json!(format!("/{}/{}", route.method.as_str(), route.path)),
                ]),
            });
            out.push((route.permission_id.clone(), Resource::new(PERMISSION_TYPE, props)));
        }

        // New id whenever a method or path resource changes.
        let deployment_id = derive_id(&[
            self.logical_id.as_str(),
            "Deployment",
            &shape_fingerprint(&out),
        ])?;
        let mut deployment = Resource::new(
            DEPLOYMENT_TYPE,
            json!({
                "RestApiId": api.name(),
                "Description": format!("Deployment of {}", self.api_name),
            }),
        );
        for id in &method_ids {
            deployment = deployment.depends_on(id);
        }
        out.push((deployment_id.clone(), deployment));

        out.push((
            self.stage_id.clone(),
            Resource::new(
                STAGE_TYPE,
                json!({
                    "RestApiId": api.name(),
                    "DeploymentId": reference(&deployment_id),
                    "StageName": self.stage_name,
                }),
            ),
        ));

        Ok(out)
    }
}

/// Hex digest of every rendered path resource and method, truncated to
/// `DEPLOYMENT_HASH_LEN` characters.
fn shape_fingerprint(resources: &[(LogicalId, Resource)]) -> String {
    let mut hasher = Sha256::new();
    for (id, resource) in resources {
        if resource.kind != METHOD_TYPE && resource.kind != API_RESOURCE_TYPE {
            continue;
        }
        hasher.update(id.as_str().as_bytes());
        hasher.update(resource.properties.to_string().as_bytes());
    }
    let mut digest = hex::encode_upper(hasher.finalize());
    digest.truncate(DEPLOYMENT_HASH_LEN);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{CodeAsset, Runtime};
    use crate::role::ROLE_TYPE;

    fn function() -> FunctionSpec {
        FunctionSpec::new(
            LogicalId::new("Worker").unwrap(),
            crate::name::FunctionName::new("worker").unwrap(),
            Runtime::ProvidedAl2023,
            "bootstrap",
            CodeAsset::from_path("bundle"),
            ResourceRef::new(LogicalId::new("WorkerRole").unwrap(), ROLE_TYPE),
        )
    }

    fn api() -> ApiSpec {
        ApiSpec::new(
            LogicalId::new("Api").unwrap(),
            ApiName::new("demo-api").unwrap(),
            StageName::new("prod").unwrap(),
        )
        .unwrap()
    }

    fn rendered(spec: &ApiSpec) -> BTreeMap<String, Resource> {
        spec.render(&BTreeMap::new())
            .unwrap()
            .into_iter()
            .map(|(id, r)| (id.to_string(), r))
            .collect()
    }

    fn deployment_id(resources: &BTreeMap<String, Resource>) -> &str {
        let mut deployments = resources.iter().filter(|(_, r)| r.kind == DEPLOYMENT_TYPE);
        let (id, _) = deployments.next().unwrap();
        assert!(deployments.next().is_none());
        id
    }

    #[test]
    fn permissive_cors_headers() {
        let headers = CorsPolicy::permissive().headers();
        assert_eq!(headers["Access-Control-Allow-Origin"], "'*'");
        assert_eq!(
            headers["Access-Control-Allow-Methods"],
            "'OPTIONS,GET,PUT,POST,DELETE,PATCH,HEAD'"
        );
        assert_eq!(
            headers["Access-Control-Allow-Headers"],
            "'Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token,X-Amz-User-Agent'"
        );
        assert_eq!(headers["Access-Control-Allow-Credentials"], "'true'");
        assert!(!headers.contains_key("Vary"));
    }

    #[test]
    fn specific_origin_varies_on_origin() {
        let cors = CorsPolicy::permissive()
            .with_origins(["https://app.example.com"])
            .unwrap();
        let headers = cors.headers();
        assert_eq!(headers["Access-Control-Allow-Origin"], "'https://app.example.com'");
        assert_eq!(headers["Vary"], "'Origin'");
        assert_eq!(cors.origin_template(), None);
    }

    #[test]
    fn empty_origins_rejected() {
        let result = CorsPolicy::permissive().with_origins(Vec::<String>::new());
        assert!(matches!(result, Err(StackError::EmptyCorsOrigins)));
    }

    #[test]
    fn additional_origins_echoed_by_template() {
        let cors = CorsPolicy::permissive()
            .with_origins(["https://a.example.com", "https://b.example.com"])
            .unwrap();
        assert_eq!(cors.headers()["Access-Control-Allow-Origin"], "'https://a.example.com'");

        let props = cors.render_preflight(json!("root"), json!("api"));
        let response = &props["Integration"]["IntegrationResponses"][0];
        let template = response["ResponseTemplates"]["application/json"].as_str().unwrap();
        assert!(template.contains("$origin == \"https://b.example.com\""));
        assert!(!template.contains("https://a.example.com"));
    }

    #[test]
    fn credentials_header_omitted_when_disallowed() {
        let cors = CorsPolicy {
            allow_credentials: false,
            ..CorsPolicy::permissive()
        };
        assert!(!cors.headers().contains_key("Access-Control-Allow-Credentials"));
    }

    #[test]
    fn route_renders_proxy_integration() {
        let spec = api()
            .with_route(PathPart::new("jobs").unwrap(), HttpMethod::Post, &function())
            .unwrap();
        let resources = rendered(&spec);

        let path = &resources["ApiJobsResource"];
        assert_eq!(path.kind, API_RESOURCE_TYPE);
        assert_eq!(path.properties["PathPart"], "jobs");
        assert_eq!(
            path.properties["ParentId"],
            json!({ "Fn::GetAtt": ["Api", "RootResourceId"] })
        );

        let method = &resources["ApiJobsPOSTMethod"];
        assert_eq!(method.properties["HttpMethod"], "POST");
        assert_eq!(method.properties["ResourceId"], json!({ "Ref": "ApiJobsResource" }));
        assert_eq!(method.properties["Integration"]["Type"], "AWS_PROXY");
        assert_eq!(
            method.properties["Integration"]["Uri"]["Fn::Join"][1][5],
            json!({ "Fn::GetAtt": ["Worker", "Arn"] })
        );

        let permission = &resources["ApiJobsPOSTPermission"];
        assert_eq!(permission.kind, PERMISSION_TYPE);
        assert_eq!(
            permission.properties["FunctionName"],
            json!({ "Fn::GetAtt": ["Worker", "Arn"] })
        );
        assert_eq!(
            permission.properties["SourceArn"]["Fn::Join"][1][10],
            "/POST/jobs"
        );
    }

    #[test]
    fn no_preflight_without_cors() {
        let spec = api()
            .with_route(PathPart::new("jobs").unwrap(), HttpMethod::Post, &function())
            .unwrap();
        let resources = rendered(&spec);
        assert!(!resources.contains_key("ApiRootOPTIONSMethod"));
        assert!(!resources.contains_key("ApiJobsOPTIONSMethod"));
        assert_eq!(
            resources[deployment_id(&resources)].depends_on,
            vec!["ApiJobsPOSTMethod".to_string()]
        );
    }

    #[test]
    fn cors_adds_preflight_on_root_and_paths() {
        let spec = api()
            .with_cors(CorsPolicy::permissive())
            .with_route(PathPart::new("jobs").unwrap(), HttpMethod::Post, &function())
            .unwrap();
        let resources = rendered(&spec);

        let root = &resources["ApiRootOPTIONSMethod"];
        assert_eq!(root.properties["HttpMethod"], "OPTIONS");
        assert_eq!(root.properties["Integration"]["Type"], "MOCK");
        assert_eq!(
            root.properties["Integration"]["IntegrationResponses"][0]["StatusCode"],
            "204"
        );
        assert_eq!(
            root.properties["MethodResponses"][0]["ResponseParameters"]
                ["method.response.header.Access-Control-Allow-Origin"],
            true
        );

        let preflight = &resources["ApiJobsOPTIONSMethod"];
        assert_eq!(
            preflight.properties["ResourceId"],
            json!({ "Ref": "ApiJobsResource" })
        );
        assert_eq!(
            preflight.properties["Integration"]["IntegrationResponses"][0]["ResponseParameters"]
                ["method.response.header.Access-Control-Allow-Credentials"],
            "'true'"
        );

        assert_eq!(
            resources[deployment_id(&resources)].depends_on,
            vec![
                "ApiRootOPTIONSMethod".to_string(),
                "ApiJobsOPTIONSMethod".to_string(),
                "ApiJobsPOSTMethod".to_string(),
            ]
        );
    }

    #[test]
    fn stage_points_at_deployment() {
        let resources = rendered(&api());
        let stage = &resources["ApiStage"];
        assert_eq!(stage.kind, STAGE_TYPE);
        assert_eq!(stage.properties["StageName"], "prod");
        assert_eq!(
            stage.properties["DeploymentId"],
            json!({ "Ref": deployment_id(&resources) })
        );
    }

    #[test]
    fn deployment_id_is_prefixed_hash() {
        let resources = rendered(&api());
        let id = deployment_id(&resources);
        let suffix = id.strip_prefix("ApiDeployment").unwrap();
        assert_eq!(suffix.len(), DEPLOYMENT_HASH_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn adding_a_route_redeploys() {
        let f = function();
        let post = api()
            .with_route(PathPart::new("jobs").unwrap(), HttpMethod::Post, &f)
            .unwrap();
        let both = post
            .clone()
            .with_route(PathPart::new("jobs").unwrap(), HttpMethod::Get, &f)
            .unwrap();

        let before = rendered(&post);
        let after = rendered(&both);
        let (old_id, new_id) = (deployment_id(&before), deployment_id(&after));
        assert_ne!(old_id, new_id);
        assert_eq!(after["ApiStage"].properties["DeploymentId"], json!({ "Ref": new_id }));

        // Same shape, same deployment.
        assert_eq!(deployment_id(&rendered(&post)), old_id);
    }

    #[test]
    fn enabling_cors_redeploys() {
        let f = function();
        let plain = api()
            .with_route(PathPart::new("jobs").unwrap(), HttpMethod::Post, &f)
            .unwrap();
        let with_cors = plain.clone().with_cors(CorsPolicy::permissive());
        assert_ne!(deployment_id(&rendered(&plain)), deployment_id(&rendered(&with_cors)));
    }

    #[test]
    fn overlong_api_id_rejected_up_front() {
        let id = LogicalId::new("A".repeat(240)).unwrap();
        let result = ApiSpec::new(
            id,
            ApiName::new("demo-api").unwrap(),
            StageName::new("prod").unwrap(),
        );
        assert!(matches!(result, Err(NameError::Length { .. })));
    }

    #[test]
    fn shared_path_gets_one_resource() {
        let f = function();
        let spec = api()
            .with_route(PathPart::new("jobs").unwrap(), HttpMethod::Post, &f)
            .unwrap()
            .with_route(PathPart::new("jobs").unwrap(), HttpMethod::Get, &f)
            .unwrap();
        let resources = rendered(&spec);
        let paths = resources
            .values()
            .filter(|r| r.kind == API_RESOURCE_TYPE)
            .count();
        assert_eq!(paths, 1);
        assert!(resources.contains_key("ApiJobsGETMethod"));
        assert!(resources.contains_key("ApiJobsPOSTMethod"));
    }
}
