use aws_lambda_events::apigw::ApiGatewayProxyResponse;
use aws_lambda_events::encodings::Body;
use http::HeaderMap;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE, HeaderValue,
};
use serde_json::{Value, json};

use crate::errors::HandlerError;

/// Headers sent on every response from the function.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// A proxy response with a JSON body and the CORS headers.
pub fn json_response(status_code: i64, body: &Value) -> ApiGatewayProxyResponse {
    let mut response = ApiGatewayProxyResponse::default();
    response.status_code = status_code;
    response.headers = cors_headers();
    response.body = Some(Body::Text(body.to_string()));
    response.is_base64_encoded = false;
    response
}

pub fn success() -> ApiGatewayProxyResponse {
    json_response(200, &json!({ "message": "Success" }))
}

/// Every failure is reported as a 500 with the error text.
pub fn failure(err: &HandlerError) -> ApiGatewayProxyResponse {
    json_response(
        500,
        &json!({
            "message": "Error storing analysis",
            "error": err.to_string(),
        }),
    )
}
