use analysis_core::{Analysis, AnalysisInputs, DynamoStore};
use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use lambda_runtime::{Error, LambdaEvent};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::errors::HandlerError;
use crate::response;

/// Body of `POST /send-analysis`.
#[derive(Debug, Deserialize)]
struct SendAnalysisRequest {
    inputs: AnalysisInputs,
}

/// Extract the calculator inputs from a request body.
pub fn parse_inputs(body: Option<&str>) -> Result<AnalysisInputs, HandlerError> {
    let body = body.ok_or(HandlerError::MissingBody)?;
    let request: SendAnalysisRequest = serde_json::from_str(body)?;
    Ok(request.inputs)
}

/// Store the submitted inputs as a new analysis and return its id.
async fn store_analysis(store: &DynamoStore, body: Option<&str>) -> Result<String, HandlerError> {
    let inputs = parse_inputs(body)?;
    let analysis = Analysis::new(inputs);
    store.put_analysis(&analysis).await?;
    Ok(analysis.id)
}

/// Lambda entry point for `POST /send-analysis`.
///
/// Failures are answered with a 500 response rather than a function error, so
/// the caller always receives the CORS headers.
pub async fn send_analysis(
    store: &DynamoStore,
    event: LambdaEvent<ApiGatewayProxyRequest>,
) -> Result<ApiGatewayProxyResponse, Error> {
    let (request, context) = event.into_parts();
    info!(
        request_id = %context.request_id,
        path = ?request.path,
        "received analysis"
    );
    debug!(body = ?request.body, "request body");

    match store_analysis(store, request.body.as_deref()).await {
        Ok(id) => {
            info!(id = %id, table = %store.table_name(), "stored analysis");
            Ok(response::success())
        }
        Err(e) => {
            error!(error = %e, "failed to process analysis");
            Ok(response::failure(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_inputs() {
        let body = json!({
            "inputs": {
                "propertyPrice": 1450000,
                "deposit": 145000,
                "initialRentalIncome": 12500,
                "vacancyMonths": 1,
                "commissionPercent": 8.5
            }
        })
        .to_string();

        let inputs = parse_inputs(Some(&body)).unwrap();
        assert_eq!(inputs.property_price, Some(1_450_000.0));
        assert_eq!(inputs.initial_rental_income, Some(12_500.0));
        assert_eq!(inputs.commission_percent, Some(8.5));
        assert_eq!(inputs.monthly_wifi, None);
    }

    #[test]
    fn empty_inputs_are_accepted() {
        let inputs = parse_inputs(Some(r#"{"inputs":{}}"#)).unwrap();
        assert_eq!(inputs, AnalysisInputs::default());
    }

    #[test]
    fn missing_body_is_rejected() {
        assert!(matches!(parse_inputs(None), Err(HandlerError::MissingBody)));
    }

    #[test]
    fn malformed_body_is_rejected() {
        assert!(matches!(
            parse_inputs(Some("not json")),
            Err(HandlerError::InvalidBody(_))
        ));
    }

    #[test]
    fn body_without_inputs_is_rejected() {
        assert!(matches!(
            parse_inputs(Some(r#"{"propertyPrice": 1}"#)),
            Err(HandlerError::InvalidBody(_))
        ));
    }

    #[test]
    fn non_numeric_input_is_rejected() {
        assert!(matches!(
            parse_inputs(Some(r#"{"inputs":{"deposit":"lots"}}"#)),
            Err(HandlerError::InvalidBody(_))
        ));
    }
}
