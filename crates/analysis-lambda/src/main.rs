use analysis_core::DynamoStore;
use aws_lambda_events::apigw::ApiGatewayProxyRequest;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing_subscriber::EnvFilter;

mod errors;
mod handler;
mod response;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        // CloudWatch adds the ingestion time.
        .without_time()
        .with_target(false)
        .init();

    let store = DynamoStore::from_env().await?;
    tracing::info!(table = %store.table_name(), "send-analysis function ready");

    run(service_fn(|event: LambdaEvent<ApiGatewayProxyRequest>| {
        handler::send_analysis(&store, event)
    }))
    .await
}
