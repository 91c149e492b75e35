use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use record_store_aws::adapters::dynamodb::DynamoDbTable;
use record_store_aws::handlers::invocation::{handle_invocation, ApiGatewayResponse};
use record_store_aws::logging::init_lambda_logging;
use record_store_core::settings::StoreSettings;
use record_store_core::TableService;
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<ApiGatewayResponse, Error> {
    let settings = StoreSettings::from_env();

    let response = handle_invocation(event.payload, settings, |settings| async move {
        Arc::new(DynamoDbTable::connect(&settings).await) as Arc<dyn TableService>
    })
    .await;
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
