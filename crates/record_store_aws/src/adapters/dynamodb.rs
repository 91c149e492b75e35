use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::timeout::TimeoutConfig;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use record_store_core::contract::{PARTITION_KEY, SORT_KEY};
use record_store_core::error::StoreOperation;
use record_store_core::settings::StoreSettings;
use record_store_core::{ContinuationToken, Record, RecordKey, ScanPage, StoreError, TableService};

type Item = HashMap<String, AttributeValue>;

/// `TableService` backed by a DynamoDB table with string `pk`/`sk` keys.
///
/// The SDK client is cheap to clone and pools its connections, so one
/// instance can be shared by every request a process serves.
#[derive(Clone, Debug)]
pub struct DynamoDbTable {
    client: Client,
}

impl DynamoDbTable {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Loads the default AWS configuration chain and applies the endpoint and
    /// timeout overrides from `settings`.
    pub async fn connect(settings: &StoreSettings) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::from_sdk_config(&sdk_config, settings)
    }

    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig, settings: &StoreSettings) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let Some(timeout_ms) = settings.timeout_ms {
            let timeout_config = TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build();
            builder = builder.timeout_config(timeout_config);
        }

        Self::new(Client::from_conf(builder.build()))
    }
}

fn key_item(key: &RecordKey) -> Item {
    HashMap::from([
        (
            PARTITION_KEY.to_string(),
            AttributeValue::S(key.pk().to_string()),
        ),
        (SORT_KEY.to_string(), AttributeValue::S(key.sk().to_string())),
    ])
}

fn record_to_item(operation: StoreOperation, record: &Record) -> Result<Item, StoreError> {
    serde_dynamo::to_item(record).map_err(|error| StoreError::codec(operation, error.to_string()))
}

fn item_to_record(operation: StoreOperation, item: Item) -> Result<Record, StoreError> {
    serde_dynamo::from_item(item).map_err(|error| StoreError::codec(operation, error.to_string()))
}

fn sdk_failure(operation: StoreOperation, error: impl std::error::Error) -> StoreError {
    StoreError::backend(operation, DisplayErrorContext(&error).to_string())
}

#[async_trait]
impl TableService for DynamoDbTable {
    async fn get_item(&self, table: &str, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key_item(key)))
            .send()
            .await
            .map_err(|error| sdk_failure(StoreOperation::GetItem, error))?;

        output
            .item
            .map(|item| item_to_record(StoreOperation::GetItem, item))
            .transpose()
    }

    async fn put_item(&self, table: &str, item: Record) -> Result<(), StoreError> {
        let item = record_to_item(StoreOperation::PutItem, &item)?;

        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| sdk_failure(StoreOperation::PutItem, error))
    }

    async fn scan_page(
        &self,
        table: &str,
        start: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        let exclusive_start_key = start
            .map(|token| record_to_item(StoreOperation::Scan, token.position()))
            .transpose()?;

        let output = self
            .client
            .scan()
            .table_name(table)
            .set_exclusive_start_key(exclusive_start_key)
            .send()
            .await
            .map_err(|error| sdk_failure(StoreOperation::Scan, error))?;

        let items = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| item_to_record(StoreOperation::Scan, item))
            .collect::<Result<Vec<_>, _>>()?;

        let continuation = match output.last_evaluated_key {
            Some(key) if !key.is_empty() => Some(ContinuationToken::new(item_to_record(
                StoreOperation::Scan,
                key,
            )?)),
            _ => None,
        };

        Ok(ScanPage {
            items,
            continuation,
        })
    }
}
