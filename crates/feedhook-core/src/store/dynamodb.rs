use std::collections::HashMap;
use std::sync::Mutex;

use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnConsumedCapacity};
use aws_sdk_dynamodb::Client;

use super::LinkStore;
use crate::config::StateConfig;
use crate::{Error, Result};

/// Partition key attribute of the state table
const KEY_ATTRIBUTE: &str = "linkID";
/// The single row holding the last link
const LATEST_KEY: &str = "latest";
const LINK_ATTRIBUTE: &str = "link";

/// Keeps the last link on a fixed row of a DynamoDB table
pub struct DynamoDbStore {
    client: Client,
    table: String,
    track_capacity: bool,
    consumed: Mutex<f64>,
}

impl DynamoDbStore {
    /// Build a client with static credentials from the state configuration
    pub fn new(table: impl Into<String>, config: &StateConfig) -> Result<Self> {
        let (access_key_id, secret_access_key) = match (
            config.aws_access_key_id.as_deref(),
            config.aws_secret_access_key.as_deref(),
        ) {
            (Some(id), Some(secret)) => (id, secret),
            _ => {
                return Err(Error::Config(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY are required for a dynamodb:// state"
                        .to_string(),
                ))
            }
        };

        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "environment");

        let mut builder = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .credentials_provider(credentials);

        if let Some(ref endpoint) = config.dynamodb_endpoint_url {
            tracing::info!("Using DynamoDB endpoint override: {}", endpoint);
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            table: table.into(),
            track_capacity: config.track_consumed_capacity,
            consumed: Mutex::new(0.0),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn tracks_capacity(&self) -> bool {
        self.track_capacity
    }

    /// Read capacity units consumed by `get` so far
    pub fn consumed(&self) -> f64 {
        self.consumed.lock().map(|units| *units).unwrap_or_default()
    }

    fn add_consumed(&self, units: f64) {
        if let Ok(mut total) = self.consumed.lock() {
            *total += units;
        }
    }
}

#[async_trait::async_trait]
impl LinkStore for DynamoDbStore {
    async fn get(&self) -> Result<String> {
        let mut request = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, AttributeValue::S(LATEST_KEY.to_string()))
            .projection_expression("#link")
            .expression_attribute_names("#link", LINK_ATTRIBUTE);

        if self.track_capacity {
            request = request.return_consumed_capacity(ReturnConsumedCapacity::Total);
        }

        let output = request.send().await.map_err(remote_error)?;

        if let Some(units) = output.consumed_capacity().and_then(|c| c.capacity_units()) {
            self.add_consumed(units);
        }

        Ok(link_from_item(output.item()))
    }

    async fn set(&self, link: &str) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .item(KEY_ATTRIBUTE, AttributeValue::S(LATEST_KEY.to_string()))
            .item(LINK_ATTRIBUTE, AttributeValue::S(link.to_string()))
            .send()
            .await
            .map_err(remote_error)?;

        tracing::debug!(table = %self.table, link = %link, "Stored last link");
        Ok(())
    }
}

/// Extract the link attribute; a missing row or attribute means no link yet
fn link_from_item(item: Option<&HashMap<String, AttributeValue>>) -> String {
    item.and_then(|attrs| attrs.get(LINK_ATTRIBUTE))
        .and_then(|value| value.as_s().ok())
        .cloned()
        .unwrap_or_default()
}

fn remote_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::RemoteStore(DisplayErrorContext(err).to_string())
}
