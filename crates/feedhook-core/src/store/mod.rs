//! Persistence of the last notified link
//!
//! Two backends share the [`LinkStore`] capability set: a local file and a
//! DynamoDB table. The backend is picked once at startup from the state URI.

mod dynamodb;
mod file;

pub use dynamodb::DynamoDbStore;
pub use file::{read_seed, FileStore};

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::{Error, Result};

const DYNAMODB_SCHEME: &str = "dynamodb://";

/// Get/set access to the last notified link
#[async_trait::async_trait]
pub trait LinkStore: Send + Sync {
    /// Last known link, or an empty string if nothing was ever stored
    async fn get(&self) -> Result<String>;

    /// Replace the last known link
    async fn set(&self, link: &str) -> Result<()>;
}

/// Parsed form of the state URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUri {
    File(PathBuf),
    DynamoDb { table: String },
}

impl StateUri {
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.is_empty() {
            return Err(Error::Config("STATE_URI is not specified".to_string()));
        }

        match uri.strip_prefix(DYNAMODB_SCHEME) {
            Some(table) => {
                let table = table.trim_end_matches('/');
                if table.is_empty() {
                    return Err(Error::Config(format!("missing table name in STATE_URI: {uri}")));
                }
                Ok(Self::DynamoDb {
                    table: table.to_string(),
                })
            }
            None => Ok(Self::File(PathBuf::from(uri))),
        }
    }
}

/// The configured store backend
pub enum StateStore {
    File(FileStore),
    DynamoDb(DynamoDbStore),
}

impl StateStore {
    /// Open the backend selected by `state.uri`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match StateUri::parse(&config.state.uri)? {
            StateUri::File(path) => Ok(Self::File(FileStore::open(path)?)),
            StateUri::DynamoDb { table } => {
                Ok(Self::DynamoDb(DynamoDbStore::new(table, &config.state)?))
            }
        }
    }

    /// Human readable label used in logs
    pub fn describe(&self) -> String {
        match self {
            StateStore::File(store) => format!("LocalFile {}", store.path().display()),
            StateStore::DynamoDb(store) => format!("DynamoDB table {}", store.table()),
        }
    }

    /// Log what the backend consumed over the process lifetime
    pub fn report_usage(&self) {
        if let StateStore::DynamoDb(store) = self {
            if store.tracks_capacity() {
                tracing::info!(read_units = store.consumed(), "DynamoDB consumed");
            }
        }
    }
}

#[async_trait::async_trait]
impl LinkStore for StateStore {
    async fn get(&self) -> Result<String> {
        match self {
            StateStore::File(store) => store.get().await,
            StateStore::DynamoDb(store) => store.get().await,
        }
    }

    async fn set(&self, link: &str) -> Result<()> {
        match self {
            StateStore::File(store) => store.set(link).await,
            StateStore::DynamoDb(store) => store.set(link).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dynamodb_uri() {
        let uri = StateUri::parse("dynamodb://feed-links").unwrap();
        assert_eq!(
            uri,
            StateUri::DynamoDb {
                table: "feed-links".to_string()
            }
        );
    }

    #[test]
    fn test_parse_file_uri() {
        let uri = StateUri::parse("/var/lib/feedhook/last_link").unwrap();
        assert_eq!(uri, StateUri::File(PathBuf::from("/var/lib/feedhook/last_link")));
    }

    #[test]
    fn test_parse_rejects_empty_values() {
        assert!(matches!(StateUri::parse(""), Err(Error::Config(_))));
        assert!(matches!(StateUri::parse("dynamodb://"), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_from_config_selects_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.txt");

        let mut config = AppConfig::default();
        config.state.uri = path.display().to_string();

        let store = StateStore::from_config(&config).unwrap();
        assert!(matches!(store, StateStore::File(_)));
        assert!(store.describe().starts_with("LocalFile "));

        store.set("https://blog.example.com/posts/1").await.unwrap();
        assert_eq!(store.get().await.unwrap(), "https://blog.example.com/posts/1");
    }

    #[tokio::test]
    async fn test_from_config_selects_dynamodb_backend() {
        let mut config = AppConfig::default();
        config.state.uri = "dynamodb://feed-links".to_string();
        config.state.aws_access_key_id = Some("AKIDEXAMPLE".to_string());
        config.state.aws_secret_access_key = Some("secret".to_string());

        let store = StateStore::from_config(&config).unwrap();
        assert_eq!(store.describe(), "DynamoDB table feed-links");
    }
}
