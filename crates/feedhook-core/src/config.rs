use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub health: HealthConfig,
    /// `.env` file applied during `load`, if one was found
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Where and how notifications are posted
#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL (HOOK_ENDPOINT)
    #[serde(default)]
    pub endpoint: String,
    /// Display name sent with each message
    #[serde(default)]
    pub username: String,
    /// Avatar image URL sent with each message
    #[serde(default)]
    pub avatar_url: String,
    /// Message template, `%s` is replaced by the item link
    #[serde(default = "default_message")]
    pub message: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            username: String::new(),
            avatar_url: String::new(),
            message: default_message(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed to poll (FEED_URL)
    #[serde(default)]
    pub url: String,
    /// Request timeout in seconds, the HTTP client default applies when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// HTTP proxy URL for feed fetching (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Local file path or `dynamodb://<table>`
    #[serde(default)]
    pub uri: String,
    /// Seed file for the in-memory last link (watch mode only)
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
    #[serde(default = "default_aws_region")]
    pub aws_region: String,
    #[serde(default)]
    pub aws_access_key_id: Option<String>,
    #[serde(default)]
    pub aws_secret_access_key: Option<String>,
    /// Endpoint override, e.g. a DynamoDB Local instance
    #[serde(default)]
    pub dynamodb_endpoint_url: Option<String>,
    /// Ask DynamoDB for consumed read capacity and report it on exit
    #[serde(default = "default_true")]
    pub track_consumed_capacity: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            seed_path: None,
            aws_region: default_aws_region(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            dynamodb_endpoint_url: None,
            track_consumed_capacity: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between the start of two poll cycles
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
    /// Overrides the per-command default (watch: recover, check: fail_fast)
    #[serde(default)]
    pub error_policy: Option<ErrorPolicy>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            error_policy: None,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Listen address of the /healthz endpoint
    #[serde(default = "default_health_addr")]
    pub addr: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            addr: default_health_addr(),
        }
    }
}

/// How a cycle reacts to fetch, transport and persistence failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log and carry on with the next cycle
    Recover,
    /// Return the error to the caller
    FailFast,
}

impl FromStr for ErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "recover" => Ok(Self::Recover),
            "fail_fast" | "fail-fast" | "strict" => Ok(Self::FailFast),
            other => Err(Error::Config(format!("unknown error policy: {other}"))),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Recover => write!(f, "recover"),
            ErrorPolicy::FailFast => write!(f, "fail_fast"),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_message() -> String {
    "%s".to_string()
}

fn default_aws_region() -> String {
    "eu-west-3".to_string()
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    60
}

fn default_health_addr() -> String {
    "0.0.0.0:8042".to_string()
}

impl AppConfig {
    /// Load configuration: defaults, then the TOML file, then `.env` and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
        } else if path.is_some() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        } else {
            Self::default()
        };

        config.env_file = env_file_result(dotenvy::dotenv())?;
        config.apply_env()?;

        Ok(config)
    }

    /// Get the configuration file path
    /// Always uses ~/.config/feedhook/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("feedhook")
            .join("config.toml")
    }

    /// Override fields with non-empty process environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override fields from an arbitrary variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("HOOK_ENDPOINT") {
            self.webhook.endpoint = v;
        }
        if let Some(v) = get("BOT_USERNAME") {
            self.webhook.username = v;
        }
        if let Some(v) = get("BOT_AVATAR_URL") {
            self.webhook.avatar_url = v;
        }
        if let Some(v) = get("BOT_MESSAGE") {
            self.webhook.message = v;
        }

        if let Some(v) = get("FEED_URL") {
            self.feed.url = v;
        }
        if let Some(v) = get("FEED_TIMEOUT_SECS") {
            self.feed.request_timeout_secs = Some(parse_var("FEED_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("FEED_PROXY_URL") {
            self.feed.proxy_url = Some(v);
        }

        if let Some(v) = get("STATE_URI") {
            self.state.uri = v;
        }
        if let Some(v) = get("LAST_LINK_PATH") {
            self.state.seed_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("AWS_REGION") {
            self.state.aws_region = v;
        }
        if let Some(v) = get("AWS_ACCESS_KEY_ID") {
            self.state.aws_access_key_id = Some(v);
        }
        if let Some(v) = get("AWS_SECRET_ACCESS_KEY") {
            self.state.aws_secret_access_key = Some(v);
        }
        if let Some(v) = get("DYNAMODB_ENDPOINT_URL") {
            self.state.dynamodb_endpoint_url = Some(v);
        }
        if let Some(v) = get("TRACK_CONSUMED_CAPACITY") {
            self.state.track_consumed_capacity = parse_var("TRACK_CONSUMED_CAPACITY", &v)?;
        }

        if let Some(v) = get("POLL_INTERVAL_SECS") {
            self.poll.interval_secs = parse_var("POLL_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = get("ERROR_POLICY") {
            self.poll.error_policy = Some(v.parse()?);
        }

        if let Some(v) = get("HEALTH_ADDR") {
            self.health.addr = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.general.log_level = v;
        }

        Ok(())
    }

    /// Check that everything needed to poll and notify is present
    pub fn validate(&self) -> Result<()> {
        if self.webhook.endpoint.is_empty() {
            return Err(Error::Config("HOOK_ENDPOINT is not specified".to_string()));
        }
        if self.feed.url.is_empty() {
            return Err(Error::Config("FEED_URL is not specified".to_string()));
        }
        self.validate_state()?;
        if self.poll.interval_secs == 0 {
            return Err(Error::Config(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Check only what the state store needs
    pub fn validate_state(&self) -> Result<()> {
        if self.state.uri.is_empty() {
            return Err(Error::Config("STATE_URI is not specified".to_string()));
        }
        Ok(())
    }

    /// Error policy for a command, honoring an explicit override
    pub fn error_policy_or(&self, default: ErrorPolicy) -> ErrorPolicy {
        self.poll.error_policy.unwrap_or(default)
    }

    pub fn redacted(&self) -> Redacted<'_> {
        Redacted(self)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| Error::Config(format!("failed to parse {key}='{value}': {e}")))
}

/// A missing `.env` is fine; a malformed one stops loading halfway, so it is fatal
fn env_file_result(
    result: std::result::Result<PathBuf, dotenvy::Error>,
) -> Result<Option<PathBuf>> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(Error::Config(format!("failed to load .env: {e}"))),
    }
}

/// Debug view of the configuration with secrets masked
pub struct Redacted<'a>(&'a AppConfig);

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.0;
        f.debug_struct("AppConfig")
            .field("webhook_endpoint", &mask(&c.webhook.endpoint))
            .field("username", &c.webhook.username)
            .field("avatar_url", &c.webhook.avatar_url)
            .field("message", &c.webhook.message)
            .field("feed_url", &c.feed.url)
            .field("state_uri", &c.state.uri)
            .field("seed_path", &c.state.seed_path)
            .field("aws_region", &c.state.aws_region)
            .field(
                "aws_access_key_id",
                &c.state.aws_access_key_id.as_deref().map(mask),
            )
            .field(
                "aws_secret_access_key",
                &c.state.aws_secret_access_key.as_deref().map(mask),
            )
            .field("interval_secs", &c.poll.interval_secs)
            .field("error_policy", &c.poll.error_policy)
            .field("health_addr", &c.health.addr)
            .field("env_file", &c.env_file)
            .finish()
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("endpoint", &mask(&self.endpoint))
            .field("username", &self.username)
            .field("avatar_url", &self.avatar_url)
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Debug for StateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateConfig")
            .field("uri", &self.uri)
            .field("seed_path", &self.seed_path)
            .field("aws_region", &self.aws_region)
            .field("aws_access_key_id", &self.aws_access_key_id.as_deref().map(mask))
            .field("aws_secret_access_key", &self.aws_secret_access_key.as_deref().map(mask))
            .field("dynamodb_endpoint_url", &self.dynamodb_endpoint_url)
            .field("track_consumed_capacity", &self.track_consumed_capacity)
            .finish()
    }
}

// Webhook URLs carry their token in the path, so they are masked like keys.
fn mask(s: &str) -> String {
    match s.char_indices().nth(12) {
        Some((idx, _)) => format!("{}***", &s[..idx]),
        None if s.is_empty() => String::new(),
        None => "***".into(),
    }
}
