//! Connection options for key-value stores.

use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "localhost:2379";
const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and how to reach a key-value store.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stratum_sources::KvOptions;
///
/// let options = KvOptions::new("10.0.0.1:2379, 10.0.0.2:2379")
///     .with_prefix("/configuration/app")
///     .with_dial_timeout(Duration::from_secs(2));
///
/// assert_eq!(options.endpoints.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvOptions {
    /// Store endpoints.
    pub endpoints: Vec<String>,
    /// Key prefix read by the source and stripped from every key.
    pub prefix: String,
    /// Optional user name.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
    /// Timeout for establishing a connection.
    pub dial_timeout: Duration,
}

impl KvOptions {
    /// Creates options from a comma separated endpoint list.
    pub fn new(endpoints: &str) -> Self {
        let endpoints: Vec<String> = endpoints
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(String::from)
            .collect();

        if endpoints.is_empty() {
            return Self::default();
        }

        Self {
            endpoints,
            ..Self::default()
        }
    }

    /// Sets the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the dial timeout; a zero duration keeps the current value.
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.dial_timeout = timeout;
        }
        self
    }
}

impl Default for KvOptions {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            prefix: String::new(),
            username: None,
            password: None,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }
}
