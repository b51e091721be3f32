//! Client configuration.
//!
//! Everything that used to be process-wide (target environment, protocol
//! version, debug output) is a field of [`ClientConfig`] and fixed when the
//! client is built.

use crate::errors::{CsobError, Result};
use crate::protocol::ProtocolVersion;
use crate::types::{EetConfig, ReturnMethod};
use std::path::PathBuf;
use std::str::FromStr;

/// Production API host.
pub const PRODUCTION_URL: &str = "https://api.platebnibrana.csob.cz/api";

/// Sandbox (integration testing) API host.
pub const SANDBOX_URL: &str = "https://iapi.iplatebnibrana.csob.cz/api";

/// Which gateway deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Live payments.
    Production,
    /// Integration environment; no real money moves.
    #[default]
    Sandbox,
}

impl Environment {
    /// Versioned API base URL, e.g. `https://iapi.iplatebnibrana.csob.cz/api/v1.5`.
    pub fn base_url(self, version: ProtocolVersion) -> String {
        let host = match self {
            Self::Production => PRODUCTION_URL,
            Self::Sandbox => SANDBOX_URL,
        };
        format!("{}/{}", host, version.path_segment())
    }
}

impl FromStr for Environment {
    type Err = CsobError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "sandbox" | "test" | "testing" => Ok(Self::Sandbox),
            other => Err(CsobError::ConfigError(format!("unknown environment: {}", other))),
        }
    }
}

/// Configuration for a [`CsobClient`](crate::client::CsobClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Merchant identifier assigned by the gateway operator
    pub merchant_id: String,

    /// Path to the merchant's PEM private key
    pub private_key_path: PathBuf,

    /// Path to the gateway's PEM public key; responses are verified when set
    pub gateway_key_path: Option<PathBuf>,

    /// Target deployment
    pub environment: Environment,

    /// eAPI version
    pub protocol_version: ProtocolVersion,

    /// Where the customer returns after the payment page
    pub return_url: String,

    /// How the customer returns
    pub return_method: ReturnMethod,

    /// EET point of sale, if fiscal reporting is enabled for the merchant
    pub eet: Option<EetConfig>,

    /// Log full request and response bodies at debug level
    pub debug: bool,

    /// Overrides the environment's base URL (e.g. a local mock gateway)
    pub base_url: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration for the sandbox on eAPI 1.5.
    ///
    /// # Examples
    ///
    /// ```
    /// use csob_rs::config::{ClientConfig, Environment};
    /// use csob_rs::types::ReturnMethod;
    ///
    /// let config = ClientConfig::new("A1029DTmM7", "/etc/csob/rsa_A1029DTmM7.key")
    ///     .with_environment(Environment::Production)
    ///     .with_return_url(ReturnMethod::Post, "https://shop.example.com/paid");
    ///
    /// assert_eq!(config.base_url(), "https://api.platebnibrana.csob.cz/api/v1.5");
    /// ```
    pub fn new(merchant_id: impl Into<String>, private_key_path: impl Into<PathBuf>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            private_key_path: private_key_path.into(),
            gateway_key_path: None,
            environment: Environment::default(),
            protocol_version: ProtocolVersion::default(),
            return_url: String::new(),
            return_method: ReturnMethod::default(),
            eet: None,
            debug: false,
            base_url: None,
        }
    }

    /// Sets the target environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the protocol version.
    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Enables response verification with the gateway public key at `path`.
    pub fn with_gateway_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.gateway_key_path = Some(path.into());
        self
    }

    /// Sets the return URL and method.
    pub fn with_return_url(mut self, method: ReturnMethod, url: impl Into<String>) -> Self {
        self.return_method = method;
        self.return_url = url.into();
        self
    }

    /// Enables the EET extension on payment init.
    pub fn with_eet(mut self, premise_id: i64, cash_register_id: impl Into<String>) -> Self {
        self.eet = Some(EetConfig::new(premise_id, cash_register_id));
        self
    }

    /// Enables body logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Overrides the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// The versioned API base URL requests are sent to.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.environment.base_url(self.protocol_version),
        }
    }

    /// Reads the configuration from `CSOB_*` environment variables.
    ///
    /// `CSOB_MERCHANT_ID` and `CSOB_PRIVATE_KEY_PATH` are required; the
    /// others (`CSOB_GATEWAY_KEY_PATH`, `CSOB_ENVIRONMENT`,
    /// `CSOB_PROTOCOL_VERSION`, `CSOB_RETURN_URL`, `CSOB_RETURN_METHOD`,
    /// `CSOB_DEBUG`, `CSOB_BASE_URL`) fall back to the defaults of [`ClientConfig::new`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CsobError::ConfigError(format!("{} is not set", name)))
        };

        let mut config = Self::new(
            required("CSOB_MERCHANT_ID")?,
            required("CSOB_PRIVATE_KEY_PATH")?,
        );

        if let Some(path) = lookup("CSOB_GATEWAY_KEY_PATH") {
            config = config.with_gateway_key(path);
        }
        if let Some(env) = lookup("CSOB_ENVIRONMENT") {
            config = config.with_environment(env.parse()?);
        }
        if let Some(version) = lookup("CSOB_PROTOCOL_VERSION") {
            config = config.with_protocol_version(version.parse()?);
        }
        if let Some(url) = lookup("CSOB_RETURN_URL") {
            let method = match lookup("CSOB_RETURN_METHOD") {
                Some(method) => method.parse()?,
                None => ReturnMethod::default(),
            };
            config = config.with_return_url(method, url);
        }
        if let Some(debug) = lookup("CSOB_DEBUG") {
            config = config.with_debug(matches!(debug.trim(), "1" | "true" | "yes"));
        }
        if let Some(url) = lookup("CSOB_BASE_URL") {
            config = config.with_base_url(url);
        }

        Ok(config)
    }
}
