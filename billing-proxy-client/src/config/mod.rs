//! Billing proxy client configuration.
//!
//! [`ServiceConfig`] is the immutable configuration a transport is built from.
//! It has two named constructors matching the two ways a deployment locates
//! its proxy:
//!
//! - [`ServiceConfig::with_urls`]: one or more candidate base URLs validated
//!   against the platform trust store (or per-URL trust roots)
//! - [`ServiceConfig::with_trust_root`]: a single base URL whose certificate
//!   chain must lead to the supplied root
//!
//! [`ClientConfig`] is the TOML file form of the same settings.

use std::{env, fmt, path::Path};

use reqwest::Certificate;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroize;

use crate::error::{BillingError, Result};

pub mod endpoints;
pub mod http;

pub use endpoints::EndpointConfig;
pub use http::{HttpConfig, HttpVersion};

/// Certificate the proxy's TLS chain must lead to.
///
/// Supplying a trust root disables the platform's built-in roots for that URL.
#[derive(Clone)]
pub struct TrustRoot {
    certificate: Certificate,
}

impl fmt::Debug for TrustRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustRoot").finish_non_exhaustive()
    }
}

impl TrustRoot {
    /// Loads a PEM-encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if the bytes are not a PEM certificate.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let certificate = Certificate::from_pem(pem)
            .map_err(|e| BillingError::invalid(format!("invalid trust root certificate: {e}")))?;
        Ok(Self { certificate })
    }

    /// Loads a PEM-encoded certificate from a file.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if the file cannot be read or parsed.
    pub fn from_pem_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|e| {
            BillingError::invalid(format!("cannot read trust root {}: {e}", path.display()))
        })?;
        Self::from_pem(&pem)
    }

    pub(crate) fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}

/// Candidate base URL of the billing proxy.
#[derive(Debug, Clone)]
pub struct ServiceUrl {
    url: Url,
    trust_root: Option<TrustRoot>,
}

impl ServiceUrl {
    /// Parses a base URL. Only `http` and `https` are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if the URL does not parse, has
    /// no host, or uses another scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use billing_proxy_client::config::ServiceUrl;
    ///
    /// let url = ServiceUrl::new("https://billing.example.org")?;
    /// assert_eq!(url.url().host_str(), Some("billing.example.org"));
    /// assert!(ServiceUrl::new("ftp://billing.example.org").is_err());
    /// # Ok::<(), billing_proxy_client::BillingError>(())
    /// ```
    pub fn new(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| BillingError::invalid(format!("invalid service URL '{url}': {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BillingError::invalid(format!(
                "service URL must use http or https, got: {}",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none() {
            return Err(BillingError::invalid(format!("service URL missing host: {url}")));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(BillingError::invalid(format!(
                "service URL must not carry a query or fragment: {url}"
            )));
        }

        Ok(Self { url: parsed, trust_root: None })
    }

    /// Pins this URL to a trust root.
    #[must_use]
    pub fn with_trust_root(mut self, trust_root: TrustRoot) -> Self {
        self.trust_root = Some(trust_root);
        self
    }

    /// Base URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Trust root pinned to this URL, if any.
    #[must_use]
    pub fn trust_root(&self) -> Option<&TrustRoot> {
        self.trust_root.as_ref()
    }
}

/// Principal and shared secret used to authenticate to the proxy.
///
/// Sent as HTTP Basic credentials on every request. The secret is wiped from
/// memory on drop and never printed.
#[derive(Clone)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    /// Creates credentials.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if either value is empty.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let user = user.into();
        let password = password.into();
        if user.is_empty() {
            return Err(BillingError::invalid("principal must not be empty"));
        }
        if password.is_empty() {
            return Err(BillingError::invalid("password must not be empty"));
        }
        Ok(Self { user, password })
    }

    /// Principal identifier (phone number or account handle).
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Immutable configuration of a billing proxy client.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    urls: Vec<ServiceUrl>,
    credentials: Credentials,
    user_agent: String,
    http: HttpConfig,
    endpoints: EndpointConfig,
}

impl ServiceConfig {
    /// Configures a proxy reachable at any of several candidate URLs.
    ///
    /// Each request goes to one candidate chosen at random. There is no
    /// failover to another candidate when a request fails.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if `urls` is empty or the user
    /// agent is empty or contains control characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use billing_proxy_client::config::{Credentials, ServiceConfig, ServiceUrl};
    ///
    /// let config = ServiceConfig::with_urls(
    ///     vec![
    ///         ServiceUrl::new("https://billing-a.example.org")?,
    ///         ServiceUrl::new("https://billing-b.example.org")?,
    ///     ],
    ///     Credentials::new("+15550100", "secret")?,
    ///     "ExampleMessenger/5.2 Android",
    /// )?;
    /// assert_eq!(config.urls().len(), 2);
    /// # Ok::<(), billing_proxy_client::BillingError>(())
    /// ```
    pub fn with_urls(
        urls: Vec<ServiceUrl>,
        credentials: Credentials,
        user_agent: impl Into<String>,
    ) -> Result<Self> {
        if urls.is_empty() {
            return Err(BillingError::invalid("at least one service URL is required"));
        }
        let user_agent = user_agent.into();
        validate_user_agent(&user_agent)?;

        Ok(Self {
            urls,
            credentials,
            user_agent,
            http: HttpConfig::default(),
            endpoints: EndpointConfig::default(),
        })
    }

    /// Configures a single proxy URL pinned to `trust_root`.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if the URL or user agent is invalid.
    pub fn with_trust_root(
        url: &str,
        trust_root: TrustRoot,
        credentials: Credentials,
        user_agent: impl Into<String>,
    ) -> Result<Self> {
        let url = ServiceUrl::new(url)?.with_trust_root(trust_root);
        Self::with_urls(vec![url], credentials, user_agent)
    }

    /// Replaces the HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if the settings are out of range.
    pub fn with_http(mut self, http: HttpConfig) -> Result<Self> {
        http.validate()?;
        self.http = http;
        Ok(self)
    }

    /// Replaces the endpoint paths.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if an override is not a safe absolute path.
    pub fn with_endpoints(mut self, endpoints: EndpointConfig) -> Result<Self> {
        endpoints.validate()?;
        self.endpoints = endpoints;
        Ok(self)
    }

    /// Candidate base URLs.
    #[must_use]
    pub fn urls(&self) -> &[ServiceUrl] {
        &self.urls
    }

    /// Authentication credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Client-identifying string sent as `User-Agent`.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// HTTP settings.
    #[must_use]
    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    /// Endpoint paths.
    #[must_use]
    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }
}

fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.trim().is_empty() {
        return Err(BillingError::invalid("user agent must not be empty"));
    }
    if user_agent.chars().any(char::is_control) {
        return Err(BillingError::invalid("user agent must not contain control characters"));
    }
    Ok(())
}

/// Client configuration file.
///
/// # Examples
///
/// ```toml
/// user_agent = "ExampleMessenger/5.2 Android"
///
/// [[urls]]
/// url = "https://billing.example.org"
/// trust_root = "/etc/messenger/billing-root.pem"
///
/// [credentials]
/// user = "+15550100"
/// password_env = "BILLING_PASSWORD"
///
/// [http]
/// timeout_secs = 20
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Client-identifying string sent as `User-Agent`.
    pub user_agent: String,

    /// Candidate proxy URLs.
    pub urls: Vec<UrlConfig>,

    /// Authentication settings.
    pub credentials: CredentialsConfig,

    /// HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Endpoint path overrides.
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

/// One `[[urls]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlConfig {
    /// Base URL.
    pub url: String,
    /// Path to a PEM trust root for this URL.
    pub trust_root: Option<String>,
}

/// The `[credentials]` table. The secret itself is read from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Principal identifier.
    pub user: String,
    /// Name of the environment variable holding the password.
    pub password_env: String,
}

impl ClientConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if parsing or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| BillingError::invalid(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if the file cannot be read or is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BillingError::invalid(format!("cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Checks everything that can be checked without touching the environment
    /// or the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(BillingError::invalid("at least one [[urls]] entry is required"));
        }
        for entry in &self.urls {
            ServiceUrl::new(&entry.url)?;
        }
        validate_user_agent(&self.user_agent)?;
        validate_env_var_name(&self.credentials.password_env)?;
        self.http.validate()?;
        self.endpoints.validate()
    }

    /// Resolves the password and trust roots and builds a [`ServiceConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if the password variable is unset
    /// or a trust root cannot be loaded.
    pub fn into_service_config(self) -> Result<ServiceConfig> {
        let password = env::var(&self.credentials.password_env).map_err(|_| {
            BillingError::invalid(format!(
                "environment variable {} is not set",
                self.credentials.password_env
            ))
        })?;
        let credentials = Credentials::new(self.credentials.user, password)?;

        let urls = self
            .urls
            .iter()
            .map(|entry| {
                let url = ServiceUrl::new(&entry.url)?;
                match &entry.trust_root {
                    Some(path) => Ok(url.with_trust_root(TrustRoot::from_pem_file(path)?)),
                    None => Ok(url),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        ServiceConfig::with_urls(urls, credentials, self.user_agent)?
            .with_http(self.http)?
            .with_endpoints(self.endpoints)
    }
}

fn validate_env_var_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(BillingError::invalid("environment variable name cannot be empty"));
    };

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(BillingError::invalid(format!(
            "environment variable name must start with letter or underscore: {name}"
        )));
    }
    if let Some(ch) = chars.find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_') {
        return Err(BillingError::invalid(format!(
            "environment variable name contains invalid character '{ch}': {name}"
        )));
    }
    Ok(())
}
