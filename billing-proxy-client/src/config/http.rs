//! Connection tuning for the proxy's HTTP clients.
//!
//! A messaging client talks to a single billing proxy at a time and issues a
//! handful of calls per user action, so the defaults keep few idle
//! connections around. Charges and subscriptions wait on the payment
//! processor behind the proxy, which bounds how short the request timeout can
//! reasonably be.

use std::{ops::RangeInclusive, time::Duration};

use serde::Deserialize;

use crate::error::{BillingError, Result};

const REQUEST_TIMEOUT_RANGE: RangeInclusive<u64> = 1..=120;
const CONNECT_TIMEOUT_RANGE: RangeInclusive<u64> = 1..=30;
const MAX_IDLE_CONNECTIONS: usize = 32;

/// `[http]` table of a client configuration file.
///
/// Every field is optional.
///
/// ```toml
/// [http]
/// timeout_secs = 45
/// http_version = "http1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Idle connections kept open to each proxy URL.
    pub pool_max_idle_per_host: usize,

    /// Deadline for a whole billing call, processor round trip included.
    pub timeout_secs: u64,

    /// Deadline for reaching the proxy. Never longer than `timeout_secs`.
    pub connect_timeout_secs: u64,

    /// Protocol spoken to the proxy.
    pub http_version: HttpVersion,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 4,
            timeout_secs: 30,
            connect_timeout_secs: 5,
            http_version: HttpVersion::Auto,
        }
    }
}

impl HttpConfig {
    /// Checks the settings before any client is built.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if `timeout_secs` is outside
    /// 1..=120, `connect_timeout_secs` is outside 1..=30 or exceeds
    /// `timeout_secs`, or more than 32 idle connections are requested.
    pub fn validate(&self) -> Result<()> {
        check_range("timeout_secs", self.timeout_secs, &REQUEST_TIMEOUT_RANGE)?;
        check_range("connect_timeout_secs", self.connect_timeout_secs, &CONNECT_TIMEOUT_RANGE)?;
        if self.connect_timeout_secs > self.timeout_secs {
            return Err(BillingError::invalid("connect_timeout_secs must not exceed timeout_secs"));
        }
        if self.pool_max_idle_per_host > MAX_IDLE_CONNECTIONS {
            return Err(BillingError::invalid(format!(
                "pool_max_idle_per_host must be at most {MAX_IDLE_CONNECTIONS}"
            )));
        }
        Ok(())
    }

    /// Request deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect deadline.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn check_range(name: &str, value: u64, range: &RangeInclusive<u64>) -> Result<()> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(BillingError::invalid(format!(
        "{name} must be between {} and {} seconds, got {value}",
        range.start(),
        range.end()
    )))
}

/// Protocol spoken to the proxy.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HttpVersion {
    /// Force HTTP/1.1, for proxies behind load balancers without HTTP/2.
    #[serde(alias = "http1.1")]
    Http1,
    /// Open HTTP/2 connections without negotiation.
    Http2,
    /// Let TLS negotiation pick.
    #[default]
    Auto,
}
