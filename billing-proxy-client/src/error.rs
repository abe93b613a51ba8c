//! Error types for billing proxy operations.
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! type is [`BillingError`]. The taxonomy is deliberately small: a caller only
//! ever has to distinguish three kinds of failure.
//!
//! # Error Categories
//!
//! - **Transport failures** ([`BillingError::TransportFailure`]): the proxy could not be
//!   reached, the connection or TLS handshake failed, the response could not be decoded, or
//!   the proxy reported a server-side failure
//! - **Rejections** ([`BillingError::RequestRejected`]): the proxy or the payment processor
//!   understood the request and declined it
//! - **Invalid arguments** ([`BillingError::InvalidArgument`]): a parameter or configuration
//!   value was rejected locally before any network I/O
//!
//! # Examples
//!
//! ```
//! use billing_proxy_client::error::{BillingError, ErrorKind, Result};
//!
//! fn require_seller(seller: &str) -> Result<&str> {
//!     if seller.is_empty() {
//!         return Err(BillingError::InvalidArgument("seller handle must not be empty".to_owned()));
//!     }
//!     Ok(seller)
//! }
//!
//! let err = require_seller("").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidArgument);
//! ```

use thiserror::Error;

/// Result type alias for billing operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors surfaced by the billing client.
///
/// This crate performs no retries and no local recovery. Every failure reaches
/// the caller as exactly one of these variants.
///
/// # Error Recovery
///
/// - [`TransportFailure`](Self::TransportFailure): the request may or may not have reached
///   the processor. Whether to retry is the caller's decision; charge and subscription
///   requests are not idempotent.
/// - [`RequestRejected`](Self::RequestRejected): retrying the same request will fail the same
///   way. Surface the diagnostic to the user or fix the input.
/// - [`InvalidArgument`](Self::InvalidArgument): fix the input. No request was sent.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum BillingError {
    /// Communication with the billing proxy failed.
    ///
    /// Wraps the underlying [`TransportError`]. Common causes include:
    /// - Connection refused, DNS failure, or timeout
    /// - TLS validation failure against the configured trust root
    /// - A response body that is not the expected JSON document
    /// - A server-side (non-4xx) error status from the proxy
    #[error("billing proxy transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    /// The billing proxy or payment processor declined the request.
    ///
    /// Typical causes are an authorization code that was already consumed, an
    /// invalid source token, or an unknown seller. `message` carries whatever
    /// diagnostic text the backend returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use billing_proxy_client::error::BillingError;
    ///
    /// let err = BillingError::RequestRejected {
    ///     status: 400,
    ///     message: "authorization code already used".to_owned(),
    /// };
    /// assert!(err.is_rejected());
    /// assert_eq!(err.status(), Some(400));
    /// ```
    #[error("request rejected by billing proxy (status {status}): {message}")]
    RequestRejected {
        /// HTTP status returned by the proxy.
        status: u16,
        /// Diagnostic text provided by the backend.
        message: String,
    },

    /// A parameter or configuration value failed local validation.
    ///
    /// Raised before any network I/O is attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Fieldless view of a [`BillingError`] for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`BillingError::TransportFailure`].
    TransportFailure,
    /// See [`BillingError::RequestRejected`].
    RequestRejected,
    /// See [`BillingError::InvalidArgument`].
    InvalidArgument,
}

impl BillingError {
    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransportFailure(_) => ErrorKind::TransportFailure,
            Self::RequestRejected { .. } => ErrorKind::RequestRejected,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Returns true if the backend declined the request.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::RequestRejected { .. })
    }

    /// Returns the HTTP status reported by the proxy, if there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestRejected { status, .. }
            | Self::TransportFailure(TransportError::Status { status, .. }) => Some(*status),
            Self::TransportFailure(_) | Self::InvalidArgument(_) => None,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Underlying cause of a [`BillingError::TransportFailure`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP exchange itself failed (connect, TLS, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The proxy answered with a server-side error status.
    #[error("billing proxy returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("malformed {operation} response: {source}")]
    MalformedResponse {
        /// Operation whose response was being decoded.
        operation: &'static str,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// No endpoint is available to send the request to.
    #[error("no billing proxy endpoint configured")]
    NoEndpoint,

    /// The operating system random source failed while choosing an endpoint.
    #[error("cannot choose a billing proxy endpoint: {0}")]
    EndpointSelection(#[source] rand_core::Error),
}
