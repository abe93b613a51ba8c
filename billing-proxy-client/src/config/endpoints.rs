//! Billing proxy endpoint paths.

use serde::Deserialize;

use crate::error::{BillingError, Result};

const CONNECT: &str = "/v1/billing/connect";
const REVOKE: &str = "/v1/billing/revoke";
const PLANS: &str = "/v1/billing/plans";
const PRODUCTS: &str = "/v1/billing/products";
const PAYMENTS: &str = "/v1/billing/payments";
const CHARGE: &str = "/v1/billing/charge";
const CUSTOMERS: &str = "/v1/billing/customers";
const SUBSCRIPTION: &str = "/v1/billing/subscription";

/// Path overrides for proxies that mount the billing API elsewhere.
///
/// Paths that take an identifier (revoke, plans, products, payments) get it
/// appended as an extra, percent-encoded path segment.
///
/// # Examples
///
/// ```toml
/// [endpoints]
/// products = "/v2/shop/products"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    /// Authorization code exchange (default: `/v1/billing/connect`).
    pub connect: Option<String>,
    /// Credential revocation (default: `/v1/billing/revoke`).
    pub revoke: Option<String>,
    /// Seller plan catalog (default: `/v1/billing/plans`).
    pub plans: Option<String>,
    /// Seller product catalog (default: `/v1/billing/products`).
    pub products: Option<String>,
    /// Contact payment history (default: `/v1/billing/payments`).
    pub payments: Option<String>,
    /// One-time charge (default: `/v1/billing/charge`).
    pub charge: Option<String>,
    /// Customer identifiers of the principal (default: `/v1/billing/customers`).
    pub customers: Option<String>,
    /// Subscription purchase (default: `/v1/billing/subscription`).
    pub subscription: Option<String>,
}

impl EndpointConfig {
    /// Validates every override.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if a path is relative or
    /// contains `..` or `//`.
    pub fn validate(&self) -> Result<()> {
        let endpoints = [
            ("connect", &self.connect),
            ("revoke", &self.revoke),
            ("plans", &self.plans),
            ("products", &self.products),
            ("payments", &self.payments),
            ("charge", &self.charge),
            ("customers", &self.customers),
            ("subscription", &self.subscription),
        ];

        for (name, endpoint) in endpoints {
            if let Some(path) = endpoint {
                validate_endpoint_path(name, path)?;
            }
        }
        Ok(())
    }

    pub(crate) fn connect(&self) -> &str {
        self.connect.as_deref().unwrap_or(CONNECT)
    }

    pub(crate) fn revoke(&self) -> &str {
        self.revoke.as_deref().unwrap_or(REVOKE)
    }

    pub(crate) fn plans(&self) -> &str {
        self.plans.as_deref().unwrap_or(PLANS)
    }

    pub(crate) fn products(&self) -> &str {
        self.products.as_deref().unwrap_or(PRODUCTS)
    }

    pub(crate) fn payments(&self) -> &str {
        self.payments.as_deref().unwrap_or(PAYMENTS)
    }

    pub(crate) fn charge(&self) -> &str {
        self.charge.as_deref().unwrap_or(CHARGE)
    }

    pub(crate) fn customers(&self) -> &str {
        self.customers.as_deref().unwrap_or(CUSTOMERS)
    }

    pub(crate) fn subscription(&self) -> &str {
        self.subscription.as_deref().unwrap_or(SUBSCRIPTION)
    }
}

fn validate_endpoint_path(name: &str, path: &str) -> Result<()> {
    if path.contains("..") {
        return Err(BillingError::invalid(format!(
            "endpoint '{name}' contains path traversal sequence '..': {path}"
        )));
    }

    if path.contains("//") {
        return Err(BillingError::invalid(format!(
            "endpoint '{name}' contains double slash '//': {path}"
        )));
    }

    if !path.starts_with('/') {
        return Err(BillingError::invalid(format!("endpoint '{name}' must start with '/': {path}")));
    }

    if path.contains(['?', '#']) {
        return Err(BillingError::invalid(format!(
            "endpoint '{name}' must not carry a query or fragment: {path}"
        )));
    }

    Ok(())
}
