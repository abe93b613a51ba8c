//! Transport abstraction for the billing proxy.
//!
//! The facade in [`crate::client`] never performs I/O itself. It validates
//! arguments and delegates to a transport exposing one method per proxy
//! capability:
//!
//! | Capability | Method | Result |
//! |------------|--------|--------|
//! | Link account | [`BillingTransport::exchange_authorization_code`] | [`LinkedAccountInfo`] |
//! | Revoke | [`BillingTransport::revoke`] | `()` |
//! | Products | [`BillingTransport::list_products`] | [`ProductCollection`] |
//! | Payments | [`BillingTransport::fetch_payment_history`] | [`RawDocument`] |
//! | Charge | [`BillingTransport::submit_charge`] | [`RawDocument`] |
//! | Customer ids | [`BillingTransport::list_customer_ids`] | [`CustomerIds`] |
//! | Plans | [`RecurringBillingTransport::list_plans`] | [`PlanCollection`] |
//! | Subscribe | [`RecurringBillingTransport::submit_subscription`] | [`RawDocument`] |
//!
//! [`PushTransport`] is the HTTP implementation. Tests and alternative
//! channels implement the traits directly.
//!
//! Implementations must issue at most one request per call and must not retry.

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use crate::{
    account::LinkedAccountInfo,
    catalog::{CustomerIds, PlanCollection, ProductCollection, RawDocument},
    error::Result,
    request::{ChargeRequest, SubscriptionRequest},
};

pub mod http;
mod path;

pub use http::PushTransport;

/// Capabilities every billing proxy offers.
pub trait BillingTransport: Send + Sync {
    /// Charge payload accepted by this transport.
    type Charge: ChargeRequest;

    /// Protocol level name used in logs.
    fn protocol_name(&self) -> &'static str;

    /// Exchanges a processor authorization code for linked-account credentials.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::RequestRejected`](crate::BillingError::RequestRejected)
    /// if the code was refused, or a transport failure.
    fn exchange_authorization_code<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Future<Output = Result<LinkedAccountInfo>> + Send + 'a;

    /// Revokes the billing credentials linked to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns a rejection or transport failure.
    fn revoke<'a>(&'a self, user_id: &'a str) -> impl Future<Output = Result<()>> + Send + 'a;

    /// Lists the products offered by a seller.
    ///
    /// # Errors
    ///
    /// Returns a rejection or transport failure.
    fn list_products<'a>(
        &'a self,
        seller_handle: &'a str,
    ) -> impl Future<Output = Result<ProductCollection>> + Send + 'a;

    /// Fetches the charge history of a contact.
    ///
    /// # Errors
    ///
    /// Returns a rejection or transport failure.
    fn fetch_payment_history<'a>(
        &'a self,
        contact_handle: &'a str,
    ) -> impl Future<Output = Result<RawDocument>> + Send + 'a;

    /// Submits a one-time charge.
    ///
    /// # Errors
    ///
    /// Returns a rejection or transport failure.
    fn submit_charge<'a>(
        &'a self,
        charge: &'a Self::Charge,
    ) -> impl Future<Output = Result<RawDocument>> + Send + 'a;

    /// Lists the authenticated principal's customer identifiers per processor.
    ///
    /// # Errors
    ///
    /// Returns a rejection or transport failure.
    fn list_customer_ids(&self) -> impl Future<Output = Result<CustomerIds>> + Send + '_;
}

/// Capabilities of proxies speaking the recurring-billing protocol.
pub trait RecurringBillingTransport: BillingTransport {
    /// Lists the subscription plans offered by a seller.
    ///
    /// # Errors
    ///
    /// Returns a rejection or transport failure.
    fn list_plans<'a>(
        &'a self,
        seller_handle: &'a str,
    ) -> impl Future<Output = Result<PlanCollection>> + Send + 'a;

    /// Submits a subscription purchase.
    ///
    /// # Errors
    ///
    /// Returns a rejection or transport failure.
    fn submit_subscription<'a>(
        &'a self,
        subscription: &'a SubscriptionRequest,
    ) -> impl Future<Output = Result<RawDocument>> + Send + 'a;
}
