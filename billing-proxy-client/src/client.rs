//! Billing client facade.
//!
//! [`BillingClient`] validates arguments locally, then forwards each operation
//! to its transport as exactly one request. It holds no mutable state, so a
//! single client can be shared across tasks behind an `Arc`.

use tracing::{debug, info, instrument, warn};

use crate::{
    account::LinkedAccountInfo,
    catalog::{CustomerIds, PlanCollection, ProductCollection, RawDocument},
    config::{ClientConfig, ServiceConfig},
    error::Result,
    protocol::{Legacy, ProtocolLevel, Recurring},
    request::{ChargeRequest, PaymentSource, SubscriptionRequest, require},
    transport::{BillingTransport, PushTransport, RecurringBillingTransport},
};

/// Client for a proxy speaking the legacy protocol.
pub type LegacyBillingClient = BillingClient<PushTransport<Legacy>>;

/// Client for a proxy speaking the recurring-billing protocol.
pub type RecurringBillingClient = BillingClient<PushTransport<Recurring>>;

/// Entry point for billing operations routed through the proxy.
///
/// Every operation is a single round trip. Nothing is retried: a failure is
/// returned to the caller as is, and arguments rejected locally never reach
/// the network.
///
/// Plan listing and subscriptions are only available when the transport
/// implements [`RecurringBillingTransport`].
///
/// # Examples
///
/// ```no_run
/// use billing_proxy_client::{
///     RecurringBillingClient,
///     config::{Credentials, ServiceConfig, ServiceUrl},
/// };
///
/// # async fn example() -> billing_proxy_client::Result<()> {
/// let config = ServiceConfig::with_urls(
///     vec![ServiceUrl::new("https://billing.example.org")?],
///     Credentials::new("+15550100", "secret")?,
///     "ExampleMessenger/5.2 Android",
/// )?;
/// let client = RecurringBillingClient::new(&config)?;
///
/// let plans = client.get_plans("+15550199").await?;
/// for plan in &plans {
///     println!("{} {:?}", plan.id, plan.nickname);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BillingClient<T = PushTransport<Recurring>> {
    transport: T,
}

impl<P: ProtocolLevel> BillingClient<PushTransport<P>> {
    /// Creates a client that talks HTTP to the configured proxy.
    ///
    /// No network I/O is performed.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`](crate::BillingError::InvalidArgument)
    /// if the HTTP client cannot be built from `config`.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self::with_transport(PushTransport::new(config)?))
    }

    /// Creates a client from a parsed configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`](crate::BillingError::InvalidArgument)
    /// if the password variable is unset, a trust root cannot be loaded, or the
    /// HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::new(&config.into_service_config()?)
    }
}

impl<T: BillingTransport> BillingClient<T> {
    /// Wraps an existing transport.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Links a merchant account by redeeming a processor authorization code.
    ///
    /// The proxy stores the resulting credentials server-side and returns
    /// them. Codes are single use: redeeming one twice yields
    /// [`BillingError::RequestRejected`](crate::BillingError::RequestRejected).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty code, otherwise a rejection or
    /// transport failure.
    #[instrument(skip_all, fields(operation = "connect_account", protocol = self.transport.protocol_name()))]
    pub async fn connect_account(&self, authorization_code: &str) -> Result<LinkedAccountInfo> {
        require("authorization_code", authorization_code)?;
        debug!("exchanging authorization code");

        let result = self.transport.exchange_authorization_code(authorization_code).await;
        if let Ok(info) = &result {
            info!(live_mode = info.is_live_mode(), "billing account linked");
        }
        log_failure(&result);
        result
    }

    /// Revokes the billing credentials linked to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty id, otherwise a rejection or
    /// transport failure.
    #[instrument(skip_all, fields(operation = "revoke_billing_access", protocol = self.transport.protocol_name()))]
    pub async fn revoke_billing_access(&self, user_id: &str) -> Result<()> {
        require("user_id", user_id)?;
        debug!("revoking billing credentials");

        let result = self.transport.revoke(user_id).await;
        if result.is_ok() {
            info!("billing credentials revoked");
        }
        log_failure(&result);
        result
    }

    /// Lists the products a seller offers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty handle, otherwise a rejection or
    /// transport failure.
    #[instrument(skip_all, fields(operation = "get_products", protocol = self.transport.protocol_name(), seller = %seller_handle))]
    pub async fn get_products(&self, seller_handle: &str) -> Result<ProductCollection> {
        require("seller_handle", seller_handle)?;
        debug!("fetching product catalog");

        let result = self.transport.list_products(seller_handle).await;
        if let Ok(products) = &result {
            info!(count = products.len(), "product catalog fetched");
        }
        log_failure(&result);
        result
    }

    /// Fetches the charge history of a contact.
    ///
    /// The document is returned exactly as the proxy sent it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty handle, otherwise a rejection or
    /// transport failure.
    #[instrument(skip_all, fields(operation = "get_payments", protocol = self.transport.protocol_name()))]
    pub async fn get_payments(&self, contact_handle: &str) -> Result<RawDocument> {
        require("contact_handle", contact_handle)?;
        debug!("fetching payment history");

        let result = self.transport.fetch_payment_history(contact_handle).await;
        if result.is_ok() {
            info!("payment history fetched");
        }
        log_failure(&result);
        result
    }

    /// Performs a one-time charge.
    ///
    /// The payload type follows the protocol level: [`Charge`](crate::request::Charge)
    /// for legacy proxies, [`NamedCharge`](crate::request::NamedCharge) for
    /// recurring ones.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a required field is empty, otherwise a
    /// rejection or transport failure.
    #[instrument(skip_all, fields(operation = "perform_charge", protocol = self.transport.protocol_name(), seller = %charge.seller()))]
    pub async fn perform_charge(&self, charge: &T::Charge) -> Result<RawDocument> {
        charge.validate()?;
        debug!("submitting charge");

        let result = self.transport.submit_charge(charge).await;
        if result.is_ok() {
            info!("charge submitted");
        }
        log_failure(&result);
        result
    }

    /// Lists the authenticated principal's customer id per processor.
    ///
    /// An empty map means no customer record exists yet.
    ///
    /// # Errors
    ///
    /// Returns a rejection or transport failure.
    #[instrument(skip_all, fields(operation = "get_customer_ids", protocol = self.transport.protocol_name()))]
    pub async fn get_customer_ids(&self) -> Result<CustomerIds> {
        debug!("fetching customer ids");

        let result = self.transport.list_customer_ids().await;
        if let Ok(ids) = &result {
            info!(processors = ids.len(), "customer ids fetched");
        }
        log_failure(&result);
        result
    }
}

impl<T: RecurringBillingTransport> BillingClient<T> {
    /// Lists the subscription plans a seller offers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty handle, otherwise a rejection or
    /// transport failure.
    #[instrument(skip_all, fields(operation = "get_plans", protocol = self.transport.protocol_name(), seller = %seller_handle))]
    pub async fn get_plans(&self, seller_handle: &str) -> Result<PlanCollection> {
        require("seller_handle", seller_handle)?;
        debug!("fetching plan catalog");

        let result = self.transport.list_plans(seller_handle).await;
        if let Ok(plans) = &result {
            info!(count = plans.len(), "plan catalog fetched");
        }
        log_failure(&result);
        result
    }

    /// Subscribes to a seller's plan.
    ///
    /// A `source` that is `None`, empty or whitespace-only pays with the
    /// payment method already on file for the principal. A
    /// [`SubscriptionRequest`] built by hand with a blank
    /// [`PaymentSource::Token`] is still rejected by [`subscribe`](Self::subscribe).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the plan id or seller handle is empty,
    /// otherwise a rejection or transport failure.
    pub async fn subscribe_to_plan(
        &self,
        plan_id: &str,
        source: Option<&str>,
        seller_handle: &str,
        plan_name: &str,
    ) -> Result<RawDocument> {
        let request = SubscriptionRequest::new(
            plan_id,
            PaymentSource::from_token(source),
            seller_handle,
            plan_name,
        );
        self.subscribe(&request).await
    }

    /// Submits a prepared subscription request.
    ///
    /// # Errors
    ///
    /// Same as [`subscribe_to_plan`](Self::subscribe_to_plan).
    #[instrument(skip_all, fields(operation = "subscribe_to_plan", protocol = self.transport.protocol_name(), seller = %request.seller_handle, plan_id = %request.plan_id))]
    pub async fn subscribe(&self, request: &SubscriptionRequest) -> Result<RawDocument> {
        request.validate()?;
        let stored = matches!(request.source, PaymentSource::StoredPaymentMethod);
        debug!(stored_payment_method = stored, "submitting subscription");

        let result = self.transport.submit_subscription(request).await;
        if result.is_ok() {
            info!("subscription submitted");
        }
        log_failure(&result);
        result
    }
}

fn log_failure<V>(result: &Result<V>) {
    if let Err(error) = result {
        warn!(kind = ?error.kind(), status = ?error.status(), %error, "billing operation failed");
    }
}
