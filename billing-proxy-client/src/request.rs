//! Request payloads for charge and subscription operations.
//!
//! Each payload validates itself before it is handed to a transport, so an
//! invalid request fails with [`BillingError::InvalidArgument`] and never
//! reaches the network.

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::error::{BillingError, Result};

/// Rejects empty or whitespace-only required parameters.
pub(crate) fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BillingError::invalid(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Charge payload accepted by a protocol level.
pub trait ChargeRequest: Serialize + Send + Sync {
    /// Checks required parameters.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] naming the first empty parameter.
    fn validate(&self) -> Result<()>;

    /// Handle of the seller receiving the charge.
    fn seller(&self) -> &str;
}

/// One-time charge against a payment source token.
///
/// # Examples
///
/// ```
/// use billing_proxy_client::request::{Charge, ChargeRequest};
///
/// let charge = Charge::new("prod_1", "sku_1", "tok_visa", "+15550100");
/// assert!(charge.validate().is_ok());
///
/// let missing_token = Charge::new("prod_1", "sku_1", "", "+15550100");
/// assert!(missing_token.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Charge {
    /// Product being purchased.
    pub product_id: String,
    /// SKU of the product being purchased.
    pub sku_id: String,
    /// Token for the card or other instrument collected by the payment SDK.
    pub source_token_id: String,
    /// Handle (phone number) of the seller.
    #[serde(rename = "seller")]
    pub seller_handle: String,
}

impl Charge {
    /// Creates a charge payload.
    #[must_use]
    pub fn new(
        product_id: impl Into<String>,
        sku_id: impl Into<String>,
        source_token_id: impl Into<String>,
        seller_handle: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            sku_id: sku_id.into(),
            source_token_id: source_token_id.into(),
            seller_handle: seller_handle.into(),
        }
    }
}

impl ChargeRequest for Charge {
    fn validate(&self) -> Result<()> {
        require("product_id", &self.product_id)?;
        require("sku_id", &self.sku_id)?;
        require("source_token_id", &self.source_token_id)?;
        require("seller_handle", &self.seller_handle)
    }

    fn seller(&self) -> &str {
        &self.seller_handle
    }
}

/// Charge carrying a display name for the product.
///
/// Only the recurring protocol level accepts this payload. The product name is
/// informational; `None` omits it from the wire document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCharge {
    /// Charge parameters.
    #[serde(flatten)]
    pub charge: Charge,
    /// Display name of the product.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl NamedCharge {
    /// Attaches a product name to a charge.
    #[must_use]
    pub fn new(charge: Charge, product_name: Option<String>) -> Self {
        Self { charge, product_name }
    }
}

impl ChargeRequest for NamedCharge {
    fn validate(&self) -> Result<()> {
        self.charge.validate()
    }

    fn seller(&self) -> &str {
        &self.charge.seller_handle
    }
}

/// How a subscription is paid for.
///
/// A missing or empty token selects the payment method already on file for the
/// principal. The two cases produce different wire documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSource {
    /// Charge this source token.
    Token(String),
    /// Charge the payment method stored for the principal.
    StoredPaymentMethod,
}

impl PaymentSource {
    /// Maps an optional token to a source.
    ///
    /// `None`, `""` and whitespace-only tokens select the stored method, the
    /// same way blank identifiers count as empty elsewhere.
    ///
    /// # Examples
    ///
    /// ```
    /// use billing_proxy_client::request::PaymentSource;
    ///
    /// assert_eq!(PaymentSource::from_token(Some("")), PaymentSource::StoredPaymentMethod);
    /// assert_eq!(PaymentSource::from_token(None), PaymentSource::StoredPaymentMethod);
    /// assert_eq!(PaymentSource::from_token(Some("  ")), PaymentSource::StoredPaymentMethod);
    /// assert_eq!(
    ///     PaymentSource::from_token(Some("tok_1")),
    ///     PaymentSource::Token("tok_1".to_owned())
    /// );
    /// ```
    #[must_use]
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(token) if !token.trim().is_empty() => Self::Token(token.to_owned()),
            _ => Self::StoredPaymentMethod,
        }
    }

    /// Returns the token, if one was supplied.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token),
            Self::StoredPaymentMethod => None,
        }
    }
}

/// Recurring subscription purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    /// Plan being subscribed to.
    pub plan_id: String,
    /// Payment source for the subscription.
    pub source: PaymentSource,
    /// Handle (phone number) of the seller.
    pub seller_handle: String,
    /// Display name of the plan.
    pub plan_name: String,
}

impl SubscriptionRequest {
    /// Creates a subscription payload.
    #[must_use]
    pub fn new(
        plan_id: impl Into<String>,
        source: PaymentSource,
        seller_handle: impl Into<String>,
        plan_name: impl Into<String>,
    ) -> Self {
        Self {
            plan_id: plan_id.into(),
            source,
            seller_handle: seller_handle.into(),
            plan_name: plan_name.into(),
        }
    }

    /// Checks required parameters.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if the plan id, seller handle, or
    /// an explicitly supplied token is blank.
    pub fn validate(&self) -> Result<()> {
        require("plan_id", &self.plan_id)?;
        require("seller_handle", &self.seller_handle)?;
        if let PaymentSource::Token(token) = &self.source {
            require("source_token_id", token)?;
        }
        Ok(())
    }
}

impl Serialize for SubscriptionRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SubscriptionRequest", 5)?;
        state.serialize_field("plan_id", &self.plan_id)?;
        match &self.source {
            PaymentSource::Token(token) => {
                state.serialize_field("source_token_id", token)?;
                state.serialize_field("use_stored_payment_method", &false)?;
            }
            PaymentSource::StoredPaymentMethod => {
                state.skip_field("source_token_id")?;
                state.serialize_field("use_stored_payment_method", &true)?;
            }
        }
        state.serialize_field("seller", &self.seller_handle)?;
        state.serialize_field("plan_name", &self.plan_name)?;
        state.end()
    }
}
