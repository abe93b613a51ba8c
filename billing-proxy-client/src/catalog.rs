//! Response payloads returned by catalog and payment operations.
//!
//! Catalogs are decoded just far enough to be useful (identifiers and a few
//! common fields). Everything else the processor sends is kept verbatim in a
//! pass-through map. Charge records, subscription results, and payment
//! history are not decoded at all and travel as [`RawDocument`] bytes.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// Processor name to customer identifier.
pub type CustomerIds = HashMap<String, String>;

/// Subscription plans offered by a seller.
pub type PlanCollection = Collection<Plan>;

/// One-time-purchase products offered by a seller.
pub type ProductCollection = Collection<Product>;

/// Processor list object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection<T> {
    /// Object type tag, normally `list`.
    #[serde(default = "default_list_object")]
    pub object: String,
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Whether the processor holds further pages.
    #[serde(default)]
    pub has_more: bool,
    /// Processor URL of the list, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { object: default_list_object(), data: Vec::new(), has_more: false, url: None }
    }
}

impl<T> Collection<T> {
    /// Number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over the items on this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type IntoIter = std::slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

fn default_list_object() -> String {
    "list".to_owned()
}

/// Recurring billing plan.
///
/// `amount` is passed through as reported, in the currency's minor unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Processor plan identifier.
    pub id: String,
    /// Display name of the plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Product this plan bills for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<PlanProduct>,
    /// Price per interval in minor units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    /// ISO currency code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Billing interval (`day`, `week`, `month`, `year`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    /// Whether new subscriptions may be created.
    #[serde(default)]
    pub active: bool,
    /// Remaining processor fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Product reference on a [`Plan`]: a bare id, or the full object when the
/// processor expanded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanProduct {
    /// Product identifier.
    Id(String),
    /// Expanded product object.
    Expanded(Box<Product>),
}

impl PlanProduct {
    /// Product identifier, whichever form was sent.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Expanded(product) => &product.id,
        }
    }
}

/// One-time-purchase product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Processor product identifier.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the product can currently be purchased.
    #[serde(default)]
    pub active: bool,
    /// Remaining processor fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Backend document forwarded without interpretation.
///
/// The bytes are exactly what the proxy returned, including bodies that are
/// not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawDocument(Vec<u8>);

impl RawDocument {
    /// Wraps a response body.
    #[must_use]
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self(body.into())
    }

    /// Document bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Document text, or `None` if the body is not valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Returns the document bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns true if the proxy sent an empty body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the document into a caller-chosen type.
    ///
    /// # Errors
    ///
    /// Returns the decoder error if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.0)
    }
}

/// Invalid UTF-8 sequences are shown as U+FFFD.
impl fmt::Display for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<Vec<u8>> for RawDocument {
    fn from(body: Vec<u8>) -> Self {
        Self(body)
    }
}

impl From<String> for RawDocument {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl AsRef<[u8]> for RawDocument {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_plan_collection_decodes_list_object() {
        let body = json!({
            "object": "list",
            "url": "/v1/plans",
            "has_more": true,
            "data": [{
                "id": "gold",
                "object": "plan",
                "nickname": "Gold",
                "amount": 2000,
                "currency": "usd",
                "interval": "month",
                "active": true,
                "trial_period_days": 14
            }]
        });

        let plans: PlanCollection = serde_json::from_value(body).unwrap();
        assert_eq!(plans.len(), 1);
        assert!(plans.has_more);
        assert_eq!(plans.url.as_deref(), Some("/v1/plans"));

        let gold = &plans.data[0];
        assert_eq!(gold.id, "gold");
        assert_eq!(gold.amount, Some(2000));
        assert_eq!(gold.extra.get("trial_period_days"), Some(&json!(14)));
        assert_eq!(gold.extra.get("object"), Some(&json!("plan")));
    }

    #[test]
    fn test_plan_product_id_or_expanded_object() {
        let body = json!({
            "data": [
                { "id": "plan_a", "product": "prod_1" },
                {
                    "id": "plan_b",
                    "active": false,
                    "product": { "id": "prod_2", "name": "Gold", "active": true }
                },
                { "id": "plan_c" }
            ]
        });

        let plans: PlanCollection = serde_json::from_value(body.clone()).unwrap();
        let products: Vec<_> =
            plans.iter().map(|plan| plan.product.as_ref().map(PlanProduct::id)).collect();
        assert_eq!(products, [Some("prod_1"), Some("prod_2"), None]);

        let Some(PlanProduct::Expanded(expanded)) = &plans.data[1].product else {
            panic!("expected expanded product");
        };
        assert_eq!(expanded.name.as_deref(), Some("Gold"));
        assert_eq!(serde_json::to_value(&plans.data[1]).unwrap(), body["data"][1]);
    }

    #[test]
    fn test_product_collection_tolerates_missing_fields() {
        let body = json!({ "data": [{ "id": "prod_1" }] });

        let products: ProductCollection = serde_json::from_value(body).unwrap();
        assert_eq!(products.object, "list");
        assert!(!products.has_more);

        let product = products.iter().next().unwrap();
        assert_eq!(product.id, "prod_1");
        assert!(product.name.is_none());
        assert!(!product.active);
    }

    #[test]
    fn test_pass_through_fields_survive_reencoding() {
        let body = json!({
            "id": "prod_2",
            "name": "Sourdough",
            "active": true,
            "metadata": { "shelf": "A3" },
            "images": ["https://cdn.example.com/a.png"]
        });

        let product: Product = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(serde_json::to_value(&product).unwrap(), body);
    }

    #[test]
    fn test_empty_collection() {
        let products: ProductCollection = serde_json::from_value(json!({})).unwrap();
        assert!(products.is_empty());
        assert_eq!(products, ProductCollection::default());
    }

    #[test]
    fn test_raw_document_is_opaque() {
        let text = r#"{"id":"ch_1","status":"succeeded"}"#;
        let doc = RawDocument::new(text);

        assert_eq!(doc.as_str(), Some(text));
        assert_eq!(doc.to_string(), text);
        assert_eq!(doc.as_bytes(), text.as_bytes());

        let value: Value = doc.decode().unwrap();
        assert_eq!(value["status"], "succeeded");
        assert_eq!(doc.into_bytes(), text.as_bytes());
    }

    #[test]
    fn test_raw_document_keeps_invalid_utf8() {
        let body = vec![b'{', b'"', 0xff, 0xfe, b'"', b'}'];
        let doc = RawDocument::from(body.clone());

        assert_eq!(doc.as_bytes(), body.as_slice());
        assert_eq!(doc.as_str(), None);
        assert_eq!(doc.to_string(), "{\"\u{fffd}\u{fffd}\"}");
        assert_eq!(doc.into_bytes(), body);
    }

    #[test]
    fn test_raw_document_keeps_non_json_text() {
        let doc = RawDocument::from("OK".to_owned());
        assert!(!doc.is_empty());
        assert!(doc.decode::<Value>().is_err());
    }
}
