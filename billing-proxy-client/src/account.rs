//! Linked billing account credentials.
//!
//! A [`LinkedAccountInfo`] is the result of exchanging a processor authorization
//! code through the billing proxy. It identifies the connected merchant account
//! and carries the OAuth-style credentials the proxy stored for it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TransportError};

/// Credential bundle for a merchant account linked to the billing platform.
///
/// Instances are only produced by decoding a successful link response, so every
/// field is read-only. Wire names follow the processor's OAuth token response
/// (`stripe_user_id`, `livemode`, ...); any other fields in the document are
/// ignored. A field that is missing from the document, or explicitly `null`,
/// decodes to its empty value.
///
/// The `Debug` output redacts both tokens.
///
/// # Examples
///
/// ```
/// use billing_proxy_client::LinkedAccountInfo;
///
/// let body = br#"{
///     "stripe_user_id": "acct_1032D82eZvKYlo2C",
///     "token_type": "bearer",
///     "livemode": false,
///     "access_token": "sk_test_abc"
/// }"#;
///
/// let info = LinkedAccountInfo::from_json(body)?;
/// assert_eq!(info.linked_account_id(), "acct_1032D82eZvKYlo2C");
/// assert_eq!(info.refresh_token(), "");
/// # Ok::<(), billing_proxy_client::BillingError>(())
/// ```
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedAccountInfo {
    #[serde(deserialize_with = "null_as_default")]
    id: String,
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    created: i64,
    #[serde(rename = "stripe_user_id", deserialize_with = "null_as_default")]
    linked_account_id: String,
    #[serde(deserialize_with = "null_as_default")]
    token_type: String,
    #[serde(rename = "stripe_publishable_key", deserialize_with = "null_as_default")]
    publishable_key: String,
    #[serde(deserialize_with = "null_as_default")]
    scope: String,
    #[serde(rename = "livemode", deserialize_with = "null_as_default")]
    live_mode: bool,
    #[serde(deserialize_with = "null_as_default")]
    refresh_token: String,
    #[serde(deserialize_with = "null_as_default")]
    access_token: String,
}

impl LinkedAccountInfo {
    /// Decodes a link response document.
    ///
    /// # Errors
    ///
    /// Returns a transport failure if the body is not a JSON object.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|source| {
            TransportError::MalformedResponse { operation: "connect account", source }.into()
        })
    }

    /// Identifier assigned to this link record by the backend.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name of the linked merchant.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Link creation time in seconds since the Unix epoch.
    #[must_use]
    pub fn created(&self) -> i64 {
        self.created
    }

    /// Link creation time, if `created` is a representable timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    /// Processor identifier of the connected account (`stripe_user_id`).
    #[must_use]
    pub fn linked_account_id(&self) -> &str {
        &self.linked_account_id
    }

    /// Type of the access credential, usually `bearer`.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Publishable key usable by front-end code for the connected account.
    #[must_use]
    pub fn publishable_key(&self) -> &str {
        &self.publishable_key
    }

    /// Permission scope granted for the connected account.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Whether the link is against the processor's production environment.
    #[must_use]
    pub fn is_live_mode(&self) -> bool {
        self.live_mode
    }

    /// Long-lived credential used to mint new access tokens.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Short-lived credential for authenticated processor calls.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for LinkedAccountInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedAccountInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("created", &self.created)
            .field("linked_account_id", &self.linked_account_id)
            .field("token_type", &self.token_type)
            .field("publishable_key", &self.publishable_key)
            .field("scope", &self.scope)
            .field("live_mode", &self.live_mode)
            .field("refresh_token", &redacted(&self.refresh_token))
            .field("access_token", &redacted(&self.access_token))
            .finish()
    }
}

/// Backends serializing unset bean properties write `null` rather than
/// omitting the key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "[REDACTED]" }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{BillingError, ErrorKind};

    fn full_document() -> serde_json::Value {
        json!({
            "id": "link_01",
            "name": "Corner Bakery",
            "created": 1_700_000_000,
            "stripe_user_id": "acct_123",
            "token_type": "bearer",
            "stripe_publishable_key": "pk_test_456",
            "scope": "read_write",
            "livemode": true,
            "refresh_token": "rt_789",
            "access_token": "sk_test_000",
        })
    }

    #[test]
    fn test_decode_all_wire_fields() {
        let body = serde_json::to_vec(&full_document()).unwrap();
        let info = LinkedAccountInfo::from_json(&body).unwrap();

        assert_eq!(info.id(), "link_01");
        assert_eq!(info.name(), "Corner Bakery");
        assert_eq!(info.created(), 1_700_000_000);
        assert_eq!(info.linked_account_id(), "acct_123");
        assert_eq!(info.token_type(), "bearer");
        assert_eq!(info.publishable_key(), "pk_test_456");
        assert_eq!(info.scope(), "read_write");
        assert!(info.is_live_mode());
        assert_eq!(info.refresh_token(), "rt_789");
        assert_eq!(info.access_token(), "sk_test_000");
    }

    #[test]
    fn test_wire_round_trip_preserves_every_field() {
        let original = full_document();
        let info: LinkedAccountInfo = serde_json::from_value(original.clone()).unwrap();

        let encoded = serde_json::to_value(&info).unwrap();
        assert_eq!(encoded, original);

        let decoded: LinkedAccountInfo = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn test_missing_tokens_decode_as_empty() {
        let mut document = full_document();
        let object = document.as_object_mut().unwrap();
        object.remove("access_token");
        object.remove("refresh_token");

        let info: LinkedAccountInfo = serde_json::from_value(document).unwrap();
        assert_eq!(info.access_token(), "");
        assert_eq!(info.refresh_token(), "");
        assert_eq!(info.linked_account_id(), "acct_123");
    }

    #[test]
    fn test_null_fields_decode_as_empty() {
        let body = br#"{
            "id": null,
            "name": null,
            "created": null,
            "stripe_user_id": "acct_123",
            "token_type": "bearer",
            "stripe_publishable_key": null,
            "scope": null,
            "livemode": null,
            "refresh_token": null,
            "access_token": "sk"
        }"#;

        let info = LinkedAccountInfo::from_json(body).unwrap();
        assert_eq!(info.id(), "");
        assert_eq!(info.name(), "");
        assert_eq!(info.created(), 0);
        assert_eq!(info.linked_account_id(), "acct_123");
        assert_eq!(info.publishable_key(), "");
        assert_eq!(info.scope(), "");
        assert!(!info.is_live_mode());
        assert_eq!(info.refresh_token(), "");
        assert_eq!(info.access_token(), "sk");
    }

    #[test]
    fn test_wrong_type_is_still_malformed() {
        let err = LinkedAccountInfo::from_json(br#"{"livemode": "yes"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut document = full_document();
        document["stripe_account_type"] = json!("standard");
        document["nested"] = json!({ "a": [1, 2, 3] });

        let info: LinkedAccountInfo = serde_json::from_value(document).unwrap();
        assert_eq!(info.scope(), "read_write");
    }

    #[test]
    fn test_malformed_body_is_transport_failure() {
        let result = LinkedAccountInfo::from_json(b"<html>502</html>");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(matches!(
            err,
            BillingError::TransportFailure(TransportError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_created_at() {
        let info: LinkedAccountInfo = serde_json::from_value(full_document()).unwrap();
        let created = info.created_at().unwrap();
        assert_eq!(created.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let info: LinkedAccountInfo = serde_json::from_value(full_document()).unwrap();
        let debug = format!("{info:?}");
        assert!(debug.contains("acct_123"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("rt_789"));
        assert!(!debug.contains("sk_test_000"));
    }
}
