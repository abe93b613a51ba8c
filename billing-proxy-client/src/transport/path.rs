//! Request URL construction.

use url::Url;

use crate::error::{BillingError, Result};

/// Joins a base URL, an endpoint path, and identifier segments.
///
/// The base URL's own path is kept as a prefix. Segments are percent-encoded,
/// so handles such as `+15550100` or ids containing `/` stay a single segment.
/// Dot segments would be dropped by normalisation and are rejected instead.
pub(crate) fn build_url(base: &Url, endpoint: &str, segments: &[&str]) -> Result<Url> {
    if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
        return Err(BillingError::invalid(format!("identifier '{segment}' is not allowed")));
    }

    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| BillingError::invalid(format!("service URL cannot be a base: {base}")))?;
        path.pop_if_empty();
        path.extend(endpoint.split('/').filter(|part| !part.is_empty()));
        path.extend(segments);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    fn percent_decode(input: &str) -> String {
        let bytes = input.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                i += 3;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_endpoint_without_segments() {
        let url = build_url(&base("https://billing.example.org"), "/v1/billing/charge", &[]);
        assert_eq!(url.unwrap().as_str(), "https://billing.example.org/v1/billing/charge");
    }

    #[test]
    fn test_base_path_is_kept() {
        let url =
            build_url(&base("https://example.org/proxy/"), "/v1/billing/products", &["seller"]);
        assert_eq!(url.unwrap().as_str(), "https://example.org/proxy/v1/billing/products/seller");
    }

    #[test]
    fn test_phone_number_segment() {
        let url = build_url(&base("https://example.org"), "/v1/billing/plans", &["+15550100"]);
        assert_eq!(url.unwrap().path(), "/v1/billing/plans/+15550100");
    }

    #[test]
    fn test_segment_cannot_escape_its_position() {
        let url = build_url(&base("https://example.org"), "/v1/billing/revoke", &["../admin"])
            .unwrap();
        assert_eq!(url.path(), "/v1/billing/revoke/..%2Fadmin");

        let url = build_url(&base("https://example.org"), "/v1/billing/payments", &["a b?c#d"])
            .unwrap();
        assert_eq!(url.path(), "/v1/billing/payments/a%20b%3Fc%23d");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_dot_segments_rejected() {
        for segment in [".", ".."] {
            let result = build_url(&base("https://example.org"), "/v1/billing/revoke", &[segment]);
            assert!(matches!(result, Err(BillingError::InvalidArgument(_))));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn test_segment_stays_single_and_decodes_back(
            segment in "[a-zA-Z0-9+/ %?#&=_~.\\-\\\\ü€]{1,40}",
        ) {
            prop_assume!(segment != "." && segment != "..");

            let url = build_url(&base("https://example.org"), "/v1/billing/products", &[&segment])
                .unwrap();
            let reparsed = Url::parse(url.as_str()).unwrap();
            let segments: Vec<&str> = reparsed.path_segments().unwrap().collect();

            prop_assert_eq!(segments.len(), 4);
            prop_assert_eq!(percent_decode(segments[3]), segment);
            prop_assert!(reparsed.query().is_none());
        }
    }
}
