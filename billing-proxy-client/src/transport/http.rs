//! HTTP transport to the billing proxy.
//!
//! One reqwest client is built per candidate URL so that each URL can carry
//! its own trust root. Every request is authenticated with HTTP Basic
//! credentials and identified by the configured user agent.

use std::marker::PhantomData;

use rand_core::{OsRng, RngCore};
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{Span, debug, instrument, warn};
use url::Url;

use super::{BillingTransport, RecurringBillingTransport, path::build_url};
use crate::{
    account::LinkedAccountInfo,
    catalog::{CustomerIds, PlanCollection, ProductCollection, RawDocument},
    config::{Credentials, EndpointConfig, HttpVersion, ServiceConfig, TrustRoot},
    error::{BillingError, Result, TransportError},
    protocol::{ProtocolLevel, Recurring},
    request::SubscriptionRequest,
};

#[derive(Serialize)]
struct ConnectBody<'a> {
    authorization_code: &'a str,
}

#[derive(Debug)]
struct Endpoint {
    base: Url,
    client: Client,
}

/// Transport that pushes each billing operation to the proxy over HTTPS.
///
/// The protocol level `P` fixes the charge payload and whether plan and
/// subscription calls are available.
///
/// # Examples
///
/// ```no_run
/// use billing_proxy_client::{
///     config::{Credentials, ServiceConfig, ServiceUrl},
///     protocol::Legacy,
///     transport::PushTransport,
/// };
///
/// let config = ServiceConfig::with_urls(
///     vec![ServiceUrl::new("https://billing.example.org")?],
///     Credentials::new("+15550100", "secret")?,
///     "ExampleMessenger/5.2 Android",
/// )?;
/// let transport = PushTransport::<Legacy>::new(&config)?;
/// # Ok::<(), billing_proxy_client::BillingError>(())
/// ```
#[derive(Debug)]
pub struct PushTransport<P: ProtocolLevel = Recurring> {
    endpoints: Vec<Endpoint>,
    credentials: Credentials,
    paths: EndpointConfig,
    level: PhantomData<P>,
}

impl<P: ProtocolLevel> PushTransport<P> {
    /// Builds HTTP clients for every configured URL.
    ///
    /// No connection is opened here.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidArgument`] if an HTTP client cannot be
    /// built from the configuration, for example because a trust root is not
    /// a usable certificate.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let endpoints = config
            .urls()
            .iter()
            .map(|url| {
                Ok(Endpoint {
                    base: url.url().clone(),
                    client: build_client(config, url.trust_root())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(protocol = P::NAME, endpoints = endpoints.len(), "billing transport ready");

        Ok(Self {
            endpoints,
            credentials: config.credentials().clone(),
            paths: config.endpoints().clone(),
            level: PhantomData,
        })
    }

    /// Number of candidate endpoints.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    fn pick_endpoint(&self) -> Result<&Endpoint> {
        match self.endpoints.as_slice() {
            [] => Err(TransportError::NoEndpoint.into()),
            [only] => Ok(only),
            all => Ok(&all[endpoint_index(&mut OsRng, all.len())?]),
        }
    }

    #[instrument(skip_all, fields(method = %method, path = endpoint, host))]
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        segments: &[&str],
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        let target = self.pick_endpoint()?;
        let url = build_url(&target.base, endpoint, segments)?;
        Span::current().record("host", url.host_str().unwrap_or_default());

        let mut request = target
            .client
            .request(method, url)
            .basic_auth(self.credentials.user(), Some(self.credentials.password()));

        if let Some(body) = body {
            request = request.header(reqwest::header::CONTENT_TYPE, "application/json").body(body);
        }

        debug!("sending billing request");
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "billing proxy unreachable");
            TransportError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await.map_err(TransportError::from)?;
            debug!(status = status.as_u16(), bytes = body.len(), "billing request succeeded");
            return Ok(body.to_vec());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "billing proxy returned an error status");
        Err(classify_failure(status, body))
    }
}

fn endpoint_index<R: RngCore>(rng: &mut R, count: usize) -> Result<usize> {
    let mut seed = [0_u8; 8];
    rng.try_fill_bytes(&mut seed).map_err(TransportError::EndpointSelection)?;
    let index = u64::from_le_bytes(seed) % count as u64;
    Ok(usize::try_from(index).unwrap_or_default())
}

fn build_client(config: &ServiceConfig, trust_root: Option<&TrustRoot>) -> Result<Client> {
    let http = config.http();
    let mut builder = Client::builder()
        .user_agent(config.user_agent())
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .timeout(http.timeout())
        .connect_timeout(http.connect_timeout());

    builder = match http.http_version {
        HttpVersion::Http1 => builder.http1_only(),
        HttpVersion::Http2 => builder.http2_prior_knowledge(),
        HttpVersion::Auto => builder,
    };

    if let Some(root) = trust_root {
        builder = builder
            .tls_built_in_root_certs(false)
            .add_root_certificate(root.certificate().clone());
    }

    builder.build().map_err(|e| BillingError::invalid(format!("cannot build HTTP client: {e}")))
}

/// Client errors are the backend declining the request; everything else is
/// a transport failure.
fn classify_failure(status: StatusCode, body: String) -> BillingError {
    if status.is_client_error() {
        let message = match body.trim() {
            "" => status.canonical_reason().unwrap_or("request rejected").to_owned(),
            text => text.to_owned(),
        };
        return BillingError::RequestRejected { status: status.as_u16(), message };
    }
    TransportError::Status { status: status.as_u16(), body }.into()
}

fn encode<T: Serialize + ?Sized>(operation: &str, payload: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(payload)
        .map_err(|e| BillingError::invalid(format!("cannot encode {operation} request: {e}")))
}

fn decode<T: DeserializeOwned>(operation: &'static str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|source| TransportError::MalformedResponse { operation, source }.into())
}

fn decode_customer_ids(body: &[u8]) -> Result<CustomerIds> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CustomerIds::new());
    }
    let ids: Option<CustomerIds> = decode("customer ids", body)?;
    Ok(ids.unwrap_or_default())
}

impl<P: ProtocolLevel> BillingTransport for PushTransport<P> {
    type Charge = P::Charge;

    fn protocol_name(&self) -> &'static str {
        P::NAME
    }

    async fn exchange_authorization_code<'a>(&'a self, code: &'a str) -> Result<LinkedAccountInfo> {
        let body = encode("connect account", &ConnectBody { authorization_code: code })?;
        let response = self.execute(Method::POST, self.paths.connect(), &[], Some(body)).await?;
        LinkedAccountInfo::from_json(&response)
    }

    async fn revoke<'a>(&'a self, user_id: &'a str) -> Result<()> {
        self.execute(Method::DELETE, self.paths.revoke(), &[user_id], None).await?;
        Ok(())
    }

    async fn list_products<'a>(&'a self, seller_handle: &'a str) -> Result<ProductCollection> {
        let response =
            self.execute(Method::GET, self.paths.products(), &[seller_handle], None).await?;
        decode("products", &response)
    }

    async fn fetch_payment_history<'a>(&'a self, contact_handle: &'a str) -> Result<RawDocument> {
        let response =
            self.execute(Method::GET, self.paths.payments(), &[contact_handle], None).await?;
        Ok(RawDocument::from(response))
    }

    async fn submit_charge<'a>(&'a self, charge: &'a Self::Charge) -> Result<RawDocument> {
        let body = encode("charge", charge)?;
        let response = self.execute(Method::POST, self.paths.charge(), &[], Some(body)).await?;
        Ok(RawDocument::from(response))
    }

    async fn list_customer_ids(&self) -> Result<CustomerIds> {
        let response = self.execute(Method::GET, self.paths.customers(), &[], None).await?;
        decode_customer_ids(&response)
    }
}

impl RecurringBillingTransport for PushTransport<Recurring> {
    async fn list_plans<'a>(&'a self, seller_handle: &'a str) -> Result<PlanCollection> {
        let response =
            self.execute(Method::GET, self.paths.plans(), &[seller_handle], None).await?;
        decode("plans", &response)
    }

    async fn submit_subscription<'a>(
        &'a self,
        subscription: &'a SubscriptionRequest,
    ) -> Result<RawDocument> {
        let body = encode("subscription", subscription)?;
        let response =
            self.execute(Method::POST, self.paths.subscription(), &[], Some(body)).await?;
        Ok(RawDocument::from(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{HttpConfig, ServiceUrl},
        error::ErrorKind,
        protocol::Legacy,
    };

    const ROOT_PEM: &[u8] = include_bytes!("../../tests/fixtures/proxy-root.pem");

    fn config(urls: &[&str]) -> ServiceConfig {
        ServiceConfig::with_urls(
            urls.iter().map(|u| ServiceUrl::new(u).unwrap()).collect(),
            Credentials::new("+15550100", "hunter2").unwrap(),
            "Messenger/1.0",
        )
        .unwrap()
    }

    #[test]
    fn test_new_builds_one_client_per_url() {
        let transport = PushTransport::<Recurring>::new(&config(&[
            "https://a.example.org",
            "https://b.example.org",
            "https://c.example.org",
        ]))
        .unwrap();
        assert_eq!(transport.endpoint_count(), 3);
    }

    #[test]
    fn test_protocol_name_follows_level() {
        let config = config(&["https://a.example.org"]);
        assert_eq!(PushTransport::<Legacy>::new(&config).unwrap().protocol_name(), "legacy");
        assert_eq!(PushTransport::<Recurring>::new(&config).unwrap().protocol_name(), "recurring");
    }

    #[test]
    fn test_new_with_trust_root_and_http_versions() {
        let root = TrustRoot::from_pem(ROOT_PEM).unwrap();
        let base = ServiceConfig::with_trust_root(
            "https://billing.test",
            root,
            Credentials::new("+15550100", "hunter2").unwrap(),
            "Messenger/1.0",
        )
        .unwrap();

        for http_version in [HttpVersion::Http1, HttpVersion::Http2, HttpVersion::Auto] {
            let config = base
                .clone()
                .with_http(HttpConfig { http_version, ..HttpConfig::default() })
                .unwrap();
            assert!(PushTransport::<Recurring>::new(&config).is_ok());
        }
    }

    #[test]
    fn test_pick_endpoint_stays_in_range() {
        let transport = PushTransport::<Legacy>::new(&config(&[
            "https://a.example.org",
            "https://b.example.org",
        ]))
        .unwrap();

        for _ in 0..64 {
            let host = transport.pick_endpoint().unwrap().base.host_str().unwrap().to_owned();
            assert!(host == "a.example.org" || host == "b.example.org");
        }
    }

    struct ExhaustedRng;

    impl RngCore for ExhaustedRng {
        fn next_u32(&mut self) -> u32 {
            unreachable!("only try_fill_bytes is used")
        }

        fn next_u64(&mut self) -> u64 {
            unreachable!("only try_fill_bytes is used")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unreachable!("only try_fill_bytes is used")
        }

        fn try_fill_bytes(
            &mut self,
            _dest: &mut [u8],
        ) -> std::result::Result<(), rand_core::Error> {
            Err(rand_core::Error::new("entropy source unavailable"))
        }
    }

    #[test]
    fn test_endpoint_index_reports_rng_failure() {
        let error = endpoint_index(&mut ExhaustedRng, 3).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TransportFailure);
        assert!(matches!(
            error,
            BillingError::TransportFailure(TransportError::EndpointSelection(_))
        ));
    }

    #[test]
    fn test_endpoint_index_in_range() {
        for count in 1..=5 {
            let index = endpoint_index(&mut OsRng, count).unwrap();
            assert!(index < count);
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let transport = PushTransport::<Legacy>::new(&config(&["https://a.example.org"])).unwrap();
        let debug = format!("{transport:?}");
        assert!(debug.contains("PushTransport"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_classify_client_error_as_rejection() {
        let error = classify_failure(StatusCode::BAD_REQUEST, "code already used\n".to_owned());
        assert!(matches!(
            &error,
            BillingError::RequestRejected { status: 400, message } if message == "code already used"
        ));
    }

    #[test]
    fn test_classify_empty_rejection_uses_reason_phrase() {
        let error = classify_failure(StatusCode::NOT_FOUND, String::new());
        assert!(matches!(
            &error,
            BillingError::RequestRejected { status: 404, message } if message == "Not Found"
        ));
    }

    #[test]
    fn test_classify_server_error_as_transport_failure() {
        let error = classify_failure(StatusCode::BAD_GATEWAY, "upstream down".to_owned());
        assert_eq!(error.kind(), ErrorKind::TransportFailure);
        assert_eq!(error.status(), Some(502));
    }

    #[test]
    fn test_customer_ids_empty_body_and_null() {
        assert!(decode_customer_ids(b"").unwrap().is_empty());
        assert!(decode_customer_ids(b" \n").unwrap().is_empty());
        assert!(decode_customer_ids(b"null").unwrap().is_empty());
        assert!(decode_customer_ids(b"{}").unwrap().is_empty());
    }

    #[test]
    fn test_customer_ids_mapping() {
        let ids = decode_customer_ids(br#"{"stripe": "cus_123"}"#).unwrap();
        assert_eq!(ids.get("stripe").map(String::as_str), Some("cus_123"));

        let error = decode_customer_ids(b"[1, 2]").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TransportFailure);
    }

    #[test]
    fn test_connect_body_wire_format() {
        let body = encode("connect account", &ConnectBody { authorization_code: "ac_123" }).unwrap();
        assert_eq!(body, br#"{"authorization_code":"ac_123"}"#);
    }
}
