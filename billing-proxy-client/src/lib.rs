//! Billing Proxy Client: payment operations through a trusted intermediary
//!
//! A messaging client never talks to the payment processor directly. Every
//! billing operation (linking a merchant account, listing a seller's catalog,
//! charging, subscribing) goes through an authenticated billing proxy, which
//! holds the processor credentials. This crate is the client side of that
//! proxy.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Application     │  messenger UI, bots, admin tools
//! └────────┬─────────┘
//!          │ BillingClient operations
//!          │
//! ┌────────▼─────────────────────────────────────────┐
//! │          Billing Proxy Client (this crate)       │
//! │  ┌───────────────┐      ┌─────────────────────┐  │
//! │  │ BillingClient │──────│  BillingTransport   │  │
//! │  │ (validation,  │      │  (PushTransport:    │  │
//! │  │  logging)     │      │   reqwest + TLS)    │  │
//! │  └───────────────┘      └─────────────────────┘  │
//! └────────┬─────────────────────────────────────────┘
//!          │ HTTPS + Basic auth
//!          │
//! ┌────────▼─────────┐
//! │  Billing Proxy   │──── payment processor
//! └──────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Link a merchant account
//!
//! ```rust,no_run
//! use billing_proxy_client::{
//!     LegacyBillingClient,
//!     config::{Credentials, ServiceConfig, ServiceUrl},
//! };
//!
//! # async fn example() -> billing_proxy_client::Result<()> {
//! let config = ServiceConfig::with_urls(
//!     vec![ServiceUrl::new("https://billing.example.org")?],
//!     Credentials::new("+15550100", "secret")?,
//!     "ExampleMessenger/5.2 Android",
//! )?;
//! let client = LegacyBillingClient::new(&config)?;
//!
//! let account = client.connect_account("ac_123456").await?;
//! println!("linked {}", account.linked_account_id());
//! # Ok(())
//! # }
//! ```
//!
//! ## 2. Subscribe with the stored payment method
//!
//! ```rust,no_run
//! use billing_proxy_client::{RecurringBillingClient, config::ClientConfig};
//!
//! # async fn example() -> billing_proxy_client::Result<()> {
//! let client = RecurringBillingClient::from_config(ClientConfig::from_file("billing.toml")?)?;
//!
//! let plans = client.get_plans("+15550199").await?;
//! if let Some(plan) = plans.iter().next() {
//!     client.subscribe_to_plan(&plan.id, None, "+15550199", "Monthly").await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Protocol Levels
//!
//! Proxies speak one of two protocol generations, chosen at construction:
//!
//! | Level | Client alias | Plans & subscriptions | Charge payload |
//! |-------|--------------|-----------------------|----------------|
//! | [`Legacy`](protocol::Legacy) | [`LegacyBillingClient`] | no | [`Charge`](request::Charge) |
//! | [`Recurring`](protocol::Recurring) | [`RecurringBillingClient`] | yes | [`NamedCharge`](request::NamedCharge) |
//!
//! Calling `get_plans` on a legacy client does not compile.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`] with [`BillingError`]:
//!
//! - `TransportFailure`: the proxy could not be reached or answered with a
//!   server-side error or an undecodable body
//! - `RequestRejected`: the proxy or processor declined the request
//! - `InvalidArgument`: rejected locally, nothing was sent
//!
//! Nothing is retried. Charges and subscriptions are not idempotent, so the
//! retry decision stays with the caller.
//!
//! # Logging
//!
//! Operations emit [`tracing`] spans and events. Installing a subscriber is
//! up to the application. Authorization codes, tokens, and the proxy password
//! are never logged.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and wiremock"
)]

pub mod account;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod request;
pub mod transport;

pub use account::LinkedAccountInfo;
pub use client::{BillingClient, LegacyBillingClient, RecurringBillingClient};
pub use config::{ClientConfig, ServiceConfig};
pub use error::{BillingError, Result};
pub use transport::{BillingTransport, PushTransport, RecurringBillingTransport};
