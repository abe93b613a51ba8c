//! Links a merchant account and lists what the principal can buy from a seller.
//!
//! # Running this example
//!
//! Write a client configuration file:
//! ```toml
//! user_agent = "ExampleMessenger/5.2 Linux"
//!
//! [[urls]]
//! url = "https://billing.example.org"
//!
//! [credentials]
//! user = "+15550100"
//! password_env = "BILLING_PASSWORD"
//! ```
//!
//! Then run:
//! ```bash
//! export BILLING_PASSWORD=...
//! RUST_LOG=billing_proxy_client=debug LOG_FORMAT=pretty \
//!     cargo run --example link_account -- billing.toml ac_123456 +15550199
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use std::{env, io};

use billing_proxy_client::{BillingError, RecurringBillingClient, config::ClientConfig};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    match env::var("LOG_FORMAT").unwrap_or_default().to_lowercase().as_str() {
        "json" => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(io::stderr),
            )
            .init(),
        _ => subscriber
            .with(fmt::layer().with_span_events(FmtSpan::CLOSE).with_writer(io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut args = env::args().skip(1);
    let (Some(config_path), Some(code)) = (args.next(), args.next()) else {
        eprintln!("usage: link_account <config.toml> <authorization-code> [seller-handle]");
        std::process::exit(2);
    };
    let seller = args.next();

    let client = RecurringBillingClient::from_config(ClientConfig::from_file(&config_path)?)?;

    match client.connect_account(&code).await {
        Ok(account) => {
            println!("Linked account {}", account.linked_account_id());
            println!("  live mode: {}", account.is_live_mode());
            println!("  scope:     {}", account.scope());
            if let Some(created) = account.created_at() {
                println!("  created:   {}", created.to_rfc3339());
            }
        }
        Err(BillingError::RequestRejected { status, message }) => {
            eprintln!("The proxy refused the code ({status}): {message}");
            eprintln!("Authorization codes are single use; restart the consent flow.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let ids = client.get_customer_ids().await?;
    for (processor, customer) in &ids {
        println!("Customer at {}: {}", processor, customer);
    }

    if let Some(seller) = seller {
        let products = client.get_products(&seller).await?;
        println!("\n{} product(s) from {}:", products.len(), seller);
        for product in &products {
            println!("  {} {}", product.id, product.name.as_deref().unwrap_or("(unnamed)"));
        }

        let plans = client.get_plans(&seller).await?;
        println!("\n{} plan(s) from {}:", plans.len(), seller);
        for plan in &plans {
            let price = plan.amount.map_or_else(|| "?".to_owned(), |a| a.to_string());
            println!(
                "  {} {} {} per {}",
                plan.id,
                price,
                plan.currency.as_deref().unwrap_or(""),
                plan.interval.as_deref().unwrap_or("?")
            );
        }
    }

    Ok(())
}
