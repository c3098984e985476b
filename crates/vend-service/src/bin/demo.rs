//! # Vending Demo
//!
//! Runs a handful of purchases against an in-memory machine and prints each
//! order as JSON.
//!
//! ## Usage
//! ```bash
//! # Built-in catalog and coin pool
//! cargo run -p vend-service --bin vend-demo
//!
//! # Custom machine
//! cargo run -p vend-service --bin vend-demo -- --config ./vend.toml
//!
//! # More logging
//! RUST_LOG=debug cargo run -p vend-service --bin vend-demo
//! ```

use anyhow::{Context, Result};
use serde_json::json;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vend_core::{Money, Product};
use vend_service::{
    InMemoryProductRepository, MachineConfig, Order, ServiceResult, SessionId, VendingService,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vending Demo");
                println!();
                println!("Usage: vend-demo [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Machine config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = MachineConfig::load(config_path).context("loading machine config")?;
    let repository = Arc::new(InMemoryProductRepository::new());
    let service = Arc::new(
        VendingService::bootstrap(&config, repository)
            .await
            .context("bootstrapping vending machine")?,
    );

    let products = service.list_products().await?;
    let cheapest = products
        .iter()
        .min_by_key(|p| p.price())
        .cloned()
        .context("catalog is empty")?;
    let priciest = products
        .iter()
        .max_by_key(|p| p.price())
        .cloned()
        .context("catalog is empty")?;

    info!(machine = service.name(), "Running purchase scenarios");

    // Pay with a large coin and receive change.
    let session = service.open_session();
    let outcome = buy(&service, session, &[10.0], &cheapest).await;
    report("change from a large coin", outcome);

    // Not enough money for the selection, then walk away.
    let session = service.open_session();
    let outcome = buy(&service, session, &[1.0], &priciest).await;
    report("insufficient funds", outcome);
    if service.total_inserted(session).await.is_positive() {
        report("refund after refusal", service.cancel_order(session).await);
    }

    // Exact payment.
    let session = service.open_session();
    let coins = exact_coins(&cheapest);
    let outcome = buy(&service, session, &coins, &cheapest).await;
    report("exact payment", outcome);

    // Insert coins, select nothing, cancel.
    let session = service.open_session();
    for value in [2.0, 1.0] {
        service.insert_money(session, Money::new(value)?).await?;
    }
    report("cancel with refund", service.cancel_order(session).await);

    // Two customers at once.
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            let product = cheapest.clone();
            tokio::spawn(async move {
                let session = service.open_session();
                buy(&service, session, &[5.0], &product).await
            })
        })
        .collect();
    for (n, task) in tasks.into_iter().enumerate() {
        let outcome = task.await.context("concurrent session panicked")?;
        report(&format!("concurrent customer {}", n + 1), outcome);
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "products": service.list_products().await?,
            "coins": service
                .coin_counts()
                .await
                .into_iter()
                .map(|(d, count)| json!({ "denomination": d.value(), "count": count }))
                .collect::<Vec<_>>(),
        }))?
    );

    Ok(())
}

/// Inserts the coins, selects one product and completes.
async fn buy(
    service: &VendingService,
    session: SessionId,
    coins: &[f64],
    product: &Product,
) -> ServiceResult<Order> {
    for value in coins {
        service.insert_money(session, Money::new(*value)?).await?;
    }
    service.select_product(session, product.id()).await?;
    service.complete_order(session).await
}

/// Coins summing to the product's price, largest first, when the price is
/// a multiple of 0.50.
fn exact_coins(product: &Product) -> Vec<f64> {
    let mut remaining = product.price().cents();
    let mut coins = Vec::new();
    for denomination in vend_core::Denomination::DESCENDING {
        while remaining >= denomination.cents() {
            coins.push(denomination.value());
            remaining -= denomination.cents();
        }
    }
    coins
}

fn report(label: &str, outcome: ServiceResult<Order>) {
    let body = match outcome {
        Ok(order) => json!({ "scenario": label, "order": order }),
        Err(e) => json!({ "scenario": label, "error": e.code(), "message": e.to_string() }),
    };
    match serde_json::to_string_pretty(&body) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to render {label}: {e}"),
    }
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vend=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
