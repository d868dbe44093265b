//! # Quote
//!
//! Prints the checkout breakdown for a cart described in JSON.
//!
//! ## Usage
//! ```bash
//! # Read the request from a file
//! cargo run -p storefront-checkout --bin quote -- --input cart.json
//!
//! # Read from stdin with a specific config file
//! cat cart.json | cargo run -p storefront-checkout --bin quote -- --config ./storefront.toml
//!
//! # Override the store tax rate for one run
//! STOREFRONT_TAX_RATE=12 cargo run -p storefront-checkout --bin quote -- -i cart.json
//! ```

use std::env;
use std::io::Read;
use std::path::PathBuf;

use storefront_checkout::quote::{quote, QuoteRequest};
use storefront_checkout::{init_tracing, CheckoutConfig, ErrorResponse};
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut input_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--input" | "-i" => {
                if i + 1 < args.len() {
                    input_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Checkout Quote");
                println!();
                println!("Usage: quote [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -i, --input <PATH>   Quote request JSON (default: stdin)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let config = CheckoutConfig::load(config_path)?;
    let settings = config.store_settings();
    info!(
        store = %config.store.name,
        tax_rate = %settings.tax_rate,
        free_shipping_threshold = %settings.free_shipping_threshold,
        shipping_charge = %settings.shipping_charge,
        "Store settings loaded"
    );

    let raw = match &input_path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let request: QuoteRequest = serde_json::from_str(&raw)?;

    match quote(&request, &settings) {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Quote failed");
            let body = ErrorResponse::from(&e);
            println!("{}", serde_json::to_string_pretty(&body)?);
            std::process::exit(1);
        }
    }
}
