//! # storefront-checkout: Checkout Session Layer
//!
//! Holds one customer's checkout (cart, wallet, coupon, payment method),
//! talks to the remote collaborators, and hands every calculation to
//! `storefront-core`.
//!
//! ## Module Organization
//! ```text
//! storefront_checkout/
//! ├── lib.rs          ◄─── You are here
//! ├── session.rs      ◄─── CheckoutSession (what the pages call)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── cart.rs     ◄─── Cart lines
//! │   └── checkout.rs ◄─── Arc<Mutex<CheckoutState>>
//! ├── services.rs     ◄─── Coupon / wallet / artwork / order traits
//! ├── quote.rs        ◄─── Price a JSON cart without a session
//! ├── config.rs       ◄─── storefront.toml + STOREFRONT_* overrides
//! ├── telemetry.rs    ◄─── tracing-subscriber setup
//! ├── error.rs        ◄─── CheckoutError, ErrorResponse
//! └── bin/quote.rs    ◄─── Price a cart from JSON
//! ```
//!
//! ## Example Usage
//! ```rust,ignore
//! let config = CheckoutConfig::load(None)?;
//! let session = CheckoutSession::new(customer_id, config.store_settings(), services);
//!
//! session.add_line(line)?;
//! session.refresh_wallet().await?;
//! session.set_wallet_applied(true)?;
//! session.apply_coupon("welcome10").await?;
//!
//! let receipt = session.place_order(address).await?;
//! ```

pub mod config;
pub mod error;
pub mod quote;
pub mod services;
pub mod session;
pub mod state;
pub mod telemetry;

pub use config::CheckoutConfig;
pub use error::{CheckoutError, CheckoutResult, ErrorCode, ErrorResponse};
pub use session::{CheckoutSession, Collaborators};
pub use telemetry::init_tracing;
