//! # State Module
//!
//! Per-session state for checkout.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  SessionState = Arc<Mutex<CheckoutState>>                        │  │
//! │  │                                                                  │  │
//! │  │  ┌──────────────┐ ┌──────────────┐ ┌──────────┐ ┌─────────────┐ │  │
//! │  │  │     Cart     │ │ WalletState  │ │  Coupon  │ │PaymentMethod│ │  │
//! │  │  │  CartEntry*  │ │balance/apply │ │ Option   │ │ online/cod  │ │  │
//! │  │  └──────────────┘ └──────────────┘ └──────────┘ └─────────────┘ │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  One lock for all four: wallet/COD and coupon staleness span fields.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod checkout;

pub use cart::{Cart, CartEntry, CartTotals};
pub use checkout::{CheckoutState, SessionState};
