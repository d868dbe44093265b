//! Checkout session tests against in-memory collaborators.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use storefront_checkout::error::ErrorCode;
use storefront_checkout::services::{
    ArtworkStore, CouponService, CouponValidation, OrderReceipt, OrderRequest, OrderService,
    ShippingAddress, WalletBalance, WalletService,
};
use storefront_checkout::{
    CheckoutError, CheckoutResult, CheckoutSession, Collaborators, ErrorResponse,
};
use storefront_core::personalization::{
    ArtworkRef, PersonalizationConfig, PersonalizationSelection, PlacementOption, PrintTypeOption,
};
use storefront_core::{
    CartLine, CoreError, CouponCode, CouponType, Money, PaymentMethod, StoreSettings, TaxRate,
};

const HOODIE: &str = "550e8400-e29b-41d4-a716-446655440000";
const CAP: &str = "6ba7b810-9dad-41d1-80b4-00c04fd430c8";
const TEE: &str = "3f2b8c1e-5d4a-4e9b-9c7d-1a2b3c4d5e6f";

// =============================================================================
// Fakes
// =============================================================================

enum CouponRule {
    Percent(u32),
    Fixed { rupees: i64, min_subtotal: Money },
    FreeShipping,
}

#[derive(Default)]
struct FakeCoupons {
    rules: HashMap<String, CouponRule>,
    offline: AtomicBool,
    calls: Mutex<Vec<(String, Money)>>,
}

impl FakeCoupons {
    fn with_rule(mut self, code: &str, rule: CouponRule) -> Self {
        self.rules.insert(code.to_string(), rule);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn accepted(code: &str, coupon_type: CouponType, discount: f64) -> CouponValidation {
    CouponValidation {
        valid: true,
        coupon_code: Some(code.to_string()),
        discount_amount: discount,
        coupon_type: Some(coupon_type),
        message: None,
    }
}

fn rejected(message: &str) -> CouponValidation {
    CouponValidation {
        valid: false,
        coupon_code: None,
        discount_amount: 0.0,
        coupon_type: None,
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl CouponService for FakeCoupons {
    async fn validate(
        &self,
        code: &CouponCode,
        cart_subtotal: Money,
    ) -> CheckoutResult<CouponValidation> {
        self.calls
            .lock()
            .unwrap()
            .push((code.to_string(), cart_subtotal));

        if self.offline.load(Ordering::SeqCst) {
            return Err(CheckoutError::service("coupon", "connection timed out"));
        }

        let validation = match self.rules.get(code.as_str()) {
            None => rejected("Invalid coupon code"),
            Some(CouponRule::Percent(pct)) => accepted(
                code.as_str(),
                CouponType::Percentage,
                cart_subtotal.to_decimal() * f64::from(*pct) / 100.0,
            ),
            Some(CouponRule::Fixed {
                rupees,
                min_subtotal,
            }) => {
                if cart_subtotal < *min_subtotal {
                    rejected("Minimum order value not met")
                } else {
                    accepted(code.as_str(), CouponType::FixedAmount, *rupees as f64)
                }
            }
            Some(CouponRule::FreeShipping) => accepted(code.as_str(), CouponType::FreeShipping, 0.0),
        };
        Ok(validation)
    }
}

struct FakeWallet {
    balance: f64,
}

#[async_trait]
impl WalletService for FakeWallet {
    async fn balance(&self, _customer_id: &str) -> CheckoutResult<WalletBalance> {
        Ok(WalletBalance {
            balance: self.balance,
        })
    }
}

struct FakeArtwork;

#[async_trait]
impl ArtworkStore for FakeArtwork {
    async fn upload(&self, file_name: &str, _bytes: Vec<u8>) -> CheckoutResult<ArtworkRef> {
        Ok(ArtworkRef::new(format!("https://cdn.test/artwork/{}", file_name)))
    }
}

#[derive(Default)]
struct FakeOrders {
    submitted: Mutex<Vec<OrderRequest>>,
    fail_next: AtomicBool,
}

#[async_trait]
impl OrderService for FakeOrders {
    async fn submit(&self, request: OrderRequest) -> CheckoutResult<OrderReceipt> {
        let total = request.breakdown.total;
        self.submitted.lock().unwrap().push(request);

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CheckoutError::service("order", "502 Bad Gateway"));
        }

        let order_id = format!("ORD-{}", self.submitted.lock().unwrap().len());
        Ok(OrderReceipt { order_id, total })
    }
}

/// Holds every submit until released, so the test can act mid-flight.
#[derive(Default)]
struct GatedOrders {
    entered: Notify,
    release: Notify,
    submitted: Mutex<Vec<OrderRequest>>,
}

#[async_trait]
impl OrderService for GatedOrders {
    async fn submit(&self, request: OrderRequest) -> CheckoutResult<OrderReceipt> {
        let total = request.breakdown.total;
        self.submitted.lock().unwrap().push(request);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(OrderReceipt {
            order_id: "ORD-GATED".to_string(),
            total,
        })
    }
}

struct Harness {
    session: CheckoutSession,
    coupons: Arc<FakeCoupons>,
    orders: Arc<FakeOrders>,
}

fn harness(coupons: FakeCoupons, wallet_balance: f64) -> Harness {
    let coupons = Arc::new(coupons);
    let orders = Arc::new(FakeOrders::default());
    let services = Collaborators {
        coupons: coupons.clone(),
        wallet: Arc::new(FakeWallet {
            balance: wallet_balance,
        }),
        artwork: Arc::new(FakeArtwork),
        orders: orders.clone(),
    };

    Harness {
        session: CheckoutSession::new("customer-42", StoreSettings::default(), services),
        coupons,
        orders,
    }
}

fn line(id: &str, name: &str, rupees: i64, qty: u32) -> CartLine {
    CartLine::standard(id, name, Money::from_rupees(rupees), qty)
}

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".into(),
        phone: "+91 98450 00000".into(),
        line1: "12 MG Road".into(),
        line2: None,
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        postal_code: "560001".into(),
    }
}

fn tee_config() -> PersonalizationConfig {
    PersonalizationConfig {
        colors: BTreeSet::from(["Black".to_string(), "White".to_string()]),
        sizes: vec!["S".into(), "M".into(), "L".into()],
        print_types: BTreeMap::from([(
            "dtf".to_string(),
            PrintTypeOption {
                enabled: true,
                price: Money::from_rupees(20),
            },
        )]),
        placements: BTreeMap::from([(
            "front".to_string(),
            PlacementOption {
                enabled: true,
                price: Money::from_rupees(30),
                max_width: 12,
                max_height: 14,
            },
        )]),
        gst_rate: TaxRate::from_percent(12),
        print_gst_rate: TaxRate::from_percent(18),
    }
}

// =============================================================================
// Wallet & payment
// =============================================================================

#[tokio::test]
async fn test_wallet_discount_capped_at_ten_percent() {
    let h = harness(FakeCoupons::default(), 500.0);
    h.session.add_line(line(HOODIE, "Hoodie", 1000, 2)).unwrap();

    h.session.refresh_wallet().await.unwrap();
    let wallet = h.session.set_wallet_applied(true).unwrap();
    assert_eq!(wallet.balance, Money::from_rupees(500));

    let b = h.session.breakdown();
    assert_eq!(b.subtotal, Money::from_rupees(2000));
    assert_eq!(b.wallet_discount, Money::from_rupees(200));
}

#[tokio::test]
async fn test_wallet_below_minimum_is_rejected() {
    let h = harness(FakeCoupons::default(), 500.0);
    h.session.add_line(line(HOODIE, "Hoodie", 998, 1)).unwrap();
    h.session.refresh_wallet().await.unwrap();

    let err = h.session.set_wallet_applied(true).unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Core(CoreError::WalletMinimumNotMet { .. })
    ));
    assert_eq!(ErrorResponse::from(&err).code, ErrorCode::WalletError);
    assert!(!h.session.snapshot().wallet.is_applied);
}

#[tokio::test]
async fn test_cod_and_wallet_exclude_each_other() {
    let h = harness(FakeCoupons::default(), 500.0);
    h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();
    h.session.refresh_wallet().await.unwrap();
    h.session.set_wallet_applied(true).unwrap();

    // COD turns the wallet off
    h.session.select_payment_method(PaymentMethod::Cod).unwrap();
    let state = h.session.snapshot();
    assert_eq!(state.payment_method, PaymentMethod::Cod);
    assert!(!state.wallet.is_applied);
    assert_eq!(h.session.breakdown().wallet_discount, Money::zero());

    // Wallet switches COD back to online
    h.session.set_wallet_applied(true).unwrap();
    let state = h.session.snapshot();
    assert_eq!(state.payment_method, PaymentMethod::Online);
    assert!(state.wallet.is_applied);
}

// =============================================================================
// Coupons
// =============================================================================

#[tokio::test]
async fn test_apply_coupon_normalizes_code() {
    let h = harness(
        FakeCoupons::default().with_rule("SAVE10", CouponRule::Percent(10)),
        0.0,
    );
    h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();

    let coupon = h.session.apply_coupon("  save10 ").await.unwrap();
    assert_eq!(coupon.code.as_str(), "SAVE10");
    assert_eq!(coupon.discount_amount, Money::from_rupees(150));

    let b = h.session.breakdown();
    assert_eq!(b.coupon_discount, Money::from_rupees(150));
    assert_eq!(b.total, Money::from_rupees(1620));
}

#[tokio::test]
async fn test_rejected_coupon_keeps_previous_one() {
    let h = harness(
        FakeCoupons::default().with_rule("SAVE10", CouponRule::Percent(10)),
        0.0,
    );
    h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();
    h.session.apply_coupon("SAVE10").await.unwrap();

    let err = h.session.apply_coupon("NOPE").await.unwrap_err();
    assert!(matches!(err, CheckoutError::CouponRejected { .. }));
    assert_eq!(ErrorResponse::from(&err).code, ErrorCode::CouponRejected);

    let applied = h.session.snapshot().coupon.unwrap();
    assert_eq!(applied.code.as_str(), "SAVE10");
}

#[tokio::test]
async fn test_coupon_needs_a_cart() {
    let h = harness(
        FakeCoupons::default().with_rule("SAVE10", CouponRule::Percent(10)),
        0.0,
    );
    let err = h.session.apply_coupon("SAVE10").await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(h.coupons.call_count(), 0);
}

#[tokio::test]
async fn test_free_shipping_coupon_waives_shipping() {
    let h = harness(
        FakeCoupons::default().with_rule("SHIPFREE", CouponRule::FreeShipping),
        0.0,
    );
    h.session.add_line(line(CAP, "Cap", 400, 1)).unwrap();
    assert_eq!(h.session.breakdown().shipping, Money::from_rupees(99));

    h.session.apply_coupon("shipfree").await.unwrap();
    let b = h.session.breakdown();
    assert_eq!(b.shipping, Money::zero());
    assert_eq!(b.coupon_discount, Money::zero());
}

#[tokio::test]
async fn test_cart_change_makes_coupon_stale_and_revalidation_refreshes_it() {
    let h = harness(
        FakeCoupons::default().with_rule("SAVE10", CouponRule::Percent(10)),
        0.0,
    );
    let id = h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();
    h.session.apply_coupon("SAVE10").await.unwrap();
    assert!(!h.session.snapshot().coupon_is_stale());

    h.session.update_quantity(&id, 2).unwrap();
    assert!(h.session.snapshot().coupon_is_stale());
    // The engine keeps using the stale amount until revalidated
    assert_eq!(h.session.breakdown().coupon_discount, Money::from_rupees(150));

    let fresh = h.session.revalidate_coupon().await.unwrap().unwrap();
    assert_eq!(fresh.discount_amount, Money::from_rupees(300));
    assert_eq!(fresh.validated_subtotal, Money::from_rupees(3000));
    assert!(!h.session.snapshot().coupon_is_stale());

    // Nothing to do once fresh
    h.session.revalidate_coupon().await.unwrap();
    assert_eq!(h.coupons.call_count(), 2);
}

#[tokio::test]
async fn test_revalidation_drops_coupon_the_service_now_rejects() {
    let h = harness(
        FakeCoupons::default().with_rule(
            "FLAT200",
            CouponRule::Fixed {
                rupees: 200,
                min_subtotal: Money::from_rupees(1000),
            },
        ),
        0.0,
    );
    let id = h.session.add_line(line(CAP, "Cap", 600, 2)).unwrap();
    h.session.apply_coupon("FLAT200").await.unwrap();

    h.session.update_quantity(&id, 1).unwrap();
    assert_eq!(h.session.revalidate_coupon().await.unwrap(), None);
    assert!(h.session.snapshot().coupon.is_none());
}

#[tokio::test]
async fn test_revalidation_failure_keeps_coupon() {
    let h = harness(
        FakeCoupons::default().with_rule("SAVE10", CouponRule::Percent(10)),
        0.0,
    );
    let id = h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();
    h.session.apply_coupon("SAVE10").await.unwrap();
    h.session.update_quantity(&id, 2).unwrap();

    h.coupons.offline.store(true, Ordering::SeqCst);
    let err = h.session.revalidate_coupon().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert!(h.session.snapshot().coupon.is_some());
}

// =============================================================================
// Personalization
// =============================================================================

#[tokio::test]
async fn test_personalized_line_flow() {
    let h = harness(FakeCoupons::default(), 0.0);
    let config = tee_config();

    let mut selection = PersonalizationSelection::new();
    selection.select_color("Black");
    selection.select_size("M");
    selection.set_placement_enabled("front", true);
    selection.set_print_type("front", "dtf");

    // Not purchasable until artwork is uploaded
    let err = h
        .session
        .add_personalized(TEE, "Classic Tee", Money::from_rupees(100), &config, &selection, 1)
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Core(CoreError::IncompletePersonalization(_))
    ));

    let artwork = h
        .session
        .upload_artwork(&mut selection, "front", "logo.png", vec![0x89, 0x50, 0x4e, 0x47])
        .await
        .unwrap();
    assert_eq!(artwork.url(), "https://cdn.test/artwork/logo.png");

    let line_id = h
        .session
        .add_personalized(TEE, "Classic Tee", Money::from_rupees(100), &config, &selection, 1)
        .unwrap();

    let state = h.session.snapshot();
    let entry = state.cart.get(&line_id).unwrap();
    assert_eq!(entry.line.name, "Classic Tee (Black / M)");
    assert_eq!(entry.line.unit_price, Money::from_rupees(150));
    assert!(entry.selection.is_some());

    // 100 × 12% + 50 × 18% + shipping 99 × 18%
    let b = h.session.breakdown();
    assert_eq!(b.subtotal, Money::from_rupees(150));
    assert_eq!(b.shipping, Money::from_rupees(99));
    assert_eq!(b.tax, Money::from_paise(3882));
    assert_eq!(b.total, Money::from_paise(28_782));
}

#[tokio::test]
async fn test_empty_artwork_is_rejected() {
    let h = harness(FakeCoupons::default(), 0.0);
    let mut selection = PersonalizationSelection::new();

    let err = h
        .session
        .upload_artwork(&mut selection, "front", "empty.png", Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert!(selection.placements.is_empty());
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_place_order_revalidates_stale_coupon_first() {
    let h = harness(
        FakeCoupons::default().with_rule("SAVE10", CouponRule::Percent(10)),
        0.0,
    );
    let id = h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();
    h.session.apply_coupon("SAVE10").await.unwrap();
    h.session.update_quantity(&id, 2).unwrap();

    let receipt = h.session.place_order(address()).await.unwrap();

    let submitted = h.orders.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    let request = &submitted[0];
    assert_eq!(request.customer_id, "customer-42");
    assert_eq!(request.coupon_code.as_ref().unwrap().as_str(), "SAVE10");
    assert_eq!(request.breakdown.coupon_discount, Money::from_rupees(300));
    assert_eq!(receipt.total, request.breakdown.total);

    // Session resets after a successful order
    let state = h.session.snapshot();
    assert!(state.cart.is_empty());
    assert!(state.coupon.is_none());
}

#[tokio::test]
async fn test_retry_after_failed_submit_reuses_idempotency_key() {
    let h = harness(FakeCoupons::default(), 0.0);
    h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();

    h.orders.fail_next.store(true, Ordering::SeqCst);
    let err = h.session.place_order(address()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Service { service: "order", .. }));
    assert!(!h.session.snapshot().cart.is_empty());

    h.session.place_order(address()).await.unwrap();

    let submitted = h.orders.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].idempotency_key, submitted[1].idempotency_key);
}

#[tokio::test]
async fn test_cart_change_after_failed_submit_gets_new_key() {
    let h = harness(FakeCoupons::default(), 0.0);
    let id = h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();

    h.orders.fail_next.store(true, Ordering::SeqCst);
    h.session.place_order(address()).await.unwrap_err();

    h.session.update_quantity(&id, 3).unwrap();
    h.session.place_order(address()).await.unwrap();

    let submitted = h.orders.submitted.lock().unwrap();
    assert_ne!(submitted[0].idempotency_key, submitted[1].idempotency_key);
}

#[tokio::test]
async fn test_line_added_during_submit_survives_order() {
    let orders = Arc::new(GatedOrders::default());
    let session = CheckoutSession::new(
        "customer-42",
        StoreSettings::default(),
        Collaborators {
            coupons: Arc::new(FakeCoupons::default().with_rule("SAVE10", CouponRule::Percent(10))),
            wallet: Arc::new(FakeWallet { balance: 0.0 }),
            artwork: Arc::new(FakeArtwork),
            orders: orders.clone(),
        },
    );
    session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();
    session.apply_coupon("SAVE10").await.unwrap();

    let (placed, added) = tokio::join!(session.place_order(address()), async {
        orders.entered.notified().await;
        let added = session.add_line(line(CAP, "Cap", 400, 1));
        orders.release.notify_one();
        added
    });

    let receipt = placed.unwrap();
    let cap_id = added.unwrap();
    assert_eq!(receipt.order_id, "ORD-GATED");

    let submitted = orders.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].items.len(), 1);
    assert_eq!(submitted[0].items[0].line.product_id, HOODIE);

    // Only the ordered hoodie leaves the cart
    let state = session.snapshot();
    assert_eq!(state.cart.line_count(), 1);
    assert!(state.cart.get(&cap_id).is_some());
    assert!(state.coupon.is_none());
    assert!(state.pending_order_key.is_none());
}

#[tokio::test]
async fn test_place_order_guards() {
    let h = harness(FakeCoupons::default(), 0.0);

    let err = h.session.place_order(address()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));

    h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();
    let mut incomplete = address();
    incomplete.postal_code = "  ".into();
    let err = h.session.place_order(incomplete).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    assert!(h.orders.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_negative_total_is_submitted_unclamped() {
    let h = harness(
        FakeCoupons::default().with_rule(
            "FLAT500",
            CouponRule::Fixed {
                rupees: 500,
                min_subtotal: Money::zero(),
            },
        ),
        0.0,
    );
    h.session.add_line(line(CAP, "Cap", 100, 1)).unwrap();
    h.session.apply_coupon("FLAT500").await.unwrap();

    // 100 + 99 shipping + 18 + 17.82 tax - 500
    let b = h.session.breakdown();
    assert!(b.is_negative_total());
    assert_eq!(b.total, Money::from_paise(-26_518));

    let receipt = h.session.place_order(address()).await.unwrap();
    assert_eq!(receipt.total, Money::from_paise(-26_518));
}

#[tokio::test]
async fn test_remove_and_clear() {
    let h = harness(
        FakeCoupons::default().with_rule("SAVE10", CouponRule::Percent(10)),
        0.0,
    );
    let hoodie = h.session.add_line(line(HOODIE, "Hoodie", 1500, 1)).unwrap();
    h.session.add_line(line(CAP, "Cap", 400, 2)).unwrap();
    assert_eq!(h.session.cart_totals().total_quantity, 3);

    h.session.remove_line(&hoodie).unwrap();
    assert!(matches!(
        h.session.remove_line(&hoodie),
        Err(CheckoutError::LineNotFound(_))
    ));
    assert_eq!(h.session.cart_totals().subtotal, Money::from_rupees(800));

    h.session.apply_coupon("SAVE10").await.unwrap();
    h.session.clear();
    let state = h.session.snapshot();
    assert!(state.cart.is_empty());
    assert!(state.coupon.is_none());
}
