//! # Cart Pricing
//!
//! Server-side cart used at checkout.
//!
//! The storefront client keeps its own cart for display; at checkout it only
//! sends `(product_id, quantity)` pairs. Prices are re-read from the catalog
//! and priced here, so a tampered client total never reaches the processor.
//!
//! ## Checkout Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Client request                 Catalog lookup          Cart            │
//! │  ──────────────                 ──────────────          ────            │
//! │  [{id: A, qty: 1},  ──────────► Product A (1500) ─────► add(A, 1)       │
//! │   {id: B, qty: 2},              Product B (900)  ─────► add(B, 2)       │
//! │   {id: A, qty: 1}]                               ─────► add(A, 1)       │
//! │                                                          │ merges A     │
//! │                                                          ▼              │
//! │                                     lines: A×2 (3000), B×2 (1800)       │
//! │                                     total: 4800                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A priced line in the cart.
///
/// Product data is frozen at the moment the line is added, the same way
/// order items snapshot it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub title: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl CartLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price()
            .checked_multiply_quantity(self.quantity)
            .ok_or(CoreError::AmountOverflow)
    }
}

/// A set of priced lines in a single currency.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product merges)
/// - Every quantity is within `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
/// - All lines share `currency`
/// - The total fits in `i64` cents
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: Option<String>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product to the cart or increases its quantity.
    ///
    /// ## Errors
    /// - `ProductUnavailable` - inactive or free product
    /// - `Validation` - quantity outside `1..=MAX_ITEM_QUANTITY`
    /// - `QuantityTooLarge` - merging would exceed `MAX_ITEM_QUANTITY`
    /// - `CartTooLarge` - a new line would exceed `MAX_CART_ITEMS`
    /// - `CurrencyMismatch` - product is priced in another currency
    /// - `AmountOverflow` - the new total would not fit in `i64` cents
    pub fn add(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if !product.is_purchasable() {
            return Err(CoreError::ProductUnavailable(product.id.clone()));
        }

        validate_quantity(quantity)?;

        if let Some(expected) = &self.currency {
            if expected != &product.currency {
                return Err(CoreError::CurrencyMismatch {
                    expected: expected.clone(),
                    found: product.currency.clone(),
                });
            }
        }

        if let Some(idx) = self.lines.iter().position(|l| l.product_id == product.id) {
            let previous = self.lines[idx].quantity;
            let merged = previous + quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            self.lines[idx].quantity = merged;
            if let Err(e) = self.total() {
                self.lines[idx].quantity = previous;
                return Err(e);
            }
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.currency.get_or_insert_with(|| product.currency.clone());
        self.lines.push(CartLine {
            product_id: product.id.clone(),
            title: product.title.clone(),
            unit_price_cents: product.price_cents,
            quantity,
        });
        if let Err(e) = self.total() {
            self.lines.pop();
            if self.lines.is_empty() {
                self.currency = None;
            }
            return Err(e);
        }

        Ok(())
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Currency of the cart, `None` while empty.
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total quantity of all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of all line totals.
    pub fn total(&self) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.line_total()?)
                .ok_or(CoreError::AmountOverflow)
        })
    }

    /// Returns an error when there is nothing to check out.
    pub fn ensure_not_empty(&self) -> CoreResult<()> {
        if self.is_empty() {
            Err(CoreError::EmptyCart)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PRICE_CENTS;
    use chrono::Utc;

    fn test_product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            category_id: None,
            title: format!("Image {}", id),
            description: None,
            price_cents,
            currency: "ARS".to_string(),
            preview_url: format!("https://cdn.example.com/preview/{}.jpg", id),
            asset_url: format!("https://cdn.example.com/full/{}.tiff", id),
            width_px: Some(6000),
            height_px: Some(4000),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        cart.add(&test_product("1", 1500), 2).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total().unwrap().cents(), 3000);
        assert_eq!(cart.currency(), Some("ARS"));
    }

    #[test]
    fn test_cart_add_same_product_merges() {
        let mut cart = Cart::new();
        let product = test_product("1", 999);

        cart.add(&product, 2).unwrap();
        cart.add(&product, 3).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total().unwrap().cents(), 4995);
    }

    #[test]
    fn test_cart_merge_respects_max_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 999);

        cart.add(&product, MAX_ITEM_QUANTITY).unwrap();
        let err = cart.add(&product, 1).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
    }

    #[test]
    fn test_cart_rejects_inactive_product() {
        let mut cart = Cart::new();
        let mut product = test_product("1", 999);
        product.is_active = false;

        let err = cart.add(&product, 1).unwrap_err();
        assert!(matches!(err, CoreError::ProductUnavailable(id) if id == "1"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_rejects_mixed_currency() {
        let mut cart = Cart::new();
        cart.add(&test_product("1", 999), 1).unwrap();

        let mut usd = test_product("2", 500);
        usd.currency = "USD".to_string();
        let err = cart.add(&usd, 1).unwrap_err();
        assert!(matches!(err, CoreError::CurrencyMismatch { .. }));
    }

    #[test]
    fn test_cart_rejects_zero_quantity() {
        let mut cart = Cart::new();
        let err = cart.add(&test_product("1", 999), 0).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_cart_max_lines() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add(&test_product(&i.to_string(), 100), 1).unwrap();
        }
        let err = cart.add(&test_product("overflow", 100), 1).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }

    #[test]
    fn test_cart_total_overflow_is_an_error() {
        let mut cart = Cart::new();
        let product = test_product("1", i64::MAX / 2 + 1);

        cart.add(&product, 1).unwrap();
        let err = cart.add(&product, 1).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow));
        assert_eq!(cart.total_quantity(), 1);

        let err = cart.add(&test_product("2", i64::MAX / 2 + 1), 1).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_max_price_cart_fits() {
        let mut cart = Cart::new();
        let product = test_product("1", MAX_PRICE_CENTS);

        cart.add(&product, MAX_ITEM_QUANTITY - 1).unwrap();
        cart.add(&product, 1).unwrap();
        for i in 2..=MAX_CART_ITEMS {
            cart.add(&test_product(&i.to_string(), MAX_PRICE_CENTS), MAX_ITEM_QUANTITY)
                .unwrap();
        }

        let expected = MAX_PRICE_CENTS * MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64;
        assert_eq!(cart.total().unwrap().cents(), expected);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::new();
        assert!(matches!(cart.ensure_not_empty(), Err(CoreError::EmptyCart)));
        assert!(cart.total().unwrap().is_zero());
    }
}
