//! Domain types for Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! GraphQL response shapes in `storefront::queries`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sprout_core::{CurrencyCode, Price};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
///
/// Serializes in the Storefront API's own shape (`{"amount": "19.99",
/// "currencyCode": "USD"}`), which is what the subscription widget expects
/// for the product price.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Typed price, if the currency is one the storefront supports.
    #[must_use]
    pub fn price(&self) -> Option<Price> {
        let currency = self.currency_code.parse::<CurrencyCode>().ok()?;
        Some(Price::new(self.amount, currency))
    }

    /// Currency symbol for display, falling back to the ISO code.
    #[must_use]
    pub fn currency_symbol(&self) -> &str {
        self.currency_code
            .parse::<CurrencyCode>()
            .map_or(self.currency_code.as_str(), |c| c.symbol())
    }

    /// Human-readable amount without trailing `.00`.
    #[must_use]
    pub fn display(&self) -> String {
        self.price().map_or_else(
            || format!("{} {}", self.amount.normalize(), self.currency_code),
            |p| p.display(),
        )
    }
}

// =============================================================================
// Image Types
// =============================================================================

/// Product or variant image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
}

// =============================================================================
// Selling Plan Types (Subscriptions)
// =============================================================================

/// A single selling plan (subscription option).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellingPlan {
    /// Selling plan ID (pass to cart).
    pub id: String,
    /// Display name (e.g., "Delivery every 30 days").
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// An option for a selling plan group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellingPlanGroupOption {
    /// Option name (e.g., "Delivery Frequency").
    pub name: String,
    /// Available values (e.g., ["30 days", "60 days", "90 days"]).
    pub values: Vec<String>,
}

/// A group of selling plans (e.g., "Subscribe & Save").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellingPlanGroup {
    /// Group name (e.g., "Subscribe & Save").
    pub name: String,
    /// Options available in this group.
    pub options: Vec<SellingPlanGroupOption>,
    /// Selling plans in this group.
    pub selling_plans: Vec<SellingPlan>,
}

/// Price of a variant under a specific selling plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellingPlanAllocation {
    /// Amount charged at checkout for this plan.
    pub checkout_charge_amount: Money,
    /// The selling plan this allocation belongs to.
    pub selling_plan_id: String,
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "Large", "Blue").
    pub value: String,
}

/// Product option definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option name (e.g., "Size").
    pub name: String,
    /// Available values (e.g., `["Small", "Medium", "Large"]`).
    pub values: Vec<String>,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID.
    pub id: String,
    /// Variant title (combination of option values).
    pub title: String,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// Current price.
    pub price: Money,
    /// Compare-at price (original price if on sale).
    pub compare_at_price: Option<Money>,
    /// Selected options for this variant.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
    /// Prices of this variant under each selling plan.
    pub selling_plan_allocations: Vec<SellingPlanAllocation>,
}

impl ProductVariant {
    /// Whether the variant is marked down from its compare-at price.
    #[must_use]
    ///
    /// Only prices in a supported currency count as marked down.
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price
            .as_ref()
            .and_then(Money::price)
            .zip(self.price.price())
            .is_some_and(|(compare_at, price)| price.is_discounted_from(&compare_at))
    }
}

/// A product in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// Minimum price across variants.
    pub price: Money,
    /// Product options.
    pub options: Vec<ProductOption>,
    /// Product variants.
    pub variants: Vec<ProductVariant>,
    /// Whether product requires a selling plan (subscription-only).
    pub requires_selling_plan: bool,
    /// Selling plan groups (subscription options).
    pub selling_plan_groups: Vec<SellingPlanGroup>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Input for adding a line to a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Variant ID to add.
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: i64,
    /// Selling plan to purchase under, for subscriptions.
    pub selling_plan_id: Option<String>,
}

/// A Shopify cart (only the fields the storefront renders).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: String,
    /// Shopify-hosted checkout URL.
    pub checkout_url: String,
    /// Total number of items.
    pub total_quantity: i64,
}

/// User error returned by a cart mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUserError {
    /// Machine-readable code, when Shopify provides one.
    pub code: Option<String>,
    /// Path to the offending input field.
    pub field: Option<Vec<String>>,
    /// Human-readable message.
    pub message: String,
}
