//! Subscription widget payload.
//!
//! The widget reads a flat JSON document from the `data-product` attribute
//! of its container. Shopify gids are reduced to their legacy numeric ids
//! and prices to integer minor units:
//!
//! ```json
//! {"price":{"amount":"19.99","currencyCode":"USD"},"requires_selling_plan":false,
//!  "variants":[{"id":123,"price":1999,"selling_plan_allocations":[{"price":1799,"selling_plan_id":555}]}],
//!  "selling_plan_groups":[{"id":0,"name":"Subscribe & Save","options":[...],"selling_plans":[...]}]}
//! ```

use std::sync::Arc;

use moka::sync::Cache;
use serde::Serialize;
use sprout_core::{LegacySellingPlanId, LegacyVariantId, legacy_id_segment, to_minor_units};
use tracing::{debug, warn};

use crate::shopify::types::{
    Money, Product, ProductVariant, SellingPlanGroup, SellingPlanGroupOption,
};

/// Everything the payload depends on. Inputs that serialize identically
/// always produce the same payload bytes.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PayloadInputs<'a> {
    pub price: &'a Money,
    pub requires_selling_plan: bool,
    pub variants: &'a [ProductVariant],
    pub selling_plan_groups: &'a [SellingPlanGroup],
}

impl<'a> PayloadInputs<'a> {
    /// Inputs for `product` priced at `price` (normally the active
    /// variant's price).
    #[must_use]
    pub fn from_product(product: &'a Product, price: &'a Money) -> Self {
        Self {
            price,
            requires_selling_plan: product.requires_selling_plan,
            variants: &product.variants,
            selling_plan_groups: &product.selling_plan_groups,
        }
    }
}

#[derive(Serialize)]
struct WidgetPayload<'a> {
    price: &'a Money,
    requires_selling_plan: bool,
    variants: Vec<VariantPayload>,
    selling_plan_groups: Vec<SellingPlanGroupPayload<'a>>,
}

#[derive(Serialize)]
struct VariantPayload {
    id: Option<LegacyVariantId>,
    price: i64,
    selling_plan_allocations: Vec<AllocationPayload>,
}

#[derive(Serialize)]
struct AllocationPayload {
    price: i64,
    selling_plan_id: Option<LegacySellingPlanId>,
}

#[derive(Serialize)]
struct SellingPlanGroupPayload<'a> {
    id: usize,
    name: &'a str,
    options: &'a [SellingPlanGroupOption],
    selling_plans: Vec<SellingPlanPayload<'a>>,
}

#[derive(Serialize)]
struct SellingPlanPayload<'a> {
    name: &'a str,
    description: Option<&'a str>,
    id: Option<LegacySellingPlanId>,
}

/// Legacy id of a gid, or `None` (serialized as `null`) when the gid does
/// not have a numeric fourth path segment.
fn legacy_id<T: From<u64>>(gid: &str) -> Option<T> {
    let id = legacy_id_segment(gid).map(T::from);
    if id.is_none() {
        warn!(gid = %gid, "Cannot extract legacy id from gid");
    }
    id
}

/// Build the widget payload JSON.
///
/// Returns `Ok(None)` when the product has no selling plan groups, in which
/// case the widget is not rendered at all.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn build_widget_payload(inputs: &PayloadInputs<'_>) -> Result<Option<String>, serde_json::Error> {
    if inputs.selling_plan_groups.is_empty() {
        return Ok(None);
    }

    let payload = WidgetPayload {
        price: inputs.price,
        requires_selling_plan: inputs.requires_selling_plan,
        variants: inputs
            .variants
            .iter()
            .map(|variant| VariantPayload {
                id: legacy_id(&variant.id),
                price: to_minor_units(variant.price.amount),
                selling_plan_allocations: variant
                    .selling_plan_allocations
                    .iter()
                    .map(|allocation| AllocationPayload {
                        price: to_minor_units(allocation.checkout_charge_amount.amount),
                        selling_plan_id: legacy_id(&allocation.selling_plan_id),
                    })
                    .collect(),
            })
            .collect(),
        selling_plan_groups: inputs
            .selling_plan_groups
            .iter()
            .enumerate()
            .map(|(index, group)| SellingPlanGroupPayload {
                id: index,
                name: &group.name,
                options: &group.options,
                selling_plans: group
                    .selling_plans
                    .iter()
                    .map(|plan| SellingPlanPayload {
                        name: &plan.name,
                        description: plan.description.as_deref(),
                        id: legacy_id(&plan.id),
                    })
                    .collect(),
            })
            .collect(),
    };

    serde_json::to_string(&payload).map(Some)
}

/// Memoized [`build_widget_payload`], keyed by the serialized inputs.
///
/// The key keeps decimal scale, so `19.99` and `19.990` are separate
/// entries just as they are separate payloads. Re-rendering the form for a different option of the same variant set
/// and price reuses the stored payload instead of rebuilding it.
#[derive(Clone)]
pub struct WidgetPayloadCache {
    payloads: Cache<String, Option<Arc<str>>>,
}

impl WidgetPayloadCache {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            payloads: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Cached payload for `inputs`, building it on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails; failures are not cached.
    pub fn get(&self, inputs: &PayloadInputs<'_>) -> Result<Option<Arc<str>>, serde_json::Error> {
        let key = serde_json::to_string(inputs)?;
        if let Some(payload) = self.payloads.get(&key) {
            debug!("Cache hit for widget payload");
            return Ok(payload);
        }

        let payload: Option<Arc<str>> = build_widget_payload(inputs)?.map(Arc::from);
        self.payloads.insert(key, payload.clone());
        Ok(payload)
    }
}

impl Default for WidgetPayloadCache {
    fn default() -> Self {
        Self::new(1_000)
    }
}
