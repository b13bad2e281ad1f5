//! Render model for the product form.

use sprout_core::{LegacyVariantId, legacy_id_segment};

use crate::shopify::types::{Money, Product};

use super::payload::{PayloadInputs, WidgetPayloadCache};
use super::selection::SelectionState;
use super::widget::{WidgetContainer, WidgetLoader};

/// One selectable value of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionValueView {
    pub value: String,
    pub selected: bool,
}

/// An option rendered as a radio group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub name: String,
    pub values: Vec<OptionValueView>,
}

/// Everything the product form template needs.
#[derive(Debug, Clone)]
pub struct ProductFormView {
    pub handle: String,
    pub title: String,
    /// Options with more than one value; single-value options have nothing
    /// to choose and are not rendered.
    pub options: Vec<OptionView>,
    /// Storefront gid of the active variant.
    pub variant_id: Option<String>,
    /// Legacy numeric id of the active variant, for the hidden `id` input.
    pub legacy_variant_id: Option<LegacyVariantId>,
    /// False when no variant matches the selection or it is not for sale.
    pub available: bool,
    pub price: String,
    /// Compare-at price, only when the active variant is on sale.
    pub compare_at_price: Option<String>,
    pub widget: Option<WidgetContainer>,
    /// Current query string, so option posts keep the page URL.
    pub query: String,
}

impl ProductFormView {
    /// Build the form for `product` with `selection` applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the widget payload cannot be serialized.
    pub fn build(
        product: &Product,
        selection: &SelectionState,
        query: String,
        payloads: &WidgetPayloadCache,
        loader: &WidgetLoader,
    ) -> Result<Self, serde_json::Error> {
        let variant = selection.resolve(&product.variants);
        let price: &Money = variant.map_or(&product.price, |v| &v.price);

        let widget = payloads
            .get(&PayloadInputs::from_product(product, price))?
            .map(|payload| loader.container(payload, product.price.currency_symbol()));

        let options = product
            .options
            .iter()
            .filter(|option| option.values.len() > 1)
            .map(|option| OptionView {
                name: option.name.clone(),
                values: option
                    .values
                    .iter()
                    .map(|value| OptionValueView {
                        value: value.clone(),
                        selected: selection.get(&option.name) == Some(value.as_str()),
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            options,
            variant_id: variant.map(|v| v.id.clone()),
            legacy_variant_id: variant
                .and_then(|v| legacy_id_segment(&v.id))
                .map(LegacyVariantId::new),
            available: variant.is_some_and(|v| v.available_for_sale),
            price: price.display(),
            compare_at_price: variant
                .filter(|v| v.is_on_sale())
                .and_then(|v| v.compare_at_price.as_ref())
                .map(Money::display),
            widget,
            query,
        })
    }

    /// Shop Pay express checkout link for one unit of the active variant.
    #[must_use]
    pub fn express_checkout_url(&self) -> Option<String> {
        if !self.available {
            return None;
        }
        self.legacy_variant_id
            .map(|id| format!("/checkout/express?variant_id={id}&quantity=1"))
    }
}
