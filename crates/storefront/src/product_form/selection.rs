//! Selected product options and variant resolution.

use std::collections::BTreeMap;

use crate::shopify::types::{Product, ProductVariant};

/// Option name to chosen value, one entry per product option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    values: BTreeMap<String, String>,
}

impl SelectionState {
    /// Initial selection for a product: the options of the first variant
    /// that is available for sale, or of the first variant if none are.
    #[must_use]
    pub fn default_for(product: &Product) -> Self {
        product
            .variants
            .iter()
            .find(|v| v.available_for_sale)
            .or_else(|| product.variants.first())
            .map(Self::from_variant)
            .unwrap_or_default()
    }

    /// Selection matching a variant's own options.
    #[must_use]
    pub fn from_variant(variant: &ProductVariant) -> Self {
        Self {
            values: variant
                .selected_options
                .iter()
                .map(|o| (o.name.clone(), o.value.clone()))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, option: &str) -> Option<&str> {
        self.values.get(option).map(String::as_str)
    }

    pub fn set(&mut self, option: &str, value: &str) {
        self.values.insert(option.to_string(), value.to_string());
    }

    /// Clear the choice for `option`; no variant resolves until it is set.
    pub fn unset(&mut self, option: &str) {
        self.values.remove(option);
    }

    /// The variant whose options all equal the selection.
    #[must_use]
    pub fn resolve<'a>(&self, variants: &'a [ProductVariant]) -> Option<&'a ProductVariant> {
        variants.iter().find(|variant| {
            variant
                .selected_options
                .iter()
                .all(|o| self.get(&o.name) == Some(o.value.as_str()))
        })
    }
}
