//! Option/URL synchronization.
//!
//! Keeps the product form's [`SelectionState`] and the page's query string
//! in step:
//!
//! - on a full page load, values found in the URL win and options missing
//!   from the URL are written into it (`load_from_url`);
//! - on a user change, the new value is written into both (`change`).
//!
//! Parameter names and values are lower-cased and percent-encoded, so
//! `Color: Light Blue` is stored as `color` → `light%20blue`.

use thiserror::Error;
use tracing::debug;

use crate::shopify::types::ProductOption;

use super::query_state::QueryStateStore;
use super::selection::SelectionState;

/// Lower-case and percent-encode an option name or value for the URL.
#[must_use]
pub fn encode_param(raw: &str) -> String {
    urlencoding::encode(&raw.to_lowercase()).into_owned()
}

/// Rejected user-driven option change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown option {0:?}")]
    UnknownOption(String),
    #[error("{value:?} is not a value of option {option:?}")]
    UnknownValue { option: String, value: String },
}

/// Synchronizes selection and URL for one product's options.
#[derive(Debug, Clone, Copy)]
pub struct OptionSync<'a> {
    options: &'a [ProductOption],
}

impl<'a> OptionSync<'a> {
    #[must_use]
    pub const fn new(options: &'a [ProductOption]) -> Self {
        Self { options }
    }

    /// Apply the URL to the selection, once per page load.
    ///
    /// For each option:
    /// - a URL value matching one of the option's values selects it; a
    ///   value matching nothing leaves the option unselected, and the URL
    ///   keeps the value as typed;
    /// - an option absent from the URL gets its current selection written
    ///   back, followed by an in-place URL replace.
    pub fn load_from_url(&self, selection: &mut SelectionState, store: &mut impl QueryStateStore) {
        for option in self.options {
            let key = encode_param(&option.name);

            let param = store
                .get(&key)
                .or_else(|| store.get(&option.name.to_lowercase()))
                .map(str::to_owned);

            match param {
                Some(param) => match find_value(option, &param) {
                    Some(value) => selection.set(&option.name, value),
                    None => {
                        debug!(
                            option = %option.name,
                            param = %param,
                            "URL value matches no option value"
                        );
                        selection.unset(&option.name);
                    }
                },
                None => {
                    let Some(current) = selection.get(&option.name) else {
                        continue;
                    };
                    store.set(&key, &encode_param(current));
                    store.replace();
                }
            }
        }
    }

    /// Apply a user's choice of `value` for `option`.
    ///
    /// Only that option's parameter changes in the URL.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if the option or value does not belong to
    /// this product; nothing is modified in that case.
    pub fn change(
        &self,
        selection: &mut SelectionState,
        store: &mut impl QueryStateStore,
        option: &str,
        value: &str,
    ) -> Result<(), SelectionError> {
        let product_option = self
            .options
            .iter()
            .find(|o| o.name == option)
            .ok_or_else(|| SelectionError::UnknownOption(option.to_string()))?;

        if !product_option.values.iter().any(|v| v == value) {
            return Err(SelectionError::UnknownValue {
                option: option.to_string(),
                value: value.to_string(),
            });
        }

        selection.set(option, value);
        store.set(&encode_param(option), &encode_param(value));
        store.replace();
        Ok(())
    }
}

/// First option value whose URL form equals `param`.
///
/// Hand-typed URLs (`?color=light blue`) are accepted alongside the encoded
/// form the synchronizer writes itself.
fn find_value<'o>(option: &'o ProductOption, param: &str) -> Option<&'o str> {
    option
        .values
        .iter()
        .find(|v| encode_param(v) == param)
        .or_else(|| option.values.iter().find(|v| v.to_lowercase() == param))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product_form::fixtures::tee;
    use crate::product_form::query_state::UrlQueryStore;

    fn load(query: &str) -> (SelectionState, UrlQueryStore) {
        let product = tee();
        let mut selection = SelectionState::default_for(&product);
        let mut store = UrlQueryStore::parse("/products/tee", query);
        OptionSync::new(&product.options).load_from_url(&mut selection, &mut store);
        (selection, store)
    }

    #[test]
    fn test_encode_param() {
        assert_eq!(encode_param("Color"), "color");
        assert_eq!(encode_param("Light Blue"), "light%20blue");
        assert_eq!(encode_param("50/50 Blend"), "50%2F50%20blend");
    }

    #[test]
    fn test_url_value_selects_option() {
        let (selection, store) = load("color=red&size=small");
        assert_eq!(selection.get("Color"), Some("Red"));
        assert_eq!(selection.get("Size"), Some("Small"));
        assert_eq!(store.replaced_url(), None);
    }

    #[test]
    fn test_single_param_color_red_resolves_red() {
        let (selection, _) = load("color=red");
        assert_eq!(selection.get("Color"), Some("Red"));
    }

    #[test]
    fn test_missing_params_are_written_back() {
        let (selection, store) = load("");
        assert_eq!(selection.get("Color"), Some("Red"));
        assert_eq!(store.get("color"), Some("red"));
        assert_eq!(store.get("size"), Some("large"));
        assert_eq!(
            store.replaced_url(),
            Some("/products/tee?color=red&size=large")
        );
    }

    #[test]
    fn test_unmatched_value_leaves_option_unset() {
        let product = tee();
        let (selection, store) = load("color=green&size=large");
        assert_eq!(selection.get("Color"), None);
        assert_eq!(selection.get("Size"), Some("Large"));
        assert!(selection.resolve(&product.variants).is_none());
        // The unmatched param is left alone and nothing is replaced
        assert_eq!(store.get("color"), Some("green"));
        assert_eq!(store.replaced_url(), None);
    }

    #[test]
    fn test_unrelated_params_are_preserved() {
        let (_, store) = load("utm_source=mail&color=blue");
        assert_eq!(
            store.replaced_url(),
            Some("/products/tee?utm_source=mail&color=blue&size=large")
        );
    }

    #[test]
    fn test_change_updates_only_that_param() {
        let product = tee();
        let (mut selection, mut store) = load("color=red&size=large&ref=home");
        let before: Vec<_> = store.params().to_vec();

        OptionSync::new(&product.options)
            .change(&mut selection, &mut store, "Size", "Small")
            .unwrap_or_else(|e| panic!("change rejected: {e}"));

        assert_eq!(selection.get("Size"), Some("Small"));
        assert_eq!(store.get("size"), Some("small"));
        for ((k_before, v_before), (k_after, v_after)) in before.iter().zip(store.params()) {
            assert_eq!(k_before, k_after);
            if k_before != "size" {
                assert_eq!(v_before, v_after);
            }
        }
        assert_eq!(
            store.replaced_url(),
            Some("/products/tee?color=red&size=small&ref=home")
        );
    }

    #[test]
    fn test_change_round_trips_through_url() {
        let product = tee();
        let sync = OptionSync::new(&product.options);
        let (mut selection, mut store) = load("");
        sync.change(&mut selection, &mut store, "Color", "Blue")
            .unwrap_or_else(|e| panic!("change rejected: {e}"));

        // Reload from the URL the browser now shows
        let mut reloaded = SelectionState::default_for(&product);
        let mut next = UrlQueryStore::parse("/products/tee", &store.query_string());
        sync.load_from_url(&mut reloaded, &mut next);

        assert_eq!(reloaded, selection);
        assert_eq!(next.replaced_url(), None);
    }

    #[test]
    fn test_round_trip_with_spaces_and_slashes() {
        let mut product = tee();
        product.options[0].values.push("Light Blue/Grey".to_string());
        let sync = OptionSync::new(&product.options);

        let mut selection = SelectionState::default_for(&product);
        let mut store = UrlQueryStore::parse("/products/tee", "");
        sync.change(&mut selection, &mut store, "Color", "Light Blue/Grey")
            .unwrap_or_else(|e| panic!("change rejected: {e}"));

        let mut reloaded = SelectionState::default_for(&product);
        let mut next = UrlQueryStore::parse("/products/tee", &store.query_string());
        sync.load_from_url(&mut reloaded, &mut next);
        assert_eq!(reloaded.get("Color"), Some("Light Blue/Grey"));
    }

    // Hand-typed URLs: besides the encoded form the synchronizer writes, a
    // parameter whose raw lower-cased text equals the name or value matches.
    // Anything else is unmatched.

    #[test]
    fn test_hand_typed_value_with_space_matches() {
        let mut product = tee();
        product.options[0].values.push("Light Blue".to_string());
        let mut selection = SelectionState::default_for(&product);
        // `+` decodes to a space, the raw lower-cased value
        let mut store = UrlQueryStore::parse("/products/tee", "color=light+blue&size=large");
        OptionSync::new(&product.options).load_from_url(&mut selection, &mut store);
        assert_eq!(selection.get("Color"), Some("Light Blue"));
        assert_eq!(store.replaced_url(), None);
    }

    #[test]
    fn test_hand_typed_key_with_space_matches() {
        let mut product = tee();
        product.options[1].name = "Cup Size".to_string();
        for variant in &mut product.variants {
            variant.selected_options[1].name = "Cup Size".to_string();
        }
        let mut selection = SelectionState::default_for(&product);
        let mut store = UrlQueryStore::parse("/products/tee", "color=blue&cup+size=small");
        OptionSync::new(&product.options).load_from_url(&mut selection, &mut store);
        assert_eq!(selection.get("Cup Size"), Some("Small"));
        assert_eq!(store.replaced_url(), None);
    }

    #[test]
    fn test_hand_typed_upper_case_is_unmatched() {
        let (selection, _) = load("color=BLUE&size=Small");
        assert_eq!(selection.get("Color"), None);
        assert_eq!(selection.get("Size"), None);
    }

    #[test]
    fn test_hand_typed_near_miss_is_unmatched() {
        let mut product = tee();
        product.options[0].values.push("Light Blue".to_string());
        let mut selection = SelectionState::default_for(&product);
        let mut store = UrlQueryStore::parse("/products/tee", "color=lightblue&size=large");
        OptionSync::new(&product.options).load_from_url(&mut selection, &mut store);
        assert_eq!(selection.get("Color"), None);
    }

    #[test]
    fn test_change_rejects_unknown_option_and_value() {
        let product = tee();
        let sync = OptionSync::new(&product.options);
        let (mut selection, mut store) = load("color=red&size=large");
        let snapshot = (selection.clone(), store.clone());

        assert_eq!(
            sync.change(&mut selection, &mut store, "Fit", "Slim"),
            Err(SelectionError::UnknownOption("Fit".to_string()))
        );
        assert!(matches!(
            sync.change(&mut selection, &mut store, "Color", "Green"),
            Err(SelectionError::UnknownValue { .. })
        ));
        assert_eq!((selection, store), snapshot);
    }

    #[test]
    fn test_option_without_selection_is_skipped() {
        let product = tee();
        let mut selection = SelectionState::default();
        let mut store = UrlQueryStore::parse("/products/tee", "");
        OptionSync::new(&product.options).load_from_url(&mut selection, &mut store);
        assert_eq!(store.replaced_url(), None);
        assert!(store.params().is_empty());
    }
}
