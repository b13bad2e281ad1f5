//! Shopify identifiers.
//!
//! Shopify issues opaque global IDs of the form
//! `gid://shopify/<Resource>/<numeric id>`. Older integrations (cart
//! permalinks, third-party widgets) still expect the trailing numeric
//! "legacy" ID, so this module provides both a validated [`ShopifyGid`] and
//! the `define_id!` macro for type-safe legacy IDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Macro to define a type-safe legacy ID wrapper.
///
/// Creates a newtype wrapper around `u64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_u64()`
/// - `From<u64>` and `Into<u64>` implementations
///
/// # Example
///
/// ```rust
/// # use sprout_core::define_id;
/// define_id!(VariantId);
/// define_id!(PlanId);
///
/// let variant_id = VariantId::new(1);
/// let plan_id = PlanId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: VariantId = plan_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new ID from a u64 value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying u64 value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(LegacyVariantId);
define_id!(LegacySellingPlanId);

/// Position of the numeric segment when a gid is split on `/`.
///
/// `"gid://shopify/ProductVariant/123"` splits into
/// `["gid:", "", "shopify", "ProductVariant", "123"]`.
const LEGACY_ID_SEGMENT: usize = 4;

/// Extract the legacy numeric ID from a gid by fixed-position splitting.
///
/// This mirrors what storefront widgets have always done with Shopify IDs:
/// no validation of the scheme or resource, just the fifth `/` segment
/// parsed as an integer. Returns `None` when that segment is missing or not
/// numeric. Prefer [`ShopifyGid::parse`] anywhere the structure matters.
#[must_use]
pub fn legacy_id_segment(gid: &str) -> Option<u64> {
    gid.split('/').nth(LEGACY_ID_SEGMENT)?.parse().ok()
}

/// Errors returned when parsing a [`ShopifyGid`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GidError {
    #[error("missing gid:// scheme in {0:?}")]
    MissingScheme(String),
    #[error("malformed gid {0:?}: expected gid://<namespace>/<Resource>/<id>")]
    Malformed(String),
    #[error("non-numeric id in gid {0:?}")]
    NonNumericId(String),
}

/// A validated Shopify global ID.
///
/// The namespace is not restricted to `shopify` since test shops and
/// proxies occasionally rewrite it; the resource and numeric ID are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopifyGid {
    raw: String,
    resource_start: usize,
    resource_end: usize,
    legacy_id: u64,
}

impl ShopifyGid {
    /// Parse and validate a gid.
    ///
    /// # Errors
    ///
    /// Returns [`GidError`] if the value does not look like
    /// `gid://<namespace>/<Resource>/<numeric id>`.
    pub fn parse(value: &str) -> Result<Self, GidError> {
        let rest = value
            .strip_prefix("gid://")
            .ok_or_else(|| GidError::MissingScheme(value.to_string()))?;

        let mut parts = rest.split('/');
        let (Some(namespace), Some(resource), Some(id), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(GidError::Malformed(value.to_string()));
        };
        if namespace.is_empty() || resource.is_empty() {
            return Err(GidError::Malformed(value.to_string()));
        }

        // Query suffixes such as `?cart_key=...` are part of some cart line gids.
        let id = id.split_once('?').map_or(id, |(id, _)| id);
        let legacy_id = id
            .parse::<u64>()
            .map_err(|_| GidError::NonNumericId(value.to_string()))?;

        let resource_start = "gid://".len() + namespace.len() + 1;
        Ok(Self {
            raw: value.to_string(),
            resource_start,
            resource_end: resource_start + resource.len(),
            legacy_id,
        })
    }

    /// Resource type, e.g. `ProductVariant`.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.raw
            .get(self.resource_start..self.resource_end)
            .unwrap_or_default()
    }

    /// Trailing numeric ID.
    #[must_use]
    pub const fn legacy_id(&self) -> u64 {
        self.legacy_id
    }

    /// The original gid string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ShopifyGid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ShopifyGid {
    type Err = GidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopifyGid {
    type Error = GidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopifyGid> for String {
    fn from(gid: ShopifyGid) -> Self {
        gid.raw
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_id_segment() {
        assert_eq!(
            legacy_id_segment("gid://shopify/ProductVariant/123"),
            Some(123)
        );
        assert_eq!(legacy_id_segment("gid://shop/ProductVariant/123"), Some(123));
    }

    #[test]
    fn test_legacy_id_segment_malformed() {
        assert_eq!(legacy_id_segment(""), None);
        assert_eq!(legacy_id_segment("123"), None);
        assert_eq!(legacy_id_segment("gid://shopify/ProductVariant/abc"), None);
        // Fixed-position rule: a missing namespace shifts the segment
        assert_eq!(legacy_id_segment("gid://ProductVariant/123"), None);
    }

    #[test]
    fn test_gid_parse() {
        let gid = ShopifyGid::parse("gid://shopify/SellingPlan/987654").unwrap();
        assert_eq!(gid.resource(), "SellingPlan");
        assert_eq!(gid.legacy_id(), 987_654);
        assert_eq!(gid.to_string(), "gid://shopify/SellingPlan/987654");
    }

    #[test]
    fn test_gid_parse_with_query_suffix() {
        let gid = ShopifyGid::parse("gid://shopify/CartLine/42?cart=abc").unwrap();
        assert_eq!(gid.resource(), "CartLine");
        assert_eq!(gid.legacy_id(), 42);
    }

    #[test]
    fn test_gid_parse_errors() {
        assert!(matches!(
            ShopifyGid::parse("shopify/ProductVariant/1"),
            Err(GidError::MissingScheme(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://shopify/ProductVariant"),
            Err(GidError::Malformed(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://shopify//1"),
            Err(GidError::Malformed(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://shopify/ProductVariant/x1"),
            Err(GidError::NonNumericId(_))
        ));
    }

    #[test]
    fn test_gid_serde_roundtrip() {
        let gid: ShopifyGid =
            serde_json::from_str("\"gid://shopify/ProductVariant/5\"").unwrap();
        assert_eq!(gid.legacy_id(), 5);
        assert_eq!(
            serde_json::to_string(&gid).unwrap(),
            "\"gid://shopify/ProductVariant/5\""
        );
        assert!(serde_json::from_str::<ShopifyGid>("\"nope\"").is_err());
    }

    #[test]
    fn test_legacy_id_serializes_transparently() {
        let id = LegacyVariantId::new(123);
        assert_eq!(serde_json::to_string(&id).unwrap(), "123");
        assert_eq!(u64::from(id), 123);
    }
}
