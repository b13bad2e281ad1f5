//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` request/response envelopes with `reqwest` 0.13 for HTTP.
//! Caches products using `moka` (5-minute TTL).

mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{Cart, CartLineInput, Product};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use conversions::{convert_cart, convert_product, convert_user_error};
use queries::{AddToCart, CreateCart, GetCart, GetProductByHandle, cart};

/// Variants fetched per product. Shopify caps option combinations at 100.
const VARIANT_COUNT: i64 = 100;

/// Selling plans (and allocations) fetched per group / variant.
const SELLING_PLAN_COUNT: i64 = 25;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides type-safe access to products and cart operations.
/// Products are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    products: Cache<String, Arc<Product>>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.graphql_endpoint(),
                access_token: config.storefront_private_token.expose_secret().to_string(),
                products,
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;
        let excerpt = || response_text.chars().take(500).collect::<String>();

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %excerpt(),
                operation = request_body.operation_name,
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: Response<Q::ResponseData> = serde_json::from_str(&response_text)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %excerpt(),
                    operation = request_body.operation_name,
                    "Failed to parse Shopify GraphQL response"
                );
                ShopifyError::Parse(e)
            })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %excerpt(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::message("No data in response")
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle, including variants and selling plans.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Arc<Product>, ShopifyError> {
        if let Some(product) = self.inner.products.get(handle).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let variables = queries::get_product_by_handle::Variables {
            handle: handle.to_string(),
            variant_count: VARIANT_COUNT,
            selling_plan_count: SELLING_PLAN_COUNT,
        };

        let data = self.execute::<GetProductByHandle>(variables).await?;

        let product = data
            .product
            .map(convert_product)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        let product = Arc::new(product);
        self.inner
            .products
            .insert(handle.to_string(), Arc::clone(&product))
            .await;

        Ok(product)
    }

    /// Seed the product cache, e.g. to warm popular products at startup.
    pub async fn prime_product(&self, product: Product) {
        self.inner
            .products
            .insert(product.handle.clone(), Arc::new(product))
            .await;
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new cart containing `lines`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines))]
    pub async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let variables = queries::create_cart::Variables {
            input: queries::create_cart::CartInput {
                lines: lines.into_iter().map(to_line_input).collect(),
            },
        };

        let data = self.execute::<CreateCart>(variables).await?;
        cart_from_payload(data.cart_create, None, "Failed to create cart")
    }

    /// Add lines to an existing cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the cart has expired, or an error if the
    /// mutation fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = queries::add_to_cart::Variables {
            cart_id: cart_id.to_string(),
            lines: lines.into_iter().map(to_line_input).collect(),
        };

        let data = self.execute::<AddToCart>(variables).await?;
        cart_from_payload(data.cart_lines_add, Some(cart_id), "Failed to add to cart")
    }

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the cart has expired, or an error if the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let variables = queries::get_cart::Variables {
            cart_id: cart_id.to_string(),
        };

        let data = self.execute::<GetCart>(variables).await?;
        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }
}

fn to_line_input(line: CartLineInput) -> cart::CartLineInput {
    cart::CartLineInput {
        merchandise_id: line.merchandise_id,
        quantity: line.quantity,
        selling_plan_id: line.selling_plan_id,
    }
}

/// User error Shopify reports against the `cartId` argument.
fn is_cart_id_error(error: &cart::UserErrorNode) -> bool {
    error
        .field
        .as_deref()
        .is_some_and(|field| field.iter().any(|f| f == "cartId"))
}

/// Unwrap a cart mutation payload.
///
/// For mutations on an existing cart (`cart_id` given), a missing cart that
/// comes back with no user errors or only `cartId` errors means the cart
/// has expired and maps to `NotFound`.
fn cart_from_payload(
    payload: Option<cart::CartMutationPayload>,
    cart_id: Option<&str>,
    fallback: &str,
) -> Result<Cart, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::message(fallback));
    };

    if let Some(cart_id) = cart_id
        && payload.cart.is_none()
        && payload.user_errors.iter().all(is_cart_id_error)
    {
        return Err(ShopifyError::NotFound(format!("Cart not found: {cart_id}")));
    }

    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::UserError(
            payload
                .user_errors
                .into_iter()
                .map(|e| convert_user_error(e).message)
                .collect::<Vec<_>>()
                .join("; "),
        ));
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::message(fallback))
}

fn convert_graphql_error(error: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: error.message,
        locations: error.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: error.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_from_payload_user_errors() {
        let payload: cart::CartMutationPayload = serde_json::from_str(
            r#"{"cart": null, "userErrors": [
                {"code": null, "field": null, "message": "Variant is sold out"},
                {"code": null, "field": null, "message": "Quantity too high"}
            ]}"#,
        )
        .unwrap();

        let err = cart_from_payload(Some(payload), None, "fallback").unwrap_err();
        assert_eq!(
            err.to_string(),
            "User error: Variant is sold out; Quantity too high"
        );
    }

    #[test]
    fn test_cart_from_payload_missing() {
        let err = cart_from_payload(None, None, "Failed to create cart").unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: Failed to create cart");
    }

    #[test]
    fn test_expired_cart_maps_to_not_found() {
        let cart_id = "gid://shopify/Cart/expired";
        for body in [
            r#"{"cart": null, "userErrors": [
                {"code": "INVALID", "field": ["cartId"], "message": "The specified cart does not exist."}
            ]}"#,
            r#"{"cart": null, "userErrors": []}"#,
        ] {
            let payload: cart::CartMutationPayload = serde_json::from_str(body).unwrap();
            let err = cart_from_payload(Some(payload), Some(cart_id), "fallback").unwrap_err();
            assert!(matches!(err, ShopifyError::NotFound(_)), "got {err}");
        }
    }

    #[test]
    fn test_line_errors_on_existing_cart_stay_user_errors() {
        let payload: cart::CartMutationPayload = serde_json::from_str(
            r#"{"cart": null, "userErrors": [
                {"code": "INVALID", "field": ["lines", "0", "quantity"], "message": "Quantity too high"}
            ]}"#,
        )
        .unwrap();

        let err = cart_from_payload(Some(payload), Some("gid://shopify/Cart/c1"), "fallback")
            .unwrap_err();
        assert!(matches!(err, ShopifyError::UserError(m) if m == "Quantity too high"));
    }

    #[test]
    fn test_new_cart_without_cart_is_not_expiry() {
        let payload: cart::CartMutationPayload =
            serde_json::from_str(r#"{"cart": null, "userErrors": []}"#).unwrap();
        let err = cart_from_payload(Some(payload), None, "Failed to create cart").unwrap_err();
        assert!(matches!(err, ShopifyError::GraphQL(_)));
    }

    #[test]
    fn test_build_query_carries_operation_name() {
        let body = GetProductByHandle::build_query(queries::get_product_by_handle::Variables {
            handle: "cold-brew".to_string(),
            variant_count: VARIANT_COUNT,
            selling_plan_count: SELLING_PLAN_COUNT,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["operationName"], "GetProductByHandle");
        assert_eq!(json["variables"]["handle"], "cold-brew");
        assert_eq!(json["variables"]["sellingPlanCount"], SELLING_PLAN_COUNT);
    }
}
