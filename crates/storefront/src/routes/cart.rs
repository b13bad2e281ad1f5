//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Cart IDs are stored in the session and mapped to Shopify carts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sprout_core::{LegacyVariantId, legacy_id_segment};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CART_ID_KEY;
use crate::shopify::ShopifyError;
use crate::shopify::types::{CartLineInput, ProductVariant};
use crate::state::AppState;

/// Largest quantity accepted in a single add.
const MAX_QUANTITY: u32 = 99;

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart ID from the session.
async fn get_cart_id(session: &Session) -> Option<String> {
    session.get::<String>(CART_ID_KEY).await.ok().flatten()
}

/// Set the cart ID in the session.
async fn set_cart_id(session: &Session, cart_id: &str) -> Result<()> {
    session
        .insert(CART_ID_KEY, cart_id)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save cart ID to session: {e}")))
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    /// Product handle, used to re-resolve the variant.
    pub handle: String,
    /// Variant gid.
    pub variant_id: String,
    pub quantity: Option<u32>,
    /// Selling plan chosen in the subscription widget: a gid or the
    /// widget's legacy numeric id. Empty means a one-time purchase.
    pub selling_plan_id: Option<String>,
}

/// Express checkout query.
#[derive(Debug, Deserialize)]
pub struct ExpressCheckoutQuery {
    pub variant_id: LegacyVariantId,
    pub quantity: Option<u32>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn validate_quantity(quantity: Option<u32>) -> Result<u32> {
    match quantity.unwrap_or(1) {
        q @ 1..=MAX_QUANTITY => Ok(q),
        q => Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_QUANTITY}, got {q}"
        ))),
    }
}

/// Resolve the posted selling plan against the variant's allocations.
///
/// Accepts a gid or a legacy numeric id and returns the gid to send to
/// the Storefront API.
fn resolve_selling_plan(
    variant: &ProductVariant,
    requested: Option<&str>,
    requires_selling_plan: bool,
) -> Result<Option<String>> {
    let Some(requested) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        if requires_selling_plan {
            return Err(AppError::BadRequest(
                "this product is only sold by subscription".to_string(),
            ));
        }
        return Ok(None);
    };

    let legacy = requested.parse::<u64>().ok();
    variant
        .selling_plan_allocations
        .iter()
        .map(|allocation| &allocation.selling_plan_id)
        .find(|gid| {
            *gid == requested || legacy.is_some_and(|id| legacy_id_segment(gid) == Some(id))
        })
        .cloned()
        .map(Some)
        .ok_or_else(|| {
            AppError::BadRequest(format!("selling plan {requested} is not offered for this variant"))
        })
}

/// Shop Pay cart permalink for one variant.
#[must_use]
pub fn shop_pay_url(store: &str, variant_id: LegacyVariantId, quantity: u32) -> String {
    format!("https://{store}/cart/{variant_id}:{quantity}?payment=shop_pay")
}

/// Add the current variant to the cart (HTMX).
///
/// Creates a new cart if one doesn't exist, or adds to the existing cart.
/// Sold-out variants are refused before anything reaches Shopify.
/// Returns an HTMX trigger to update the cart count badge.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = validate_quantity(form.quantity)?;

    let product = state.storefront().get_product_by_handle(&form.handle).await?;
    let variant = product
        .variants
        .iter()
        .find(|v| v.id == form.variant_id)
        .ok_or_else(|| AppError::BadRequest(format!("unknown variant {}", form.variant_id)))?;

    if !variant.available_for_sale {
        return Err(AppError::BadRequest(format!(
            "{} ({}) is sold out",
            product.title, variant.title
        )));
    }

    let selling_plan_id = resolve_selling_plan(
        variant,
        form.selling_plan_id.as_deref(),
        product.requires_selling_plan,
    )?;

    let line = CartLineInput {
        merchandise_id: variant.id.clone(),
        quantity: i64::from(quantity),
        selling_plan_id,
    };

    let cart = match get_cart_id(&session).await {
        Some(cart_id) => {
            match state
                .storefront()
                .add_to_cart(&cart_id, vec![line.clone()])
                .await
            {
                // Carts expire on Shopify's side; start a fresh one
                Err(ShopifyError::NotFound(_)) => state.storefront().create_cart(vec![line]).await?,
                other => other?,
            }
        }
        None => state.storefront().create_cart(vec![line]).await?,
    };

    set_cart_id(&session, &cart.id).await?;
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("variant_id", variant.id.as_str()),
            ("handle", product.handle.as_str()),
        ]),
    );

    let count = u32::try_from(cart.total_quantity).unwrap_or(0);

    // Return cart count with HTMX trigger to update other elements
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate { count },
    )
        .into_response())
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let count = match get_cart_id(&session).await {
        Some(cart_id) => state
            .storefront()
            .get_cart(&cart_id)
            .await
            .map(|cart| u32::try_from(cart.total_quantity).unwrap_or(0))
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to fetch cart {cart_id}: {e}");
                0
            }),
        None => 0,
    };

    CartCountTemplate { count }
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let Some(cart_id) = get_cart_id(&session).await else {
        return Ok(Redirect::to("/"));
    };

    let cart = state.storefront().get_cart(&cart_id).await?;
    Ok(Redirect::to(&cart.checkout_url))
}

/// Shop Pay express checkout for a single variant.
#[instrument(skip(state))]
pub async fn express_checkout(
    State(state): State<AppState>,
    Query(query): Query<ExpressCheckoutQuery>,
) -> Result<Redirect> {
    let quantity = validate_quantity(query.quantity)?;
    let url = shop_pay_url(&state.config().shopify.store, query.variant_id, quantity);
    Ok(Redirect::to(&url))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{StorefrontConfig, test_config};
    use crate::product_form::fixtures::{cold_brew, tee};

    const TEE_LARGE_RED: &str =
        "handle=tee&variant_id=gid%3A%2F%2Fshopify%2FProductVariant%2F102&quantity=1";

    async fn app_with(config: StorefrontConfig) -> axum::Router {
        let state = AppState::new(config);
        state.storefront().prime_product(tee()).await;
        state.storefront().prime_product(cold_brew()).await;
        crate::router(state)
    }

    async fn app() -> axum::Router {
        app_with(test_config()).await
    }

    /// App whose Storefront API calls go to `server`.
    async fn app_against(server: &MockServer) -> axum::Router {
        let mut config = test_config();
        config.shopify.endpoint = Some(format!("{}/graphql.json", server.uri()));
        app_with(config).await
    }

    fn cart_json(id: &str, total_quantity: i64) -> serde_json::Value {
        json!({
            "id": id,
            "checkoutUrl": format!("https://sprout-test.myshopify.com/cart/c/{id}"),
            "totalQuantity": total_quantity,
        })
    }

    fn storefront_operation(name: &str) -> wiremock::MockBuilder {
        Mock::given(method("POST"))
            .and(path("/graphql.json"))
            .and(header_eq("Shopify-Storefront-Private-Token", "shpat_9f8e7d6c5b4a"))
            .and(body_string_contains(format!(r#""operationName":"{name}""#)))
    }

    async fn mount_create_cart(server: &MockServer, calls: u64) {
        storefront_operation("CreateCart")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"cartCreate": {
                    "cart": cart_json("gid://shopify/Cart/c1", 1),
                    "userErrors": [],
                }}
            })))
            .expect(calls)
            .mount(server)
            .await;
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn add_request(body: &str) -> Request<Body> {
        Request::post("/cart/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_creates_cart_and_triggers_update() {
        let server = MockServer::start().await;
        mount_create_cart(&server, 1).await;

        let response = app_against(&server)
            .await
            .oneshot(add_request(TEE_LARGE_RED))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["HX-Trigger"], "cart-updated");
        assert!(session_cookie(&response).starts_with("sprout_session="));
        assert!(body_text(response).await.contains(r#"<span class="cart-count">1</span>"#));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_add_to_existing_cart_and_count() {
        let server = MockServer::start().await;
        mount_create_cart(&server, 1).await;
        storefront_operation("AddToCart")
            .and(body_string_contains(r#""cartId":"gid://shopify/Cart/c1""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"cartLinesAdd": {
                    "cart": cart_json("gid://shopify/Cart/c1", 2),
                    "userErrors": [],
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;
        storefront_operation("GetCart")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"cart": cart_json("gid://shopify/Cart/c1", 2)}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = app_against(&server).await;
        let first = app.clone().oneshot(add_request(TEE_LARGE_RED)).await.unwrap();
        let cookie = session_cookie(&first);

        let mut second = add_request(TEE_LARGE_RED);
        second.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
        let second = app.clone().oneshot(second).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert!(body_text(second).await.contains(r#"<span class="cart-count">2</span>"#));

        let count = app
            .oneshot(
                Request::get("/cart/count")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(body_text(count).await.contains(r#"<span class="cart-count">2</span>"#));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_add_recreates_expired_cart() {
        let server = MockServer::start().await;
        // Once for the first add, once more after the cart has expired
        mount_create_cart(&server, 2).await;
        storefront_operation("AddToCart")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"cartLinesAdd": {
                    "cart": null,
                    "userErrors": [{
                        "code": "INVALID",
                        "field": ["cartId"],
                        "message": "The specified cart does not exist.",
                    }],
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = app_against(&server).await;
        let first = app.clone().oneshot(add_request(TEE_LARGE_RED)).await.unwrap();
        let cookie = session_cookie(&first);

        let mut retry = add_request(TEE_LARGE_RED);
        retry.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
        let response = app.oneshot(retry).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["HX-Trigger"], "cart-updated");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_add_surfaces_line_errors() {
        let server = MockServer::start().await;
        storefront_operation("CreateCart")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"cartCreate": {
                    "cart": null,
                    "userErrors": [{
                        "code": "INVALID",
                        "field": ["input", "lines", "0", "quantity"],
                        "message": "Only 3 left",
                    }],
                }}
            })))
            .mount(&server)
            .await;

        let response = app_against(&server)
            .await
            .oneshot(add_request(TEE_LARGE_RED))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_text(response).await, "Only 3 left");
    }

    #[test]
    fn test_shop_pay_url() {
        assert_eq!(
            shop_pay_url("sprout.myshopify.com", LegacyVariantId::new(123), 2),
            "https://sprout.myshopify.com/cart/123:2?payment=shop_pay"
        );
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity(None).unwrap(), 1);
        assert_eq!(validate_quantity(Some(99)).unwrap(), 99);
        assert!(validate_quantity(Some(0)).is_err());
        assert!(validate_quantity(Some(100)).is_err());
    }

    #[test]
    fn test_resolve_selling_plan() {
        let product = cold_brew();
        let variant = &product.variants[0];
        let gid = "gid://shopify/SellingPlan/555";

        assert_eq!(resolve_selling_plan(variant, None, false).unwrap(), None);
        assert_eq!(resolve_selling_plan(variant, Some(""), false).unwrap(), None);
        assert_eq!(
            resolve_selling_plan(variant, Some(gid), false).unwrap().as_deref(),
            Some(gid)
        );
        assert_eq!(
            resolve_selling_plan(variant, Some("555"), false).unwrap().as_deref(),
            Some(gid)
        );
        assert!(resolve_selling_plan(variant, Some("556"), false).is_err());
        assert!(resolve_selling_plan(variant, None, true).is_err());
    }

    #[tokio::test]
    async fn test_add_sold_out_variant_is_refused() {
        let response = app()
            .await
            .oneshot(add_request(
                "handle=tee&variant_id=gid%3A%2F%2Fshopify%2FProductVariant%2F101&quantity=1",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_unknown_variant_is_refused() {
        let response = app()
            .await
            .oneshot(add_request(
                "handle=tee&variant_id=gid%3A%2F%2Fshopify%2FProductVariant%2F999",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_with_foreign_selling_plan_is_refused() {
        let response = app()
            .await
            .oneshot(add_request(
                "handle=cold-brew&variant_id=gid%3A%2F%2Fshopify%2FProductVariant%2F123&selling_plan_id=42",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_express_checkout_redirects_to_shop_pay() {
        let response = app()
            .await
            .oneshot(
                Request::get("/checkout/express?variant_id=102&quantity=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://sprout-test.myshopify.com/cart/102:1?payment=shop_pay"
        );
    }

    #[tokio::test]
    async fn test_checkout_without_cart_goes_home() {
        let response = app()
            .await
            .oneshot(Request::get("/checkout").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_count_without_cart_is_zero() {
        let response = app()
            .await
            .oneshot(Request::get("/cart/count").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
