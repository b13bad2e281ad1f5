//! Product route handlers.
//!
//! The product page is the only place the form lives. A full render runs
//! the load-from-URL pass; option changes arrive as HTMX posts and answer
//! with the re-rendered form plus an `HX-Replace-Url` header.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, RawQuery, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Response},
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::CspNonce;
use crate::product_form::{
    HeadScripts, OptionSync, ProductFormView, ScriptHandle, SelectionState, UrlQueryStore,
};
use crate::shopify::types::{Image, Product};
use crate::state::AppState;

/// Header htmx sends with the browser's current address bar URL.
const HX_CURRENT_URL: &str = "HX-Current-URL";

/// Header telling htmx to replace the address bar URL without navigating.
const HX_REPLACE_URL: &str = "HX-Replace-Url";

/// Product details around the form.
#[derive(Clone)]
pub struct ProductView {
    pub title: String,
    pub description: String,
    pub image: Option<ImageView>,
}

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

impl ImageView {
    fn from_image(image: &Image, fallback_alt: &str) -> Self {
        Self {
            url: image.url.clone(),
            alt: image
                .alt_text
                .clone()
                .unwrap_or_else(|| fallback_alt.to_string()),
        }
    }
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            image: product
                .featured_image
                .as_ref()
                .map(|image| ImageView::from_image(image, &product.title)),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub form: ProductFormView,
    pub head: HeadScripts,
    /// URL to put in the address bar after the load pass added parameters.
    pub replace_url: Option<String>,
    pub nonce: String,
    /// Keeps the widget script registered until the page is rendered.
    pub widget_script: Option<ScriptHandle>,
}

/// Product form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_form.html")]
pub struct ProductFormTemplate {
    pub form: ProductFormView,
}

fn product_path(handle: &str) -> String {
    format!("/products/{}", urlencoding::encode(handle))
}

/// Display the product page with the selection taken from the URL.
#[instrument(skip(state, nonce))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    RawQuery(query): RawQuery,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let product = state.storefront().get_product_by_handle(&handle).await?;

    let mut store = UrlQueryStore::parse(product_path(&handle), query.as_deref().unwrap_or_default());
    let mut selection = SelectionState::default_for(&product);
    OptionSync::new(&product.options).load_from_url(&mut selection, &mut store);

    let form = ProductFormView::build(
        &product,
        &selection,
        store.query_string(),
        state.payloads(),
        state.widget(),
    )?;

    let head = HeadScripts::default();
    let widget_script = form.widget.as_ref().map(|_| state.widget().load(&head));

    Ok(ProductShowTemplate {
        product: ProductView::from(&*product),
        form,
        head,
        replace_url: store.replaced_url().map(str::to_owned),
        nonce,
        widget_script,
    })
}

/// Apply an option change (HTMX).
///
/// The posted body carries `option name = value` pairs, normally one. The
/// selection is rebuilt from the browser's current URL first, so other
/// options keep their values.
#[instrument(skip(state, headers, changes))]
pub async fn change_option(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    Form(changes): Form<Vec<(String, String)>>,
) -> Result<Response> {
    if changes.is_empty() {
        return Err(AppError::BadRequest("no option given".to_string()));
    }

    let product = state.storefront().get_product_by_handle(&handle).await?;
    let path = product_path(&handle);

    let mut store = headers
        .get(HX_CURRENT_URL)
        .and_then(|v| v.to_str().ok())
        .and_then(|url| UrlQueryStore::from_current_url(path.clone(), url))
        .unwrap_or_else(|| UrlQueryStore::parse(path, query.as_deref().unwrap_or_default()));

    let sync = OptionSync::new(&product.options);
    let mut selection = SelectionState::default_for(&product);
    sync.load_from_url(&mut selection, &mut store);
    for (option, value) in &changes {
        sync.change(&mut selection, &mut store, option, value)?;
    }

    let form = ProductFormView::build(
        &product,
        &selection,
        store.query_string(),
        state.payloads(),
        state.widget(),
    )?;

    let replace_url = store.replaced_url().unwrap_or_default().to_string();
    Ok((
        AppendHeaders([(HX_REPLACE_URL, replace_url)]),
        ProductFormTemplate { form },
    )
        .into_response())
}
