//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::product_form::{WidgetLoader, WidgetPayloadCache};
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the Storefront API client, the widget payload cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    payloads: WidgetPayloadCache,
    widget: WidgetLoader,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storefront = StorefrontClient::new(&config.shopify);
        let widget = WidgetLoader::new(&config.widget);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                payloads: WidgetPayloadCache::default(),
                widget,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Memoized subscription widget payloads.
    #[must_use]
    pub fn payloads(&self) -> &WidgetPayloadCache {
        &self.inner.payloads
    }

    #[must_use]
    pub fn widget(&self) -> &WidgetLoader {
        &self.inner.widget
    }
}
