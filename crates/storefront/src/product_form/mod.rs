//! Product purchase form.
//!
//! # Flow
//!
//! ```text
//! GET  /products/{handle}?color=red   SelectionState::default_for
//!                                     -> OptionSync::load_from_url
//!                                     -> ProductFormView::build (payload, widget)
//! POST /products/{handle}/options     OptionSync::change
//!                                     -> ProductFormView::build
//!                                     -> HX-Replace-Url
//! ```
//!
//! The address bar is the only place the selection lives between requests.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod payload;
pub mod query_state;
pub mod selection;
pub mod sync;
pub mod view;
pub mod widget;

pub use payload::{PayloadInputs, WidgetPayloadCache, build_widget_payload};
pub use query_state::{QueryStateStore, UrlQueryStore};
pub use selection::SelectionState;
pub use sync::{OptionSync, SelectionError, encode_param};
pub use view::{OptionValueView, OptionView, ProductFormView};
pub use widget::{HeadScripts, ScriptHandle, WidgetContainer, WidgetLoader};
