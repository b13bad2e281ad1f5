//! Sprout Core - Shared types library.
//!
//! This crate provides common types used by the Sprout storefront:
//! - `storefront` - Public-facing product pages, cart and checkout redirects
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Shopify global IDs, legacy numeric IDs, prices and currencies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
