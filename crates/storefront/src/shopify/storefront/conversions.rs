//! Conversions from raw GraphQL response shapes to domain types.
//!
//! Ids are checked against the `gid://shopify/<Resource>/<id>` form on the
//! way in. A bad id is logged and kept as is; code that needs the numeric
//! id treats it as absent.

use sprout_core::ShopifyGid;
use tracing::warn;

use crate::shopify::types::{
    Cart, CartUserError, Image, Product, ProductOption, ProductVariant, SelectedOption,
    SellingPlan, SellingPlanAllocation, SellingPlanGroup, SellingPlanGroupOption,
};

use super::queries::{cart, get_product_by_handle as gql};

/// Whether `id` is a well-formed gid for `resource`, warning if not.
fn check_gid(id: &str, resource: &str) -> bool {
    match ShopifyGid::parse(id) {
        Ok(gid) if gid.resource() == resource => true,
        Ok(gid) => {
            warn!(gid = %gid, expected = resource, "Unexpected gid resource from Storefront API");
            false
        }
        Err(e) => {
            warn!(error = %e, expected = resource, "Malformed gid from Storefront API");
            false
        }
    }
}

pub fn convert_product(product: gql::ProductNode) -> Product {
    check_gid(&product.id, "Product");
    Product {
        id: product.id,
        handle: product.handle,
        title: product.title,
        description: product.description,
        featured_image: product.featured_image.map(convert_image),
        price: product.price_range.min_variant_price,
        options: product
            .options
            .into_iter()
            .map(|opt| ProductOption {
                name: opt.name,
                values: opt.option_values.into_iter().map(|v| v.name).collect(),
            })
            .collect(),
        variants: product
            .variants
            .nodes
            .into_iter()
            .map(convert_variant)
            .collect(),
        requires_selling_plan: product.requires_selling_plan,
        selling_plan_groups: product
            .selling_plan_groups
            .nodes
            .into_iter()
            .map(convert_selling_plan_group)
            .collect(),
    }
}

fn convert_image(image: gql::ImageNode) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
    }
}

fn convert_variant(variant: gql::VariantNode) -> ProductVariant {
    check_gid(&variant.id, "ProductVariant");
    ProductVariant {
        id: variant.id,
        title: variant.title,
        available_for_sale: variant.available_for_sale,
        price: variant.price,
        compare_at_price: variant.compare_at_price,
        selected_options: variant
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
        image: variant.image.map(convert_image),
        selling_plan_allocations: variant
            .selling_plan_allocations
            .nodes
            .into_iter()
            .map(|a| {
                check_gid(&a.selling_plan.id, "SellingPlan");
                SellingPlanAllocation {
                    checkout_charge_amount: a.checkout_charge_amount,
                    selling_plan_id: a.selling_plan.id,
                }
            })
            .collect(),
    }
}

fn convert_selling_plan_group(group: gql::SellingPlanGroupNode) -> SellingPlanGroup {
    SellingPlanGroup {
        name: group.name,
        options: group
            .options
            .into_iter()
            .map(|opt| SellingPlanGroupOption {
                name: opt.name,
                values: opt.values,
            })
            .collect(),
        selling_plans: group
            .selling_plans
            .nodes
            .into_iter()
            .map(|plan| {
                check_gid(&plan.id, "SellingPlan");
                SellingPlan {
                    id: plan.id,
                    name: plan.name,
                    description: plan.description,
                }
            })
            .collect(),
    }
}

pub fn convert_cart(cart: cart::CartNode) -> Cart {
    Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        total_quantity: cart.total_quantity,
    }
}

pub fn convert_user_error(error: cart::UserErrorNode) -> CartUserError {
    CartUserError {
        code: error.code,
        field: error.field,
        message: error.message,
    }
}
