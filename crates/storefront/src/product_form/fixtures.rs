//! Product fixtures shared by unit tests.

use crate::shopify::types::{
    Money, Product, ProductOption, ProductVariant, SelectedOption, SellingPlan,
    SellingPlanAllocation, SellingPlanGroup, SellingPlanGroupOption,
};

pub(crate) fn usd(amount: &str) -> Money {
    Money {
        amount: amount.parse().unwrap_or_default(),
        currency_code: "USD".to_string(),
    }
}

pub(crate) fn variant(id: u64, color: &str, size: &str, available: bool) -> ProductVariant {
    ProductVariant {
        id: format!("gid://shopify/ProductVariant/{id}"),
        title: format!("{color} / {size}"),
        available_for_sale: available,
        price: usd("19.99"),
        compare_at_price: None,
        selected_options: vec![
            SelectedOption {
                name: "Color".to_string(),
                value: color.to_string(),
            },
            SelectedOption {
                name: "Size".to_string(),
                value: size.to_string(),
            },
        ],
        image: None,
        selling_plan_allocations: vec![],
    }
}

/// Tee in Red/Blue × Small/Large; Red/Small is sold out.
pub(crate) fn tee() -> Product {
    Product {
        id: "gid://shopify/Product/1".to_string(),
        handle: "tee".to_string(),
        title: "Tee".to_string(),
        description: String::new(),
        featured_image: None,
        price: usd("19.99"),
        options: vec![
            ProductOption {
                name: "Color".to_string(),
                values: vec!["Red".to_string(), "Blue".to_string()],
            },
            ProductOption {
                name: "Size".to_string(),
                values: vec!["Small".to_string(), "Large".to_string()],
            },
        ],
        variants: vec![
            variant(101, "Red", "Small", false),
            variant(102, "Red", "Large", true),
            variant(103, "Blue", "Small", true),
            variant(104, "Blue", "Large", true),
        ],
        requires_selling_plan: false,
        selling_plan_groups: vec![],
    }
}

/// Single-variant coffee sold one-off or on a "Subscribe & Save" plan.
pub(crate) fn cold_brew() -> Product {
    let plan_id = "gid://shopify/SellingPlan/555".to_string();
    Product {
        id: "gid://shopify/Product/2".to_string(),
        handle: "cold-brew".to_string(),
        title: "Cold Brew Concentrate".to_string(),
        description: "Steeped for 20 hours.".to_string(),
        featured_image: None,
        price: usd("19.99"),
        options: vec![ProductOption {
            name: "Title".to_string(),
            values: vec!["Default Title".to_string()],
        }],
        variants: vec![ProductVariant {
            id: "gid://shopify/ProductVariant/123".to_string(),
            title: "Default Title".to_string(),
            available_for_sale: true,
            price: usd("19.99"),
            compare_at_price: Some(usd("24")),
            selected_options: vec![SelectedOption {
                name: "Title".to_string(),
                value: "Default Title".to_string(),
            }],
            image: None,
            selling_plan_allocations: vec![SellingPlanAllocation {
                checkout_charge_amount: usd("17.99"),
                selling_plan_id: plan_id.clone(),
            }],
        }],
        requires_selling_plan: false,
        selling_plan_groups: vec![SellingPlanGroup {
            name: "Subscribe & Save".to_string(),
            options: vec![SellingPlanGroupOption {
                name: "Deliver every".to_string(),
                values: vec!["2 weeks".to_string()],
            }],
            selling_plans: vec![SellingPlan {
                id: plan_id,
                name: "Every 2 weeks".to_string(),
                description: Some("Save 10%".to_string()),
            }],
        }],
    }
}
