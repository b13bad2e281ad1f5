//! GraphQL operation definitions for Shopify Storefront API.
//!
//! Each operation implements `graphql_client::GraphQLQuery` by hand: the
//! document is a `const`, the variables and response data are plain serde
//! types mirroring the selection set.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

use crate::shopify::types::Money;

/// Relay-style connection exposing `nodes`.
#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

// =============================================================================
// Products
// =============================================================================

const GET_PRODUCT_BY_HANDLE: &str = r"
query GetProductByHandle($handle: String!, $variantCount: Int!, $sellingPlanCount: Int!) {
  product(handle: $handle) {
    id
    handle
    title
    description
    featuredImage { url altText }
    priceRange { minVariantPrice { amount currencyCode } }
    options { name optionValues { name } }
    requiresSellingPlan
    sellingPlanGroups(first: 10) {
      nodes {
        name
        options { name values }
        sellingPlans(first: $sellingPlanCount) {
          nodes { id name description }
        }
      }
    }
    variants(first: $variantCount) {
      nodes {
        id
        title
        availableForSale
        price { amount currencyCode }
        compareAtPrice { amount currencyCode }
        selectedOptions { name value }
        image { url altText }
        sellingPlanAllocations(first: $sellingPlanCount) {
          nodes {
            checkoutChargeAmount { amount currencyCode }
            sellingPlan { id }
          }
        }
      }
    }
  }
}
";

pub struct GetProductByHandle;

pub mod get_product_by_handle {
    use super::{Deserialize, Money, Nodes, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub handle: String,
        pub variant_count: i64,
        pub selling_plan_count: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNode {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub description: String,
        pub featured_image: Option<ImageNode>,
        pub price_range: PriceRangeNode,
        pub options: Vec<OptionNode>,
        pub requires_selling_plan: bool,
        pub selling_plan_groups: Nodes<SellingPlanGroupNode>,
        pub variants: Nodes<VariantNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ImageNode {
        pub url: String,
        pub alt_text: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRangeNode {
        pub min_variant_price: Money,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OptionNode {
        pub name: String,
        pub option_values: Vec<OptionValueNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OptionValueNode {
        pub name: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SellingPlanGroupNode {
        pub name: String,
        pub options: Vec<SellingPlanGroupOptionNode>,
        pub selling_plans: Nodes<SellingPlanNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SellingPlanGroupOptionNode {
        pub name: String,
        pub values: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SellingPlanNode {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantNode {
        pub id: String,
        pub title: String,
        pub available_for_sale: bool,
        pub price: Money,
        pub compare_at_price: Option<Money>,
        pub selected_options: Vec<SelectedOptionNode>,
        pub image: Option<ImageNode>,
        pub selling_plan_allocations: Nodes<SellingPlanAllocationNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SelectedOptionNode {
        pub name: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SellingPlanAllocationNode {
        pub checkout_charge_amount: Money,
        pub selling_plan: SellingPlanRef,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SellingPlanRef {
        pub id: String,
    }
}

impl GraphQLQuery for GetProductByHandle {
    type Variables = get_product_by_handle::Variables;
    type ResponseData = get_product_by_handle::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: GET_PRODUCT_BY_HANDLE,
            operation_name: "GetProductByHandle",
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

const CREATE_CART: &str = r"
mutation CreateCart($input: CartInput!) {
  cartCreate(input: $input) {
    cart { id checkoutUrl totalQuantity }
    userErrors { code field message }
  }
}
";

const ADD_TO_CART: &str = r"
mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { id checkoutUrl totalQuantity }
    userErrors { code field message }
  }
}
";

const GET_CART: &str = r"
query GetCart($cartId: ID!) {
  cart(id: $cartId) { id checkoutUrl totalQuantity }
}
";

pub mod cart {
    use super::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineInput {
        pub merchandise_id: String,
        pub quantity: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub selling_plan_id: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartNode {
        pub id: String,
        pub checkout_url: String,
        pub total_quantity: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UserErrorNode {
        pub code: Option<String>,
        pub field: Option<Vec<String>>,
        pub message: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartMutationPayload {
        pub cart: Option<CartNode>,
        pub user_errors: Vec<UserErrorNode>,
    }
}

pub struct CreateCart;

pub mod create_cart {
    use super::cart::{CartLineInput, CartMutationPayload};
    use super::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for CreateCart {
    type Variables = create_cart::Variables;
    type ResponseData = create_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: CREATE_CART,
            operation_name: "CreateCart",
        }
    }
}

pub struct AddToCart;

pub mod add_to_cart {
    use super::cart::{CartLineInput, CartMutationPayload};
    use super::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for AddToCart {
    type Variables = add_to_cart::Variables;
    type ResponseData = add_to_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: ADD_TO_CART,
            operation_name: "AddToCart",
        }
    }
}

pub struct GetCart;

pub mod get_cart {
    use super::cart::CartNode;
    use super::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartNode>,
    }
}

impl GraphQLQuery for GetCart {
    type Variables = get_cart::Variables;
    type ResponseData = get_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: GET_CART,
            operation_name: "GetCart",
        }
    }
}
