use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartDetail, CartItemDto, SetDestinationRequest, UpdateQuantityRequest},
        checkout::{AddressInput, CartTotals, PlaceOrderRequest, QuoteFailure, ShippingQuoteResponse},
        orders::{OrderList, OrderWithItems},
        products::{CreateProductRequest, DistrictList, ProductList, UpdateProductRequest},
    },
    models::{Cart, CartItem, District, Order, OrderItem, PaymentMethod, Product, ProductVariant, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, checkout, districts, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        districts::list_districts,
        cart::cart_detail,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::set_destination,
        checkout::shipping_quote,
        checkout::place_order,
        orders::list_orders,
        orders::get_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory
    ),
    components(
        schemas(
            User,
            Product,
            ProductVariant,
            District,
            Cart,
            CartItem,
            Order,
            OrderItem,
            PaymentMethod,
            AddToCartRequest,
            UpdateQuantityRequest,
            SetDestinationRequest,
            CartItemDto,
            CartDetail,
            CartTotals,
            ShippingQuoteResponse,
            QuoteFailure,
            AddressInput,
            PlaceOrderRequest,
            OrderList,
            OrderWithItems,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            DistrictList,
            admin::UpdateOrderStatusRequest,
            admin::InventoryAdjustRequest,
            admin::LowStockQuery,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartDetail>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Districts", description = "Delivery district endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Checkout", description = "Shipping quote and order materialization"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
