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
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartSummaryList, UpdateCartItemRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        sites::{SiteList, SiteRequest},
        social_apps::{SocialAppList, SocialAppRequest},
        users::{UpdateUserRequest, UserList},
    },
    models::{Cart, CartLine, CartSummary, Product, Site, SocialApp, User},
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, health, params, products as product_routes, sites, social_apps, users,
    },
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
        auth::login,
        auth::register,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::replace_product,
        product_routes::patch_product,
        product_routes::delete_product,
        users::list_users,
        users::get_me,
        users::replace_me,
        users::patch_me,
        users::delete_me,
        users::get_user,
        users::replace_user,
        users::patch_user,
        users::delete_user,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        admin::list_carts,
        admin::get_cart,
        sites::list_sites,
        sites::get_site,
        sites::create_site,
        sites::replace_site,
        sites::patch_site,
        sites::delete_site,
        social_apps::list_social_apps,
        social_apps::get_social_app,
        social_apps::create_social_app,
        social_apps::replace_social_app,
        social_apps::patch_social_app,
        social_apps::delete_social_app
    ),
    components(
        schemas(
            User,
            Product,
            Cart,
            CartLine,
            CartSummary,
            Site,
            SocialApp,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            UpdateUserRequest,
            AddToCartRequest,
            UpdateCartItemRequest,
            SiteRequest,
            SocialAppRequest,
            ProductList,
            UserList,
            CartSummaryList,
            SiteList,
            SocialAppList,
            params::Pagination,
            params::ProductQuery,
            params::ProductSortBy,
            params::SortOrder,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<User>,
            ApiResponse<Cart>,
            ApiResponse<CartSummaryList>,
            ApiResponse<Site>,
            ApiResponse<SocialApp>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and token login"),
        (name = "Products", description = "Product catalog"),
        (name = "Users", description = "User accounts"),
        (name = "Cart", description = "Current user's cart"),
        (name = "Admin", description = "Staff overview of carts"),
        (name = "Sites", description = "Site registry (staff only)"),
        (name = "Social Apps", description = "OAuth client configuration (staff only)"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
