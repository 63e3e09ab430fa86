pub mod auth_service;
pub mod cart_service;
pub mod product_service;
pub mod site_service;
pub mod social_app_service;
pub mod user_service;
