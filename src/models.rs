use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    products::Model as ProductModel, sites::Model as SiteModel,
    social_apps::Model as SocialAppModel, users::Model as UserModel,
};

/// Public view of an account. The password hash never leaves the service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub photo: Option<String>,
    pub is_staff: bool,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            birth_date: model.birth_date,
            photo: model.photo,
            is_staff: model.is_staff,
            disabled: model.disabled,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "10.00")]
    pub price: Decimal,
    pub count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            count: model.count,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    #[schema(value_type = String, example = "20.00")]
    pub line_total: Decimal,
}

/// A cart with its lines and a total computed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    /// `None` until the first product is added.
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
    #[schema(value_type = String, example = "20.00")]
    pub total_price: Decimal,
    #[schema(example = "20.0")]
    pub total_price_display: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// One row of the staff cart overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub item_count: i64,
    #[schema(value_type = String, example = "20.00")]
    pub total_price: Decimal,
    pub total_price_display: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
}

impl From<SiteModel> for Site {
    fn from(model: SiteModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            domain: model.domain,
        }
    }
}

/// OAuth client configuration. The client secret is write-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SocialApp {
    pub id: Uuid,
    pub provider: String,
    pub name: String,
    pub client_id: String,
    pub key: String,
    pub has_secret: bool,
    pub site_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl SocialApp {
    pub fn from_parts(model: SocialAppModel, site_ids: Vec<Uuid>) -> Self {
        Self {
            id: model.id,
            provider: model.provider,
            name: model.name,
            client_id: model.client_id,
            key: model.key,
            has_secret: !model.secret.is_empty(),
            site_ids,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
