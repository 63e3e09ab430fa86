use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Site;

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct SiteRequest {
    pub name: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SiteList {
    #[schema(value_type = Vec<Site>)]
    pub items: Vec<Site>,
}
