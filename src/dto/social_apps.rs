use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::SocialApp;

/// Body for creating, replacing and patching a social application.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct SocialAppRequest {
    pub provider: Option<String>,
    pub name: Option<String>,
    pub client_id: Option<String>,
    pub secret: Option<String>,
    pub key: Option<String>,
    pub site_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SocialAppList {
    #[schema(value_type = Vec<SocialApp>)]
    pub items: Vec<SocialApp>,
}
