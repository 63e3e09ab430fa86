use std::sync::Arc;

use crate::{
    config::{AppConfig, AuthConfig},
    db::{DbPool, OrmConn, create_pool, orm_from_pool},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, auth: AuthConfig) -> Self {
        let orm = orm_from_pool(&pool);
        Self {
            pool,
            orm,
            auth: Arc::new(auth),
        }
    }

    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database_url, config.database_max_connections).await?;
        Ok(Self::new(pool, config.auth.clone()))
    }
}
