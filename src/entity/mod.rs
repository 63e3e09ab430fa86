pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod products;
pub mod sites;
pub mod social_app_sites;
pub mod social_apps;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use products::Entity as Products;
pub use sites::Entity as Sites;
pub use social_app_sites::Entity as SocialAppSites;
pub use social_apps::Entity as SocialApps;
pub use users::Entity as Users;

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, EntityTrait, ModelTrait, QueryTrait};
    use uuid::Uuid;

    use super::*;

    #[test]
    fn social_apps_reach_sites_through_the_link_table() {
        let sql = SocialApps::find()
            .find_with_related(Sites)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#""social_app_sites""#), "{sql}");
        assert!(sql.contains(r#""sites""#), "{sql}");
    }

    #[test]
    fn site_related_apps_filter_on_the_site() {
        let site = sites::Model {
            id: Uuid::nil(),
            name: "example.com".into(),
            domain: "example.com".into(),
        };
        let sql = site
            .find_related(SocialApps)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#"INNER JOIN "social_app_sites""#), "{sql}");
        assert!(sql.contains(&Uuid::nil().to_string()), "{sql}");
    }
}
