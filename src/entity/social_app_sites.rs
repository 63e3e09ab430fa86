use sea_orm::entity::prelude::*;

/// Join table between social applications and the sites they are enabled on.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "social_app_sites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub social_app_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub site_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::social_apps::Entity",
        from = "Column::SocialAppId",
        to = "super::social_apps::Column::Id",
        on_delete = "Cascade"
    )]
    SocialApps,
    #[sea_orm(
        belongs_to = "super::sites::Entity",
        from = "Column::SiteId",
        to = "super::sites::Column::Id",
        on_delete = "Cascade"
    )]
    Sites,
}

impl Related<super::social_apps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocialApps.def()
    }
}

impl Related<super::sites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
