use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub domain: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::social_app_sites::Entity")]
    SocialAppSites,
}

impl Related<super::social_app_sites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocialAppSites.def()
    }
}

impl Related<super::social_apps::Entity> for Entity {
    fn to() -> RelationDef {
        super::social_app_sites::Relation::SocialApps.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::social_app_sites::Relation::Sites.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
