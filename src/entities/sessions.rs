use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Opaque bearer token (64-char hex string)
    #[sea_orm(unique)]
    pub token: String,

    pub user_id: i32,

    pub created_at: String,

    /// RFC 3339 UTC timestamp. Strictly after `created_at` at insert time.
    pub expires_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
