use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub display_name: String,

    /// Subscription tier name, always one of the [`crate::tiers::Tier`] values
    pub tier: String,

    /// Soft-delete flag. Users are deactivated, never removed.
    pub is_active: bool,

    pub email_verified: bool,

    pub created_at: String,

    pub updated_at: String,

    pub last_login_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
