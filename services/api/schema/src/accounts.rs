use sea_orm::entity::prelude::*;

/// Account record. Email is stored normalized (lowercase); the unique index
/// makes duplicate registration a constraint violation. Accounts are
/// deactivated, never physically deleted.
///
/// `status` wire values: 0 = Unverified, 1 = Active, 2 = Locked.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub status: i16,
    pub failed_logins: i16,
    pub lock_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::one_time_codes::Entity")]
    OneTimeCodes,
    #[sea_orm(has_many = "super::events::Entity")]
    Events,
}

impl Related<super::one_time_codes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OneTimeCodes.def()
    }
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
