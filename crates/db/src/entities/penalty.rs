//! Penalty entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of penalty, in increasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PenaltyType {
    /// Advisory only; never blocks an action.
    #[sea_orm(string_value = "WARNING")]
    Warning,
    /// Blocks applying to posts.
    #[sea_orm(string_value = "TEMPORARY_RESTRICTION")]
    TemporaryRestriction,
    /// Blocks applying to posts and receiving certificates.
    #[sea_orm(string_value = "SUSPENSION")]
    Suspension,
}

/// Stored penalty status.
///
/// Expiry is never written back here; see `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Default)]
pub enum PenaltyStatus {
    #[sea_orm(string_value = "ACTIVE")]
    #[default]
    Active,
    #[sea_orm(string_value = "RESOLVED")]
    Resolved,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
}

/// Penalty model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "penalty")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// The penalized user.
    pub user_id: String,
    #[sea_orm(column_name = "type")]
    pub penalty_type: PenaltyType,
    pub status: PenaltyStatus,
    pub reason: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// None = indefinite until resolved.
    pub expires_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub resolved_at: Option<DateTimeWithTimeZone>,
    /// Admin who issued the penalty; None for automatic escalations.
    pub issued_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
