//! Payment entity - An append-only record of money paid for a subscription.
//!
//! `amount` and `currency` are copied from the subscription when the payment is
//! recorded, so later price changes never rewrite history.
use super::types::{Currency, PaymentStatus};
use crate::core::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the subscription this payment belongs to
    pub subscription_id: i64,
    /// Amount paid in minor units
    pub amount: Money,
    /// Currency of the amount
    pub currency: Currency,
    /// When the payment was made
    pub paid_at: DateTimeUtc,
    /// `completed`, `pending` or `failed`
    pub status: PaymentStatus,
    /// When the record was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one subscription
    #[sea_orm(
        belongs_to = "super::subscription::Entity",
        from = "Column::SubscriptionId",
        to = "super::subscription::Column::Id"
    )]
    Subscription,
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
