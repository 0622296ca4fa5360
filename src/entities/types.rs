//! Closed enumerations shared by the subscription and payment tables.
//!
//! Each enum is stored as a short string column. The set of variants is fixed
//! because presentation (currency symbols, category labels) is keyed on it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Currency a subscription is billed in.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum Currency {
    /// US dollar
    #[sea_orm(string_value = "USD")]
    Usd,
    /// Russian rouble
    #[sea_orm(string_value = "RUB")]
    Rub,
}

/// Spending category of a subscription.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Category {
    /// Streaming, games, music
    #[sea_orm(string_value = "entertainment")]
    Entertainment,
    /// Work tools
    #[sea_orm(string_value = "work")]
    Work,
    /// Courses and learning
    #[sea_orm(string_value = "education")]
    Education,
    /// Household services
    #[sea_orm(string_value = "home")]
    Home,
    /// Anything else
    #[sea_orm(string_value = "other")]
    Other,
}

/// Outcome of a recorded payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    /// Money has left the account
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Payment initiated but not settled
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Payment attempt failed
    #[sea_orm(string_value = "failed")]
    Failed,
}
