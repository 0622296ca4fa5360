//! Subscription entity - A recurring charge the user is tracking.
//!
//! Subscriptions are never physically deleted. Clearing `active` hides a row from
//! listings and analytics while its payment history stays intact.

use super::types::{Category, Currency};
use crate::{core::money::Money, errors::Error};
use chrono::Days;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Average length of a month in hundredths of a day (30.44 days).
const AVG_MONTH_CENTIDAYS: i128 = 3044;

/// Subscription database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// Unique identifier for the subscription
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Netflix")
    pub name: String,
    /// Cost per period in minor units
    pub cost: Money,
    /// Currency the cost is billed in
    pub currency: Currency,
    /// Length of one billing period in days
    pub period_days: i32,
    /// When the next payment is expected
    pub next_payment: DateTimeUtc,
    /// Spending category
    pub category: Category,
    /// Whether the service renews automatically
    pub auto_renewal: bool,
    /// Soft delete flag - false once the user removes the subscription
    pub active: bool,
    /// When the subscription was created
    pub created_at: DateTimeUtc,
    /// When the subscription was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Subscription and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One subscription has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True once `now` is strictly past the scheduled payment.
    #[must_use]
    pub fn is_payment_due(&self, now: DateTimeUtc) -> bool {
        now > self.next_payment
    }

    /// Moves `next_payment` forward by exactly one period.
    ///
    /// The new date is relative to the previous `next_payment`, not to `now`, so
    /// a subscription that is several periods overdue advances one period per call.
    pub fn advance_next_payment(&mut self, now: DateTimeUtc) -> crate::errors::Result<()> {
        self.next_payment = add_calendar_days(self.next_payment, self.period_days)?;
        self.updated_at = now;
        Ok(())
    }

    /// Cost normalised to an average 30.44-day month.
    #[must_use]
    pub fn monthly_equivalent(&self) -> Money {
        monthly_equivalent(self.cost, self.period_days)
    }
}

/// Adds whole calendar days to a timestamp.
pub fn add_calendar_days(from: DateTimeUtc, days: i32) -> crate::errors::Result<DateTimeUtc> {
    let days = u64::try_from(days)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| Error::validation(format!("Period must be a positive number of days, got {days}")))?;

    from.checked_add_days(Days::new(days))
        .ok_or_else(|| Error::validation("Next payment date is out of range"))
}

/// `cost * 30.44 / period_days`, computed as `cost * 3044 / (100 * period_days)`
/// in integers and truncated.
#[must_use]
pub fn monthly_equivalent(cost: Money, period_days: i32) -> Money {
    if period_days <= 0 {
        return Money::ZERO;
    }
    let scaled = i128::from(cost.minor_units()) * AVG_MONTH_CENTIDAYS / (100 * i128::from(period_days));
    Money::from_minor(i64::try_from(scaled).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(cost: i64, period_days: i32, next_payment: DateTimeUtc) -> Model {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Model {
            id: 1,
            name: "Netflix".to_string(),
            cost: Money::from_minor(cost),
            currency: Currency::Usd,
            period_days,
            next_payment,
            category: Category::Entertainment,
            auto_renewal: true,
            active: true,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_advance_next_payment_adds_one_period_to_previous_date() {
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut sub = sample(1000, 30, due);

        sub.advance_next_payment(now).unwrap();

        assert_eq!(sub.next_payment, Utc.with_ymd_and_hms(2024, 2, 9, 12, 0, 0).unwrap());
        assert_eq!(sub.updated_at, now);
        // Still overdue: exactly one period per call
        assert!(sub.is_payment_due(now));
    }

    #[test]
    fn test_is_payment_due_is_strict() {
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let sub = sample(1000, 30, due);

        assert!(!sub.is_payment_due(due));
        assert!(sub.is_payment_due(due + chrono::TimeDelta::seconds(1)));
        assert!(!sub.is_payment_due(due - chrono::TimeDelta::days(1)));
    }

    #[test]
    fn test_monthly_equivalent_matches_average_month() {
        assert_eq!(monthly_equivalent(Money::from_minor(3000), 30), Money::from_minor(3044));
        // 1000 * 3044 / 700 = 4348.57 -> truncated
        assert_eq!(monthly_equivalent(Money::from_minor(1000), 7), Money::from_minor(4348));
        // 12000 * 3044 / 36500 = 1000.76 -> truncated
        assert_eq!(monthly_equivalent(Money::from_minor(12000), 365), Money::from_minor(1000));
        assert_eq!(monthly_equivalent(Money::from_minor(1000), 0), Money::ZERO);

        let due = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(sample(3000, 30, due).monthly_equivalent(), Money::from_minor(3044));
    }

    #[test]
    fn test_add_calendar_days_rejects_non_positive_periods() {
        let from = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert!(add_calendar_days(from, 0).is_err());
        assert!(add_calendar_days(from, -3).is_err());
        assert_eq!(
            add_calendar_days(from, 365).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap()
        );
    }
}
