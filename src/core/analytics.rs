//! Spending analytics - read models over payments and active subscriptions.
//!
//! Aggregates are grouped into `BTreeMap`s keyed by the closed enums, which
//! gives the bot a stable display order without extra sorting.

use crate::{
    core::money::Money,
    entities::{Category, Currency, Payment, PaymentStatus, Subscription, payment},
    errors::Result,
};
use chrono::{Datelike, Months, NaiveDate, NaiveTime, TimeDelta};
use sea_orm::{QueryOrder, QuerySelect, prelude::*};
use std::collections::BTreeMap;

/// Total of completed payments in one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSummary {
    /// Currency of the payments
    pub currency: Currency,
    /// Sum of the payment amounts
    pub total: Money,
    /// Number of payments summed
    pub count: u64,
}

/// First and last instant of the calendar month containing `at`.
///
/// The range is inclusive: it ends at 23:59:59 on the last day of the month.
#[must_use]
pub fn month_bounds(at: DateTimeUtc) -> (DateTimeUtc, DateTimeUtc) {
    let first_day = NaiveDate::from_ymd_opt(at.year(), at.month(), 1).unwrap_or_else(|| at.date_naive());
    let start = first_day.and_time(NaiveTime::MIN).and_utc();
    let end = start
        .checked_add_months(Months::new(1))
        .map_or(start, |next| next - TimeDelta::seconds(1));
    (start, end)
}

/// Sums payments grouped by currency, ordered by currency.
fn summarize<'a, I>(payments: I) -> Vec<PaymentSummary>
where
    I: IntoIterator<Item = &'a payment::Model>,
{
    let mut totals: BTreeMap<Currency, (Money, u64)> = BTreeMap::new();
    for p in payments {
        let entry = totals.entry(p.currency).or_insert((Money::ZERO, 0));
        entry.0 += p.amount;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(currency, (total, count))| PaymentSummary {
            currency,
            total,
            count,
        })
        .collect()
}

/// Completed payments with `paid_at` in `[start, end]`.
async fn completed_payments_between<C>(
    db: &C,
    start: DateTimeUtc,
    end: DateTimeUtc,
) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .filter(payment::Column::Status.eq(PaymentStatus::Completed))
        .filter(payment::Column::PaidAt.gte(start))
        .filter(payment::Column::PaidAt.lte(end))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Completed payments of the calendar month containing `month`, per currency.
pub async fn get_monthly_expense<C>(db: &C, month: DateTimeUtc) -> Result<Vec<PaymentSummary>>
where
    C: ConnectionTrait,
{
    let (start, end) = month_bounds(month);
    let payments = completed_payments_between(db, start, end).await?;
    Ok(summarize(&payments))
}

/// [`get_monthly_expense`] for the month containing `now`.
pub async fn get_current_month_expense<C>(db: &C, now: DateTimeUtc) -> Result<Vec<PaymentSummary>>
where
    C: ConnectionTrait,
{
    get_monthly_expense(db, now).await
}

/// Completed payments in `[start, end]`, grouped by the category of their
/// subscription and then by currency.
///
/// Payments of soft-deleted subscriptions still count: they are history.
pub async fn get_category_analytics<C>(
    db: &C,
    start: DateTimeUtc,
    end: DateTimeUtc,
) -> Result<BTreeMap<Category, Vec<PaymentSummary>>>
where
    C: ConnectionTrait,
{
    let rows = Payment::find()
        .find_also_related(Subscription)
        .filter(payment::Column::Status.eq(PaymentStatus::Completed))
        .filter(payment::Column::PaidAt.gte(start))
        .filter(payment::Column::PaidAt.lte(end))
        .all(db)
        .await?;

    let mut by_category: BTreeMap<Category, Vec<payment::Model>> = BTreeMap::new();
    for (payment, subscription) in rows {
        // Inner-join semantics: a payment without its subscription has no category
        if let Some(subscription) = subscription {
            by_category.entry(subscription.category).or_default().push(payment);
        }
    }

    Ok(by_category
        .into_iter()
        .map(|(category, payments)| (category, summarize(&payments)))
        .collect())
}

/// [`get_category_analytics`] for the month containing `now`.
pub async fn get_current_month_category_analytics<C>(
    db: &C,
    now: DateTimeUtc,
) -> Result<BTreeMap<Category, Vec<PaymentSummary>>>
where
    C: ConnectionTrait,
{
    let (start, end) = month_bounds(now);
    get_category_analytics(db, start, end).await
}

/// The most recent `limit` payments, newest first.
pub async fn get_payment_history<C>(db: &C, limit: u64) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .order_by_desc(payment::Column::PaidAt)
        .order_by_desc(payment::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of the monthly-equivalent cost of every active subscription, per currency.
pub async fn get_monthly_recurring_cost<C>(db: &C) -> Result<BTreeMap<Currency, Money>>
where
    C: ConnectionTrait,
{
    let subscriptions = crate::core::subscription::get_all_active(db).await?;

    let mut totals = BTreeMap::new();
    for sub in &subscriptions {
        *totals.entry(sub.currency).or_insert(Money::ZERO) += sub.monthly_equivalent();
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::subscription::{delete_subscription, mark_as_paid};
    use crate::test_utils::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_month_bounds() {
        let at = Utc.with_ymd_and_hms(2024, 2, 14, 15, 30, 0).unwrap();
        let (start, end) = month_bounds(at);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap());

        let (start, end) = month_bounds(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());
    }

    #[tokio::test]
    async fn test_monthly_recurring_cost_groups_by_currency() -> Result<()> {
        let db = setup_test_db().await?;
        let next = Utc::now();
        create_custom_subscription(&db, "Cloud", 3000, 30, next, Category::Work).await?;
        create_custom_subscription(&db, "Music", 1000, 7, next, Category::Entertainment).await?;
        let mut rub = subscription_request("Cinema", 29_900, 30);
        rub.currency = Currency::Rub;
        crate::core::subscription::create_subscription(&db, rub, next).await?;
        let gone = create_custom_subscription(&db, "Gone", 5000, 30, next, Category::Other).await?;
        delete_subscription(&db, gone.id, next).await?;

        let totals = get_monthly_recurring_cost(&db).await?;

        assert_eq!(totals.len(), 2);
        // 3044 + 4348, the deleted subscription is ignored
        assert_eq!(totals[&Currency::Usd], Money::from_minor(7392));
        // 29900 * 3044 / 3000 = 30338.53
        assert_eq!(totals[&Currency::Rub], Money::from_minor(30338));
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_amounts_saturate_instead_of_panicking() -> Result<()> {
        let db = setup_test_db().await?;
        let at = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let first = insert_subscription(&db, "Yacht", i64::MAX, 1).await?;
        let second = insert_subscription(&db, "Island", i64::MAX, 1).await?;
        insert_payment(&db, first.id, i64::MAX, PaymentStatus::Completed, at).await?;
        insert_payment(&db, second.id, i64::MAX, PaymentStatus::Completed, at).await?;

        let totals = get_monthly_recurring_cost(&db).await?;
        assert_eq!(totals[&Currency::Usd], Money::from_minor(i64::MAX));

        let summaries = get_monthly_expense(&db, at).await?;
        assert_eq!(summaries[0].total, Money::from_minor(i64::MAX));
        assert_eq!(summaries[0].count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_category_analytics_inclusive_range() -> Result<()> {
        let db = setup_test_db().await?;
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 59).unwrap();

        let work = create_custom_subscription(&db, "IDE", 1000, 30, start, Category::Work).await?;
        let fun = create_custom_subscription(&db, "Games", 500, 30, start, Category::Entertainment).await?;

        mark_as_paid(&db, work.id, start).await?;
        mark_as_paid(&db, work.id, end).await?;
        mark_as_paid(&db, fun.id, Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap()).await?;
        // Outside of the range
        mark_as_paid(&db, fun.id, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()).await?;

        // History survives deletion
        delete_subscription(&db, fun.id, end).await?;

        let analytics = get_category_analytics(&db, start, end).await?;
        assert_eq!(analytics.len(), 2);
        assert_eq!(
            analytics[&Category::Work],
            vec![PaymentSummary {
                currency: Currency::Usd,
                total: Money::from_minor(2000),
                count: 2,
            }]
        );
        assert_eq!(
            analytics[&Category::Entertainment],
            vec![PaymentSummary {
                currency: Currency::Usd,
                total: Money::from_minor(500),
                count: 1,
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_expense_only_counts_completed_payments() -> Result<()> {
        let db = setup_test_db().await?;
        let at = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let sub = create_custom_subscription(&db, "IDE", 1000, 30, at, Category::Work).await?;
        mark_as_paid(&db, sub.id, at).await?;
        insert_payment(&db, sub.id, 777, PaymentStatus::Failed, at).await?;
        insert_payment(&db, sub.id, 555, PaymentStatus::Pending, at).await?;

        let summaries = get_monthly_expense(&db, at).await?;
        assert_eq!(
            summaries,
            vec![PaymentSummary {
                currency: Currency::Usd,
                total: Money::from_minor(1000),
                count: 1,
            }]
        );

        let other_month = get_monthly_expense(&db, Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap()).await?;
        assert!(other_month.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_history_newest_first_with_limit() -> Result<()> {
        let db = setup_test_db().await?;
        let sub = create_test_subscription(&db, "News").await?;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for day in 0..3 {
            mark_as_paid(&db, sub.id, base + TimeDelta::days(day)).await?;
        }

        let history = get_payment_history(&db, 2).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].paid_at, base + TimeDelta::days(2));
        assert_eq!(history[1].paid_at, base + TimeDelta::days(1));
        Ok(())
    }
}
