//! Subscription business logic - creation, lookup, payment and soft deletion.
//!
//! All functions are async, take a connection generic over `ConnectionTrait`
//! where they may run inside a transaction, and return [`Result`]. Validation
//! happens here, before anything reaches the database.

use crate::{
    core::money::Money,
    entities::{
        Category, Currency, Payment, PaymentStatus, Subscription, payment, subscription,
    },
    errors::{Error, Result},
};
use chrono::TimeDelta;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Largest accepted cost per period: one billion major units.
pub const MAX_COST: Money = Money::from_minor(100_000_000_000);

/// Longest accepted billing period: one hundred years.
pub const MAX_PERIOD_DAYS: i32 = 36_500;

/// Everything needed to create a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscription {
    /// Display name
    pub name: String,
    /// Cost per period
    pub cost: Money,
    /// Billing currency
    pub currency: Currency,
    /// Period length in days
    pub period_days: i32,
    /// First payment date
    pub next_payment: DateTimeUtc,
    /// Spending category
    pub category: Category,
    /// Auto-renewal flag
    pub auto_renewal: bool,
}

impl CreateSubscription {
    /// Checks the invariants every stored subscription must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Subscription name is required"));
        }
        if !self.cost.is_positive() {
            return Err(Error::validation("Subscription cost must be positive"));
        }
        if self.cost > MAX_COST {
            return Err(Error::validation(format!("Subscription cost cannot exceed {MAX_COST}")));
        }
        if self.period_days <= 0 {
            return Err(Error::validation("Subscription period must be positive"));
        }
        if self.period_days > MAX_PERIOD_DAYS {
            return Err(Error::validation(format!(
                "Subscription period cannot exceed {MAX_PERIOD_DAYS} days"
            )));
        }
        Ok(())
    }
}

/// Result of marking a subscription as paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidSubscription {
    /// The payment that was recorded
    pub payment: payment::Model,
    /// The subscription with its next payment date advanced
    pub subscription: subscription::Model,
}

/// Validates and stores a new, active subscription.
#[instrument(skip(db, request), fields(name = %request.name))]
pub async fn create_subscription<C>(
    db: &C,
    request: CreateSubscription,
    now: DateTimeUtc,
) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    request.validate()?;

    let model = subscription::ActiveModel {
        name: Set(request.name.trim().to_string()),
        cost: Set(request.cost),
        currency: Set(request.currency),
        period_days: Set(request.period_days),
        next_payment: Set(request.next_payment),
        category: Set(request.category),
        auto_renewal: Set(request.auto_renewal),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!("Created subscription #{} '{}'", created.id, created.name);
    Ok(created)
}

/// Retrieves all active subscriptions, soonest payment first.
pub async fn get_all_active<C>(db: &C) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .filter(subscription::Column::Active.eq(true))
        .order_by_asc(subscription::Column::NextPayment)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a subscription by id, including soft-deleted ones.
pub async fn get_subscription_by_id<C>(db: &C, id: i64) -> Result<Option<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Finds an active subscription by id or fails with [`Error::SubscriptionNotFound`].
pub async fn get_active_subscription<C>(db: &C, id: i64) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    get_subscription_by_id(db, id)
        .await?
        .filter(|s| s.active)
        .ok_or(Error::SubscriptionNotFound { id })
}

/// Soft-deletes a subscription by clearing its `active` flag.
///
/// The row and its payments stay in the database. Deleting an already
/// inactive subscription is a no-op.
#[instrument(skip(db))]
pub async fn delete_subscription<C>(
    db: &C,
    id: i64,
    now: DateTimeUtc,
) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    let existing = get_subscription_by_id(db, id)
        .await?
        .ok_or(Error::SubscriptionNotFound { id })?;

    if !existing.active {
        debug!("Subscription #{id} already inactive");
        return Ok(existing);
    }

    let mut active_model: subscription::ActiveModel = existing.into();
    active_model.active = Set(false);
    active_model.updated_at = Set(now);
    let updated = active_model.update(db).await?;
    info!("Soft-deleted subscription #{id}");
    Ok(updated)
}

/// Records a completed payment and advances the next payment date.
///
/// Both writes happen in one database transaction: either the payment exists
/// and `next_payment` moved forward by one period, or neither happened.
#[instrument(skip(db))]
pub async fn mark_as_paid<C>(db: &C, id: i64, now: DateTimeUtc) -> Result<PaidSubscription>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;

    let mut subscription = get_active_subscription(&txn, id).await?;

    let payment = payment::ActiveModel {
        subscription_id: Set(subscription.id),
        amount: Set(subscription.cost),
        currency: Set(subscription.currency),
        paid_at: Set(now),
        status: Set(PaymentStatus::Completed),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    subscription.advance_next_payment(now)?;
    let mut active_model: subscription::ActiveModel = subscription.clone().into();
    active_model.next_payment = Set(subscription.next_payment);
    active_model.updated_at = Set(subscription.updated_at);
    let subscription = active_model.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Recorded payment #{} of {} for subscription #{}",
        payment.id, payment.amount, subscription.id
    );
    Ok(PaidSubscription {
        payment,
        subscription,
    })
}

/// Active subscriptions whose payment date is at or before `now`.
pub async fn get_due_payments<C>(db: &C, now: DateTimeUtc) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .filter(subscription::Column::Active.eq(true))
        .filter(subscription::Column::NextPayment.lte(now))
        .order_by_asc(subscription::Column::NextPayment)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active subscriptions in one category, most expensive first.
pub async fn get_subscriptions_by_category<C>(
    db: &C,
    category: Category,
) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .filter(subscription::Column::Category.eq(category))
        .filter(subscription::Column::Active.eq(true))
        .order_by_desc(subscription::Column::Cost)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active subscriptions with a payment due within the next `days` days.
pub async fn get_upcoming_payments<C>(
    db: &C,
    now: DateTimeUtc,
    days: i64,
) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    let cutoff = TimeDelta::try_days(days)
        .and_then(|window| now.checked_add_signed(window))
        .ok_or_else(|| Error::validation(format!("Look-ahead of {days} days is out of range")))?;
    Subscription::find()
        .filter(subscription::Column::Active.eq(true))
        .filter(subscription::Column::NextPayment.lt(cutoff))
        .order_by_asc(subscription::Column::NextPayment)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All payments of a subscription, newest first. Works for soft-deleted subscriptions.
pub async fn get_payments_for_subscription<C>(
    db: &C,
    subscription_id: i64,
) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .filter(payment::Column::SubscriptionId.eq(subscription_id))
        .order_by_desc(payment::Column::PaidAt)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::{TimeZone, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_subscription_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let now = Utc::now();

        let mut request = subscription_request("Netflix", 1599, 30);
        request.name = "   ".to_string();
        let result = create_subscription(&db, request, now).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_subscription(&db, subscription_request("Netflix", 0, 30), now).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_subscription(&db, subscription_request("Netflix", -500, 30), now).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_subscription(&db, subscription_request("Netflix", 1599, 0), now).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let too_expensive = MAX_COST.minor_units() + 1;
        let result = create_subscription(&db, subscription_request("Netflix", too_expensive, 30), now).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_subscription(&db, subscription_request("Netflix", 1599, MAX_PERIOD_DAYS + 1), now).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_subscription_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

        let mut request = subscription_request("  Netflix ", 1599, 30);
        request.next_payment = now + TimeDelta::days(30);
        let created = create_subscription(&db, request, now).await?;

        assert_eq!(created.name, "Netflix");
        assert_eq!(created.cost, Money::from_minor(1599));
        assert_eq!(created.period_days, 30);
        assert!(created.active);
        assert_eq!(created.created_at, now);

        let stored = get_subscription_by_id(&db, created.id).await?.unwrap();
        assert_eq!(stored, created);
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_as_paid_records_payment_and_advances_date() -> Result<()> {
        let db = setup_test_db().await?;
        let due = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let sub = create_custom_subscription(&db, "Gym", 1000, 30, due, Category::Home).await?;

        let paid_at = Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap();
        let paid = mark_as_paid(&db, sub.id, paid_at).await?;

        assert_eq!(paid.payment.amount, Money::from_minor(1000));
        assert_eq!(paid.payment.currency, Currency::Usd);
        assert_eq!(paid.payment.status, PaymentStatus::Completed);
        assert_eq!(paid.payment.paid_at, paid_at);
        assert_eq!(paid.subscription.next_payment, due + TimeDelta::days(30));
        assert_eq!(paid.subscription.updated_at, paid_at);

        let stored = get_subscription_by_id(&db, sub.id).await?.unwrap();
        assert_eq!(stored.next_payment, due + TimeDelta::days(30));

        let payments = get_payments_for_subscription(&db, sub.id).await?;
        assert_eq!(payments, vec![paid.payment]);
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_amount_is_a_snapshot() -> Result<()> {
        let db = setup_test_db().await?;
        let sub = create_test_subscription(&db, "Spotify").await?;
        let paid = mark_as_paid(&db, sub.id, Utc::now()).await?;

        // Raise the price afterwards; the recorded payment must not change
        let mut active_model: subscription::ActiveModel = paid.subscription.into();
        active_model.cost = Set(Money::from_minor(99_999));
        active_model.update(&db).await?;

        let payments = get_payments_for_subscription(&db, sub.id).await?;
        assert_eq!(payments[0].amount, sub.cost);
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_as_paid_unknown_or_deleted_subscription() -> Result<()> {
        let db = setup_test_db().await?;

        let result = mark_as_paid(&db, 999, Utc::now()).await;
        assert!(matches!(result, Err(Error::SubscriptionNotFound { id: 999 })));

        let sub = create_test_subscription(&db, "Old").await?;
        delete_subscription(&db, sub.id, Utc::now()).await?;
        let result = mark_as_paid(&db, sub.id, Utc::now()).await;
        assert!(matches!(result, Err(Error::SubscriptionNotFound { .. })));

        // Nothing was written for the failed attempts
        assert!(get_payments_for_subscription(&db, sub.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_delete_hides_subscription_but_keeps_history() -> Result<()> {
        let db = setup_test_db().await?;
        let keep = create_test_subscription(&db, "Keep").await?;
        let drop = create_test_subscription(&db, "Drop").await?;
        let paid = mark_as_paid(&db, drop.id, Utc::now()).await?;

        let deleted = delete_subscription(&db, drop.id, Utc::now()).await?;
        assert!(!deleted.active);

        let active = get_all_active(&db).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);

        // Row still exists and so do its payments
        assert!(get_subscription_by_id(&db, drop.id).await?.is_some());
        assert_eq!(get_payments_for_subscription(&db, drop.id).await?, vec![paid.payment]);

        // Deleting twice is harmless, deleting an unknown id is not
        delete_subscription(&db, drop.id, Utc::now()).await?;
        let result = delete_subscription(&db, 12345, Utc::now()).await;
        assert!(matches!(result, Err(Error::SubscriptionNotFound { id: 12345 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_active_ordered_by_next_payment() -> Result<()> {
        let db = setup_test_db().await?;
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        create_custom_subscription(&db, "Later", 500, 30, base + TimeDelta::days(10), Category::Work).await?;
        create_custom_subscription(&db, "Sooner", 500, 30, base, Category::Work).await?;

        let names: Vec<String> = get_all_active(&db).await?.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Sooner", "Later"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_due_upcoming_and_category_queries() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        let overdue =
            create_custom_subscription(&db, "Overdue", 300, 30, now - TimeDelta::days(2), Category::Work).await?;
        let soon =
            create_custom_subscription(&db, "Soon", 900, 30, now + TimeDelta::days(3), Category::Work).await?;
        create_custom_subscription(&db, "Far", 100, 365, now + TimeDelta::days(200), Category::Education).await?;

        let due = get_due_payments(&db, now).await?;
        assert_eq!(due.iter().map(|s| s.id).collect::<Vec<_>>(), vec![overdue.id]);

        let upcoming = get_upcoming_payments(&db, now, 7).await?;
        assert_eq!(upcoming.iter().map(|s| s.id).collect::<Vec<_>>(), vec![overdue.id, soon.id]);

        let work = get_subscriptions_by_category(&db, Category::Work).await?;
        assert_eq!(work.iter().map(|s| s.id).collect::<Vec<_>>(), vec![soon.id, overdue.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_upcoming_payments_rejects_huge_window() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        let result = get_upcoming_payments(&db, now, i64::MAX).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        let result = get_upcoming_payments(&db, now, 400_000_000).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }
}
