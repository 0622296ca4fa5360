//! Shared test utilities for the subscription tracker.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        money::Money,
        subscription::{self as service, CreateSubscription},
    },
    entities::{Category, Currency, PaymentStatus, payment, subscription, subscription::Model as SubscriptionModel},
    errors::Result,
};
use chrono::{TimeDelta, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, prelude::DateTimeUtc};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a create request with sensible defaults.
///
/// # Defaults
/// * `currency`: USD
/// * `category`: entertainment
/// * `auto_renewal`: true
/// * `next_payment`: 30 days from now
#[must_use]
pub fn subscription_request(name: &str, cost: i64, period_days: i32) -> CreateSubscription {
    CreateSubscription {
        name: name.to_string(),
        cost: Money::from_minor(cost),
        currency: Currency::Usd,
        period_days,
        next_payment: Utc::now() + TimeDelta::days(30),
        category: Category::Entertainment,
        auto_renewal: true,
    }
}

/// Creates a monthly USD subscription costing 15.99.
pub async fn create_test_subscription(db: &DatabaseConnection, name: &str) -> Result<SubscriptionModel> {
    service::create_subscription(db, subscription_request(name, 1599, 30), Utc::now()).await
}

/// Creates a USD subscription with custom cost, period, due date and category.
pub async fn create_custom_subscription(
    db: &DatabaseConnection,
    name: &str,
    cost: i64,
    period_days: i32,
    next_payment: DateTimeUtc,
    category: Category,
) -> Result<SubscriptionModel> {
    let request = CreateSubscription {
        next_payment,
        category,
        ..subscription_request(name, cost, period_days)
    };
    service::create_subscription(db, request, Utc::now()).await
}

/// Inserts an active USD subscription row directly, bypassing validation.
/// Use this for rows the service would refuse, such as oversized costs.
pub async fn insert_subscription(
    db: &DatabaseConnection,
    name: &str,
    cost: i64,
    period_days: i32,
) -> Result<SubscriptionModel> {
    let now = Utc::now();
    let model = subscription::ActiveModel {
        name: Set(name.to_string()),
        cost: Set(Money::from_minor(cost)),
        currency: Set(Currency::Usd),
        period_days: Set(period_days),
        next_payment: Set(now + TimeDelta::days(30)),
        category: Set(Category::Other),
        auto_renewal: Set(true),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Inserts a payment row directly, bypassing `mark_as_paid`.
/// Use this for statuses the service never writes (pending, failed).
pub async fn insert_payment(
    db: &DatabaseConnection,
    subscription_id: i64,
    amount: i64,
    status: PaymentStatus,
    paid_at: DateTimeUtc,
) -> Result<payment::Model> {
    let model = payment::ActiveModel {
        subscription_id: Set(subscription_id),
        amount: Set(Money::from_minor(amount)),
        currency: Set(Currency::Usd),
        paid_at: Set(paid_at),
        status: Set(status),
        created_at: Set(paid_at),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}
