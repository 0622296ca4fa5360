//! Text rendering for every screen the bot shows.
//!
//! Functions here are pure: they take already-loaded data and return the
//! message body. Currency symbols are applied only at this layer; [`Money`]
//! itself always formats as a bare number.

use crate::{
    core::{
        analytics::PaymentSummary,
        menu::{Page, category_label, currency_label, period_label, yes_no_label},
        money::Money,
        subscription::PaidSubscription,
    },
    entities::{Category, Currency, PaymentStatus, payment, subscription},
};
use sea_orm::prelude::DateTimeUtc;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Symbol appended to amounts in this currency.
#[must_use]
pub const fn currency_symbol(currency: Currency) -> &'static str {
    match currency {
        Currency::Usd => "$",
        Currency::Rub => "₽",
    }
}

/// `15.99$`, `299.00₽`
#[must_use]
pub fn format_amount(amount: Money, currency: Currency) -> String {
    format!("{amount}{}", currency_symbol(currency))
}

/// `dd.mm.yyyy`
#[must_use]
pub fn format_date(at: DateTimeUtc) -> String {
    at.format("%d.%m.%Y").to_string()
}

/// `dd.mm.yyyy hh:mm`
#[must_use]
pub fn format_date_time(at: DateTimeUtc) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

const fn status_icon(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Completed => "✅",
        PaymentStatus::Pending => "⏳",
        PaymentStatus::Failed => "❌",
    }
}

/// Greeting shown with the main menu.
#[must_use]
pub fn welcome_text() -> String {
    "👋 **Subscription tracker**\n\n\
     Keep track of recurring payments, mark them as paid and see where the money goes.\n\n\
     Choose an action:"
        .to_string()
}

/// One page of active subscriptions with their next payment date; due ones are flagged.
#[must_use]
pub fn subscriptions_text(subscriptions: &[subscription::Model], page: Page, now: DateTimeUtc) -> String {
    let mut text = String::from("📋 **My subscriptions**");
    if page.count > 1 {
        let _ = write!(text, " (page {}/{})", page.index + 1, page.count);
    }
    text.push_str("\n\n");
    if subscriptions.is_empty() {
        text.push_str("You have no active subscriptions yet.");
        return text;
    }

    for sub in subscriptions {
        let due = if sub.is_payment_due(now) { " ⚠️" } else { "" };
        let _ = writeln!(
            text,
            "• **{}** - {}{due}\n  📅 Next payment: {}\n",
            sub.name,
            format_amount(sub.cost, sub.currency),
            format_date(sub.next_payment),
        );
    }
    text
}

/// Confirmation for a freshly created subscription, echoing every field.
#[must_use]
pub fn created_text(sub: &subscription::Model) -> String {
    format!(
        "✅ **Subscription added!**\n\n\
         🆔 ID: {}\n\
         📝 Name: {}\n\
         💰 Cost: {}\n\
         💱 Currency: {}\n\
         🗓️ Period: {}\n\
         🏷️ Category: {}\n\
         🔄 Auto-renewal: {}\n\
         📅 Next payment: {}",
        sub.id,
        sub.name,
        format_amount(sub.cost, sub.currency),
        currency_label(sub.currency),
        period_label(sub.period_days),
        category_label(sub.category),
        yes_no_label(sub.auto_renewal),
        format_date(sub.next_payment),
    )
}

/// Confirmation after a payment was recorded.
#[must_use]
pub fn paid_text(paid: &PaidSubscription) -> String {
    format!(
        "✅ **Payment recorded!**\n\n\
         📝 Subscription: {}\n\
         💰 Amount: {}\n\
         📅 Next payment: {}",
        paid.subscription.name,
        format_amount(paid.payment.amount, paid.payment.currency),
        format_date(paid.subscription.next_payment),
    )
}

/// Confirmation after a soft delete.
#[must_use]
pub fn deleted_text(sub: &subscription::Model) -> String {
    format!(
        "🗑️ **Subscription deleted**\n\n📝 Name: {}\nIt was removed from your list; its payment history is kept.",
        sub.name
    )
}

fn write_summaries(text: &mut String, summaries: &[PaymentSummary], indent: &str) {
    for summary in summaries {
        let _ = writeln!(
            text,
            "{indent}{} ({} payments)",
            format_amount(summary.total, summary.currency),
            summary.count
        );
    }
}

/// Paid this month plus the monthly-equivalent of all active subscriptions.
#[must_use]
pub fn monthly_expense_text(paid: &[PaymentSummary], recurring: &BTreeMap<Currency, Money>) -> String {
    let mut text = String::from("💰 **Monthly expenses**\n\n📊 **Paid this month:**\n");
    if paid.is_empty() {
        text.push_str("No payments this month yet\n");
    } else {
        write_summaries(&mut text, paid, "• ");
    }

    text.push_str("\n🔄 **Recurring per month (all subscriptions):**\n");
    if recurring.is_empty() {
        text.push_str("No active subscriptions\n");
    } else {
        for (currency, amount) in recurring {
            let _ = writeln!(text, "• {} per month", format_amount(*amount, *currency));
        }
    }
    text
}

/// This month's completed payments per category.
#[must_use]
pub fn analytics_text(analytics: &BTreeMap<Category, Vec<PaymentSummary>>) -> String {
    let mut text = String::from("📊 **Analytics by category**\n\n");
    if analytics.is_empty() {
        text.push_str("No data for the current month");
        return text;
    }

    for (category, summaries) in analytics {
        let _ = writeln!(text, "{}", category_label(*category));
        write_summaries(&mut text, summaries, "  ");
        text.push('\n');
    }
    text
}

/// Recent payments, newest first.
#[must_use]
pub fn history_text(payments: &[payment::Model]) -> String {
    let mut text = String::from("📜 **Payment history**\n\n");
    if payments.is_empty() {
        text.push_str("No payments yet");
        return text;
    }

    for p in payments {
        let _ = writeln!(
            text,
            "{} {} - {}",
            status_icon(p.status),
            format_amount(p.amount, p.currency),
            format_date_time(p.paid_at)
        );
    }
    text
}

/// Static feature overview.
#[must_use]
pub fn settings_text() -> String {
    "⚙️ **Settings**\n\nAvailable features:\n\n\
     • Currencies: USD, RUB\n\
     • Payment due markers in the subscription list\n\
     • Analytics by category\n\
     • Full payment history"
        .to_string()
}
