//! Conversation state machine.
//!
//! Adding a subscription is a linear form: category, currency, period (with an
//! optional custom-days detour), auto-renewal, name and cost. Each [`Step`]
//! variant carries exactly the answers collected before it, so a later step can
//! never see a missing field.
//!
//! [`ConversationEngine::handle`] is the single entry point for the transport.
//! It never fails: every error becomes a reply that explains the problem and
//! repeats the current prompt, and the user's step only changes once the
//! corresponding database call has succeeded.

use crate::{
    config::settings::Settings,
    core::{
        analytics,
        menu::{self, Action, Keyboard, Page, category_label, currency_label, period_label},
        money::Money,
        report,
        session::SessionStore,
        subscription::{self, CreateSubscription, MAX_COST, MAX_PERIOD_DAYS},
    },
    entities::{Category, Currency, subscription::add_calendar_days},
    errors::{Error, Result},
};
use chrono::{TimeDelta, Utc};
use sea_orm::{ConnectionTrait, TransactionTrait, prelude::DateTimeUtc};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const STALE_BUTTON_NOTICE: &str = "⚠️ That option isn't available right now.";
const UNKNOWN_BUTTON_NOTICE: &str = "⚠️ Unknown button.";

/// Position of a user in the add-subscription conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Step {
    /// No conversation in progress
    #[default]
    Idle,
    /// Waiting for a category button
    AwaitingCategory,
    /// Waiting for a currency button
    AwaitingCurrency {
        /// Chosen category
        category: Category,
    },
    /// Waiting for a period button
    AwaitingPeriod {
        /// Chosen category
        category: Category,
        /// Chosen currency
        currency: Currency,
    },
    /// Waiting for the number of days as text
    AwaitingCustomPeriodDays {
        /// Chosen category
        category: Category,
        /// Chosen currency
        currency: Currency,
    },
    /// Waiting for the auto-renewal button
    AwaitingAutoRenewal {
        /// Chosen category
        category: Category,
        /// Chosen currency
        currency: Currency,
        /// Period length in days
        period_days: i32,
    },
    /// Waiting for the name as text
    AwaitingName {
        /// Chosen category
        category: Category,
        /// Chosen currency
        currency: Currency,
        /// Period length in days
        period_days: i32,
        /// Auto-renewal answer
        auto_renewal: bool,
    },
    /// Waiting for the cost as text; a valid cost commits the subscription
    AwaitingCost {
        /// Chosen category
        category: Category,
        /// Chosen currency
        currency: Currency,
        /// Period length in days
        period_days: i32,
        /// Auto-renewal answer
        auto_renewal: bool,
        /// Trimmed, non-empty name
        name: String,
    },
}

impl Step {
    /// Advances a button step with the chosen option, or `None` when the
    /// option does not belong to this step.
    fn choose(&self, action: Action) -> Option<Self> {
        let next = match (self, action) {
            (Self::AwaitingCategory, Action::Category(category)) => Self::AwaitingCurrency { category },
            (Self::AwaitingCurrency { category }, Action::Currency(currency)) => Self::AwaitingPeriod {
                category: *category,
                currency,
            },
            (Self::AwaitingPeriod { category, currency }, Action::Period(choice)) => match choice.days() {
                Some(period_days) => Self::AwaitingAutoRenewal {
                    category: *category,
                    currency: *currency,
                    period_days,
                },
                None => Self::AwaitingCustomPeriodDays {
                    category: *category,
                    currency: *currency,
                },
            },
            (
                Self::AwaitingAutoRenewal {
                    category,
                    currency,
                    period_days,
                },
                Action::AutoRenewal(auto_renewal),
            ) => Self::AwaitingName {
                category: *category,
                currency: *currency,
                period_days: *period_days,
                auto_renewal,
            },
            _ => return None,
        };
        Some(next)
    }

    /// True for steps answered by typing rather than pressing a button.
    #[must_use]
    pub const fn expects_text(&self) -> bool {
        matches!(
            self,
            Self::AwaitingCustomPeriodDays { .. } | Self::AwaitingName { .. } | Self::AwaitingCost { .. }
        )
    }

    /// Question and buttons shown while in this step.
    fn prompt(&self) -> Screen {
        match self {
            Self::Idle => Screen::main_menu(),
            Self::AwaitingCategory => Screen::new(
                "📝 **New subscription**\n\nChoose a category:",
                menu::category_keyboard(),
            ),
            Self::AwaitingCurrency { category } => Screen::new(
                format!("🏷️ Category: {}\n\nChoose the currency:", category_label(*category)),
                menu::currency_keyboard(),
            ),
            Self::AwaitingPeriod { currency, .. } => Screen::new(
                format!("💱 Currency: {}\n\nHow often is it billed?", currency_label(*currency)),
                menu::period_keyboard(),
            ),
            Self::AwaitingCustomPeriodDays { .. } => Screen::new(
                "⚡ Enter the billing period in days, for example `14`:",
                menu::back_keyboard(),
            ),
            Self::AwaitingAutoRenewal { period_days, .. } => Screen::new(
                format!(
                    "🗓️ Period: {}\n\nDoes the subscription renew automatically?",
                    period_label(*period_days)
                ),
                menu::auto_renewal_keyboard(),
            ),
            Self::AwaitingName { .. } => Screen::new("📝 Enter the subscription name:", menu::back_keyboard()),
            Self::AwaitingCost { currency, name, .. } => Screen::new(
                format!(
                    "💰 Enter the cost of **{name}** per period in {}, for example `9.99`:",
                    currency_label(*currency)
                ),
                menu::back_keyboard(),
            ),
        }
    }
}

/// What arrived from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A command typed by the user (`/add`, `/subscriptions`, ...)
    Command(Action),
    /// A button press, carrying the raw button id
    Button(String),
    /// A plain text message
    Text(String),
}

impl Event {
    /// Button presses update the message that carried the button; everything
    /// else gets a new message.
    #[must_use]
    pub const fn delivery(&self) -> Delivery {
        match self {
            Self::Button(_) => Delivery::Edit,
            Self::Command(_) | Self::Text(_) => Delivery::Send,
        }
    }
}

/// How a reply should reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Post a new message
    Send,
    /// Replace the message the user interacted with
    Edit,
}

/// Outgoing message description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message body (Discord markdown)
    pub text: String,
    /// Buttons under the message
    pub keyboard: Keyboard,
    /// Send or edit
    pub delivery: Delivery,
}

/// A message body with its buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Screen {
    text: String,
    keyboard: Keyboard,
}

impl Screen {
    fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    fn main_menu() -> Self {
        Self::new(report::welcome_text(), menu::main_menu())
    }

    fn with_notice(self, notice: &str) -> Self {
        Self {
            text: format!("{notice}\n\n{}", self.text),
            keyboard: self.keyboard,
        }
    }
}

/// Drives every user's conversation.
#[derive(Debug)]
pub struct ConversationEngine {
    sessions: SessionStore,
    persistence_timeout: Duration,
    history_limit: u64,
}

impl ConversationEngine {
    /// Creates an engine with the given session TTL, database call bound and
    /// history size.
    #[must_use]
    pub fn new(session_ttl: TimeDelta, persistence_timeout: Duration, history_limit: u64) -> Self {
        Self {
            sessions: SessionStore::new(session_ttl),
            persistence_timeout,
            history_limit,
        }
    }

    /// Creates an engine configured from [`Settings`].
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            TimeDelta::minutes(settings.session_ttl_minutes),
            Duration::from_secs(settings.persistence_timeout_secs),
            settings.history_limit,
        )
    }

    /// The session table, for expiry sweeps.
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// True if `user_id` is in the middle of a step answered by text.
    pub async fn expects_text(&self, user_id: u64) -> bool {
        match self.sessions.get(user_id) {
            Some(session) => session.lock().await.step.expects_text(),
            None => false,
        }
    }

    /// Handles one event of `user_id` at the current time.
    pub async fn handle<C>(&self, db: &C, user_id: u64, event: Event) -> Reply
    where
        C: ConnectionTrait + TransactionTrait,
    {
        self.handle_at(db, user_id, event, Utc::now()).await
    }

    /// Handles one event of `user_id` as if it happened at `now`.
    #[instrument(skip(self, db, event))]
    pub async fn handle_at<C>(&self, db: &C, user_id: u64, event: Event, now: DateTimeUtc) -> Reply
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let delivery = event.delivery();
        let session = self.sessions.get_or_create(user_id, now);
        let mut session = session.lock().await;
        session.last_seen = now;

        let screen = match self.dispatch(db, &session.step, event, now).await {
            Ok((next, screen)) => {
                if next != session.step {
                    debug!("Step {:?} -> {:?}", session.step, next);
                    session.step = next;
                }
                screen
            }
            Err(e) => {
                let message = if e.is_user_error() {
                    format!("❌ {e}")
                } else {
                    error!("Request of user {user_id} failed: {e}");
                    format!("❌ Could not complete the request: {e}")
                };
                session.step.prompt().with_notice(&message)
            }
        };

        Reply {
            text: screen.text,
            keyboard: screen.keyboard,
            delivery,
        }
    }

    async fn dispatch<C>(&self, db: &C, step: &Step, event: Event, now: DateTimeUtc) -> Result<(Step, Screen)>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        match event {
            Event::Command(action) => self.on_action(db, step, action, now).await,
            Event::Button(id) => match Action::from_id(&id) {
                Some(action) => self.on_action(db, step, action, now).await,
                None => {
                    warn!("Ignoring unknown button id '{id}'");
                    Ok((step.clone(), step.prompt().with_notice(UNKNOWN_BUTTON_NOTICE)))
                }
            },
            Event::Text(text) => self.on_text(db, step, &text, now).await,
        }
    }

    async fn on_action<C>(&self, db: &C, step: &Step, action: Action, now: DateTimeUtc) -> Result<(Step, Screen)>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let screen = match action {
            Action::AddSubscription => return Ok((Step::AwaitingCategory, Step::AwaitingCategory.prompt())),
            Action::Back => return Ok((Step::Idle, Screen::main_menu())),
            Action::Category(_) | Action::Currency(_) | Action::Period(_) | Action::AutoRenewal(_) => {
                return Ok(match step.choose(action) {
                    Some(next) => {
                        let screen = next.prompt();
                        (next, screen)
                    }
                    None => {
                        debug!("Stale button {action} at step {step:?}");
                        (step.clone(), step.prompt().with_notice(STALE_BUTTON_NOTICE))
                    }
                });
            }
            Action::MainMenu => Screen::main_menu(),
            Action::MySubscriptions => self.my_subscriptions(db, 0, now).await?,
            Action::SubscriptionsPage(page) => self.my_subscriptions(db, page, now).await?,
            Action::MonthlyExpense => self.monthly_expense(db, now).await?,
            Action::Analytics => {
                let analytics = self
                    .bounded(analytics::get_current_month_category_analytics(db, now))
                    .await?;
                Screen::new(report::analytics_text(&analytics), menu::back_keyboard())
            }
            Action::History => {
                let payments = self
                    .bounded(analytics::get_payment_history(db, self.history_limit))
                    .await?;
                Screen::new(report::history_text(&payments), menu::back_keyboard())
            }
            Action::Settings => Screen::new(report::settings_text(), menu::back_keyboard()),
            Action::Pay(id) => {
                let paid = self.bounded(subscription::mark_as_paid(db, id, now)).await?;
                Screen::new(report::paid_text(&paid), menu::after_action_keyboard())
            }
            Action::Delete(id) => {
                let deleted = self
                    .bounded(subscription::delete_subscription(db, id, now))
                    .await?;
                Screen::new(report::deleted_text(&deleted), menu::after_action_keyboard())
            }
        };
        Ok((step.clone(), screen))
    }

    async fn on_text<C>(&self, db: &C, step: &Step, text: &str, now: DateTimeUtc) -> Result<(Step, Screen)>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let next = match step {
            Step::Idle => return Ok((Step::Idle, Screen::main_menu())),
            Step::AwaitingCustomPeriodDays { category, currency } => Step::AwaitingAutoRenewal {
                category: *category,
                currency: *currency,
                period_days: parse_period_days(text, now)?,
            },
            Step::AwaitingName {
                category,
                currency,
                period_days,
                auto_renewal,
            } => {
                let name = text.trim();
                if name.is_empty() {
                    return Err(Error::validation("The name cannot be empty"));
                }
                Step::AwaitingCost {
                    category: *category,
                    currency: *currency,
                    period_days: *period_days,
                    auto_renewal: *auto_renewal,
                    name: name.to_string(),
                }
            }
            Step::AwaitingCost {
                category,
                currency,
                period_days,
                auto_renewal,
                name,
            } => {
                let cost = Money::parse(text)?;
                if !cost.is_positive() {
                    return Err(Error::validation("The cost must be greater than zero"));
                }
                if cost > MAX_COST {
                    return Err(Error::validation(format!("The cost cannot exceed {MAX_COST}")));
                }
                let request = CreateSubscription {
                    name: name.clone(),
                    cost,
                    currency: *currency,
                    period_days: *period_days,
                    next_payment: add_calendar_days(now, *period_days)?,
                    category: *category,
                    auto_renewal: *auto_renewal,
                };
                let created = self
                    .bounded(subscription::create_subscription(db, request, now))
                    .await?;
                let screen = Screen::new(report::created_text(&created), menu::main_menu());
                return Ok((Step::Idle, screen));
            }
            // Button steps: repeat the question
            Step::AwaitingCategory
            | Step::AwaitingCurrency { .. }
            | Step::AwaitingPeriod { .. }
            | Step::AwaitingAutoRenewal { .. } => return Ok((step.clone(), step.prompt())),
        };
        let screen = next.prompt();
        Ok((next, screen))
    }

    async fn my_subscriptions<C>(&self, db: &C, page: usize, now: DateTimeUtc) -> Result<Screen>
    where
        C: ConnectionTrait,
    {
        let subscriptions = self.bounded(subscription::get_all_active(db)).await?;
        let page = Page::new(subscriptions.len(), page);
        let shown = &subscriptions[page.range()];
        let keyboard = if subscriptions.is_empty() {
            menu::empty_list_keyboard()
        } else {
            menu::subscriptions_keyboard(shown, page)
        };
        Ok(Screen::new(report::subscriptions_text(shown, page, now), keyboard))
    }

    async fn monthly_expense<C>(&self, db: &C, now: DateTimeUtc) -> Result<Screen>
    where
        C: ConnectionTrait,
    {
        let paid = self
            .bounded(analytics::get_current_month_expense(db, now))
            .await?;
        let recurring = self.bounded(analytics::get_monthly_recurring_cost(db)).await?;
        Ok(Screen::new(
            report::monthly_expense_text(&paid, &recurring),
            menu::back_keyboard(),
        ))
    }

    /// Runs a database call with the configured upper bound.
    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.persistence_timeout, call)
            .await
            .map_err(|_| Error::Timeout {
                seconds: self.persistence_timeout.as_secs(),
            })?
    }
}

/// Parses a custom period: a whole number of days greater than zero.
/// Custom period in days; the first payment date it implies must be representable.
fn parse_period_days(text: &str, now: DateTimeUtc) -> Result<i32> {
    let days = match text.trim().parse::<i32>() {
        Ok(days) if days > 0 => days,
        _ => {
            return Err(Error::validation(
                "The period must be a whole number of days greater than zero",
            ));
        }
    };
    if days > MAX_PERIOD_DAYS {
        return Err(Error::validation(format!(
            "The period cannot be longer than {MAX_PERIOD_DAYS} days"
        )));
    }
    add_calendar_days(now, days)?;
    Ok(days)
}
