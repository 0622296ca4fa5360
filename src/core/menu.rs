//! Button vocabulary and keyboard layouts.
//!
//! Every button the bot can show has a stable string id. [`Action`] is the typed
//! form of those ids; per-subscription buttons carry the subscription id in the
//! payload (`pay_12`, `delete_12`) so a single handler serves all of them.
//! The subscription list is paged (`my_subs_2`) so every page fits in one
//! Discord message.

use crate::entities::{Category, Currency, subscription};
use std::fmt;
use std::ops::Range;

/// Subscriptions listed per page; each takes a row, the last row is navigation.
pub const SUBSCRIPTIONS_PER_PAGE: usize = 4;

/// Billing period choices offered by the period keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodChoice {
    /// 7 days
    Week,
    /// 30 days
    Month,
    /// 365 days
    Year,
    /// User types the number of days
    Custom,
}

impl PeriodChoice {
    /// Fixed length in days, `None` for [`PeriodChoice::Custom`].
    #[must_use]
    pub const fn days(self) -> Option<i32> {
        match self {
            Self::Week => Some(7),
            Self::Month => Some(30),
            Self::Year => Some(365),
            Self::Custom => None,
        }
    }
}

/// Anything the user can trigger with a button or command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Show the main menu
    MainMenu,
    /// Start the add-subscription conversation
    AddSubscription,
    /// List active subscriptions, first page
    MySubscriptions,
    /// List active subscriptions, zero-based page
    SubscriptionsPage(usize),
    /// Paid this month and recurring monthly cost
    MonthlyExpense,
    /// This month's spending per category
    Analytics,
    /// Recent payments
    History,
    /// Feature overview
    Settings,
    /// Category picked
    Category(Category),
    /// Currency picked
    Currency(Currency),
    /// Period picked
    Period(PeriodChoice),
    /// Auto-renewal answered
    AutoRenewal(bool),
    /// Abort and return to the main menu
    Back,
    /// Mark a subscription as paid
    Pay(i64),
    /// Soft-delete a subscription
    Delete(i64),
}

impl Action {
    /// Parses a button id. Returns `None` for ids the bot never issues.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        if let Some(raw) = id.strip_prefix("pay_") {
            return raw.parse().ok().map(Self::Pay);
        }
        if let Some(raw) = id.strip_prefix("delete_") {
            return raw.parse().ok().map(Self::Delete);
        }
        if let Some(raw) = id.strip_prefix("my_subs_") {
            return raw.parse().ok().map(Self::SubscriptionsPage);
        }

        let action = match id {
            "menu" => Self::MainMenu,
            "add_sub" => Self::AddSubscription,
            "my_subs" => Self::MySubscriptions,
            "monthly" => Self::MonthlyExpense,
            "analytics" => Self::Analytics,
            "history" => Self::History,
            "settings" => Self::Settings,
            "back" => Self::Back,
            "cat_entertainment" => Self::Category(Category::Entertainment),
            "cat_work" => Self::Category(Category::Work),
            "cat_education" => Self::Category(Category::Education),
            "cat_home" => Self::Category(Category::Home),
            "cat_other" => Self::Category(Category::Other),
            "curr_usd" => Self::Currency(Currency::Usd),
            "curr_rub" => Self::Currency(Currency::Rub),
            "period_week" => Self::Period(PeriodChoice::Week),
            "period_month" => Self::Period(PeriodChoice::Month),
            "period_year" => Self::Period(PeriodChoice::Year),
            "period_custom" => Self::Period(PeriodChoice::Custom),
            "auto_yes" => Self::AutoRenewal(true),
            "auto_no" => Self::AutoRenewal(false),
            _ => return None,
        };
        Some(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            Self::MainMenu => "menu",
            Self::AddSubscription => "add_sub",
            Self::MySubscriptions => "my_subs",
            Self::MonthlyExpense => "monthly",
            Self::Analytics => "analytics",
            Self::History => "history",
            Self::Settings => "settings",
            Self::Back => "back",
            Self::Category(Category::Entertainment) => "cat_entertainment",
            Self::Category(Category::Work) => "cat_work",
            Self::Category(Category::Education) => "cat_education",
            Self::Category(Category::Home) => "cat_home",
            Self::Category(Category::Other) => "cat_other",
            Self::Currency(Currency::Usd) => "curr_usd",
            Self::Currency(Currency::Rub) => "curr_rub",
            Self::Period(PeriodChoice::Week) => "period_week",
            Self::Period(PeriodChoice::Month) => "period_month",
            Self::Period(PeriodChoice::Year) => "period_year",
            Self::Period(PeriodChoice::Custom) => "period_custom",
            Self::AutoRenewal(true) => "auto_yes",
            Self::AutoRenewal(false) => "auto_no",
            Self::Pay(id) => return write!(f, "pay_{id}"),
            Self::Delete(id) => return write!(f, "delete_{id}"),
            Self::SubscriptionsPage(page) => return write!(f, "my_subs_{page}"),
        };
        f.write_str(id)
    }
}

/// One button: the id sent back when pressed and the visible label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Payload returned on press
    pub id: String,
    /// Text shown on the button
    pub label: String,
}

impl Button {
    /// A button for `action` with the given label.
    pub fn new(action: Action, label: impl Into<String>) -> Self {
        Self {
            id: action.to_string(),
            label: label.into(),
        }
    }
}

/// An ordered grid of buttons, row by row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    /// Rows from top to bottom
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// A keyboard without buttons.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    fn from_rows(rows: Vec<Vec<(Action, &str)>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|(action, label)| Button::new(action, label)).collect())
                .collect(),
        }
    }

    /// Ids of every button, in display order.
    pub fn button_ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|b| b.id.as_str())
    }

    /// True if some button has this id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.button_ids().any(|b| b == id)
    }
}

/// Label shown for a category.
#[must_use]
pub const fn category_label(category: Category) -> &'static str {
    match category {
        Category::Entertainment => "🎮 Entertainment",
        Category::Work => "💼 Work",
        Category::Education => "📚 Education",
        Category::Home => "🏠 Home",
        Category::Other => "📦 Other",
    }
}

/// Label shown for a currency.
#[must_use]
pub const fn currency_label(currency: Currency) -> &'static str {
    match currency {
        Currency::Usd => "💵 USD",
        Currency::Rub => "🔹 RUB",
    }
}

const WEEK_LABEL: &str = "🗓️ Week";
const MONTH_LABEL: &str = "📅 Month";
const YEAR_LABEL: &str = "📆 Year";
const BACK_LABEL: &str = "⬅️ Back";

/// Label for a period length, using the fixed names where they apply.
#[must_use]
pub fn period_label(period_days: i32) -> String {
    match period_days {
        7 => WEEK_LABEL.to_string(),
        30 => MONTH_LABEL.to_string(),
        365 => YEAR_LABEL.to_string(),
        days => format!("⚡ {days} days"),
    }
}

/// Label for an auto-renewal flag.
#[must_use]
pub const fn yes_no_label(value: bool) -> &'static str {
    if value { "✅ Yes" } else { "❌ No" }
}

/// Main menu.
#[must_use]
pub fn main_menu() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![
            (Action::AddSubscription, "📝 Add subscription"),
            (Action::MySubscriptions, "📋 My subscriptions"),
        ],
        vec![
            (Action::MonthlyExpense, "💰 Monthly expenses"),
            (Action::Analytics, "📊 Analytics"),
        ],
        vec![
            (Action::History, "📜 Payment history"),
            (Action::Settings, "⚙️ Settings"),
        ],
    ])
}

/// Category choice.
#[must_use]
pub fn category_keyboard() -> Keyboard {
    let choice = |c| (Action::Category(c), category_label(c));
    Keyboard::from_rows(vec![
        vec![choice(Category::Entertainment), choice(Category::Work)],
        vec![choice(Category::Education), choice(Category::Home)],
        vec![choice(Category::Other)],
        vec![(Action::Back, BACK_LABEL)],
    ])
}

/// Currency choice.
#[must_use]
pub fn currency_keyboard() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![
            (Action::Currency(Currency::Usd), currency_label(Currency::Usd)),
            (Action::Currency(Currency::Rub), currency_label(Currency::Rub)),
        ],
        vec![(Action::Back, BACK_LABEL)],
    ])
}

/// Billing period choice.
#[must_use]
pub fn period_keyboard() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![
            (Action::Period(PeriodChoice::Week), WEEK_LABEL),
            (Action::Period(PeriodChoice::Month), MONTH_LABEL),
        ],
        vec![
            (Action::Period(PeriodChoice::Year), YEAR_LABEL),
            (Action::Period(PeriodChoice::Custom), "⚡ Custom"),
        ],
        vec![(Action::Back, BACK_LABEL)],
    ])
}

/// Auto-renewal yes/no.
#[must_use]
pub fn auto_renewal_keyboard() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![
            (Action::AutoRenewal(true), yes_no_label(true)),
            (Action::AutoRenewal(false), yes_no_label(false)),
        ],
        vec![(Action::Back, BACK_LABEL)],
    ])
}

/// Just a back button, shown while waiting for typed input.
#[must_use]
pub fn back_keyboard() -> Keyboard {
    Keyboard::from_rows(vec![vec![(Action::Back, BACK_LABEL)]])
}

/// Follow-up after paying or deleting.
#[must_use]
pub fn after_action_keyboard() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![(Action::MySubscriptions, "📋 My subscriptions")],
        vec![(Action::Back, BACK_LABEL)],
    ])
}

/// Shown when there is nothing to list.
#[must_use]
pub fn empty_list_keyboard() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![(Action::AddSubscription, "📝 Add subscription")],
        vec![(Action::Back, BACK_LABEL)],
    ])
}

/// Position in a paged list. Always has at least one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Zero-based page shown
    pub index: usize,
    /// Number of pages
    pub count: usize,
    total: usize,
}

impl Page {
    /// The requested page of `total` items, clamped to the last page.
    #[must_use]
    pub fn new(total: usize, requested: usize) -> Self {
        let count = total.div_ceil(SUBSCRIPTIONS_PER_PAGE).max(1);
        Self {
            index: requested.min(count - 1),
            count,
            total,
        }
    }

    /// Indices of the items on this page.
    #[must_use]
    pub fn range(self) -> Range<usize> {
        let start = self.index * SUBSCRIPTIONS_PER_PAGE;
        start..(start + SUBSCRIPTIONS_PER_PAGE).min(self.total)
    }

    /// True unless this is the first page.
    #[must_use]
    pub const fn has_previous(self) -> bool {
        self.index > 0
    }

    /// True unless this is the last page.
    #[must_use]
    pub const fn has_next(self) -> bool {
        self.index + 1 < self.count
    }
}

/// One `[pay, delete]` row per subscription on the page, then a navigation
/// row with back between previous and next.
#[must_use]
pub fn subscriptions_keyboard(shown: &[subscription::Model], page: Page) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = shown
        .iter()
        .map(|sub| {
            vec![
                Button::new(Action::Pay(sub.id), format!("✅ Pay {}", sub.name)),
                Button::new(Action::Delete(sub.id), format!("❌ Delete {}", sub.name)),
            ]
        })
        .collect();

    let mut navigation = Vec::with_capacity(3);
    if page.has_previous() {
        navigation.push(Button::new(Action::SubscriptionsPage(page.index - 1), "◀️ Previous"));
    }
    navigation.push(Button::new(Action::Back, BACK_LABEL));
    if page.has_next() {
        navigation.push(Button::new(Action::SubscriptionsPage(page.index + 1), "▶️ Next"));
    }
    rows.push(navigation);
    Keyboard { rows }
}
