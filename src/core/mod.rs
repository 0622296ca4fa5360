//! Core business logic, independent of Discord.
//!
//! Everything here takes a database connection (or nothing at all) and
//! returns plain data, so it can be driven from the bot layer and from tests
//! alike.

/// Spending aggregates over payments and subscriptions
pub mod analytics;
/// The add-subscription state machine and menu dispatch
pub mod conversation;
/// Button ids and keyboard layouts
pub mod menu;
/// Fixed-point money type
pub mod money;
/// Message text for every screen
pub mod report;
/// Per-user session table with expiry
pub mod session;
/// Subscription CRUD and payments
pub mod subscription;
