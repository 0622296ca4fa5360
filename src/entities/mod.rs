//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod payment;
pub mod subscription;
pub mod types;

// Re-export specific types to avoid conflicts
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use subscription::{
    Column as SubscriptionColumn, Entity as Subscription, Model as SubscriptionModel,
};
pub use types::{Category, Currency, PaymentStatus};
