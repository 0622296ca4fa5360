//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Subscription screens and the add-subscription conversation
pub mod subscription;

// Export commands
pub use general::*;
pub use subscription::*;
