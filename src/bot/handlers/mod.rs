//! Discord interaction handlers
//!
//! This module turns gateway events (button presses, plain messages) into
//! conversation events and renders the replies as Discord components.

/// Keyboard and message rendering within Discord limits
pub mod components;
/// Component interaction and message events
pub mod events;
