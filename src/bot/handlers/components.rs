//! Rendering of replies as Discord messages.
//!
//! Discord allows at most 5 action rows of 5 buttons, 80 characters per label
//! and 2000 characters of content. Grids that do not fit are reflowed into
//! full rows and anything beyond 25 buttons is dropped.

use crate::core::menu::{Button, Keyboard};
use poise::serenity_prelude as serenity;
use tracing::warn;

const MAX_ROWS: usize = 5;
const MAX_BUTTONS_PER_ROW: usize = 5;
const MAX_LABEL_CHARS: usize = 80;
const MAX_CONTENT_CHARS: usize = 2000;

/// Arranges the keyboard within Discord's component limits.
///
/// A keyboard that already fits keeps its layout. Otherwise its buttons are
/// packed five per row, in order, up to five rows.
#[must_use]
pub fn layout(keyboard: &Keyboard) -> Vec<Vec<&Button>> {
    let fits = keyboard.rows.len() <= MAX_ROWS
        && keyboard.rows.iter().all(|row| row.len() <= MAX_BUTTONS_PER_ROW);
    if fits {
        return keyboard
            .rows
            .iter()
            .filter(|row| !row.is_empty())
            .map(|row| row.iter().collect())
            .collect();
    }

    let buttons: Vec<&Button> = keyboard.rows.iter().flatten().collect();
    let capacity = MAX_ROWS * MAX_BUTTONS_PER_ROW;
    if buttons.len() > capacity {
        warn!(
            "Keyboard has {} buttons, only the first {capacity} are shown",
            buttons.len()
        );
    }
    buttons
        .chunks(MAX_BUTTONS_PER_ROW)
        .take(MAX_ROWS)
        .map(<[&Button]>::to_vec)
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max - 1).collect();
    shortened.push('…');
    shortened
}

/// Message content cut to Discord's length limit.
#[must_use]
pub fn content(text: &str) -> String {
    truncate_chars(text, MAX_CONTENT_CHARS)
}

fn button_style(id: &str) -> serenity::ButtonStyle {
    if id.starts_with("delete_") {
        serenity::ButtonStyle::Danger
    } else if id == "back" {
        serenity::ButtonStyle::Secondary
    } else {
        serenity::ButtonStyle::Primary
    }
}

/// Converts a keyboard into Discord action rows.
#[must_use]
pub fn action_rows(keyboard: &Keyboard) -> Vec<serenity::CreateActionRow> {
    layout(keyboard)
        .into_iter()
        .map(|row| {
            serenity::CreateActionRow::Buttons(
                row.into_iter()
                    .map(|button| {
                        serenity::CreateButton::new(button.id.clone())
                            .label(truncate_chars(&button.label, MAX_LABEL_CHARS))
                            .style(button_style(&button.id))
                    })
                    .collect(),
            )
        })
        .collect()
}
