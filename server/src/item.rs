//! The todo item entity and its partial-update form.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Maximum length of an item's text, in characters.
pub const MAX_TEXT_LEN: usize = 200;

/// A single todo entry as stored and served.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: i64,
    /// Items written before display ordering existed have no `order` field.
    #[serde(default)]
    pub order: i64,
}

/// Request payload for `POST /api/todos`.
///
/// `text` is optional here so a missing field surfaces as a validation error
/// rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct CreateItem {
    #[serde(default)]
    pub text: Option<String>,
}

/// A partial update. Only the fields that are present are applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ItemChanges {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub order: Option<i64>,
}

impl ItemChanges {
    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none() && self.order.is_none()
    }

    pub fn apply_to(self, item: &mut Item) {
        if let Some(text) = self.text {
            item.text = text;
        }
        if let Some(completed) = self.completed {
            item.completed = completed;
        }
        if let Some(order) = self.order {
            item.order = order;
        }
    }
}

/// Trim `raw` and check it is a usable item text.
pub fn validate_text(raw: &str) -> Result<String, TextError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(TextError::Empty);
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(TextError::TooLong);
    }
    Ok(text.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("Text is required")]
    Empty,
    #[error("Text must be at most 200 characters")]
    TooLong,
}

/// Display ordering: ascending `order`, newest first on ties.
pub fn display_cmp(a: &Item, b: &Item) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// The `order` a newly created item receives: one past the current maximum,
/// or 0 when there are no items.
pub fn next_order(items: &[Item]) -> i64 {
    items.iter().map(|item| item.order).max().map_or(0, |max| max + 1)
}
