//! Client-side view of the todo list.
//!
//! The server is the source of truth; `TodoState` holds the last known copy
//! plus the purely local filter. Only `apply_order` changes state ahead of the
//! server, and it is never rolled back.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::types::Item;

/// Which items the list shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn matches(self, item: &Item) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !item.completed,
            Filter::Completed => item.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter {0:?}, expected all, active or completed")]
pub struct UnknownFilter(pub String);

impl FromStr for Filter {
    type Err = UnknownFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" => Ok(Filter::Completed),
            other => Err(UnknownFilter(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TodoState {
    items: Vec<Item>,
    pub filter: Filter,
    loading: bool,
}

impl Default for TodoState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            filter: Filter::All,
            loading: true,
        }
    }
}

impl TodoState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Every item, in state order, regardless of filter.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Settle the initial fetch. A failed fetch leaves an empty list.
    pub fn finish_loading(&mut self, result: Result<Vec<Item>, ApiError>) {
        match result {
            Ok(items) => self.items = items,
            Err(error) => {
                tracing::error!(%error, "failed to load todos");
                self.items.clear();
            }
        }
        self.loading = false;
    }

    /// The items the current filter shows, in state order.
    pub fn visible(&self) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| self.filter.matches(item))
            .collect()
    }

    pub fn items_left(&self) -> usize {
        self.items.iter().filter(|item| !item.completed).count()
    }

    pub fn insert_created(&mut self, item: Item) {
        self.items.insert(0, item);
    }

    /// Swap in the server's copy of an item. Unknown ids are ignored.
    pub fn replace(&mut self, item: Item) {
        if let Some(slot) = self.items.iter_mut().find(|slot| slot.id == item.id) {
            *slot = item;
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.items.retain(|item| item.id != id);
    }

    pub fn completed_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.completed)
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn drop_completed(&mut self) {
        self.items.retain(|item| !item.completed);
    }

    /// Rearrange so the listed ids come first, in the given order. Items not
    /// listed (hidden by the filter, say) follow in their previous relative
    /// order; ids that match nothing are ignored.
    pub fn apply_order(&mut self, ids: &[String]) {
        let mut by_id: HashMap<String, Item> = self
            .items
            .iter()
            .map(|item| (item.id.clone(), item.clone()))
            .collect();
        let mut ordered: Vec<Item> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
        ordered.extend(
            self.items
                .iter()
                .filter(|item| by_id.contains_key(&item.id))
                .cloned(),
        );
        self.items = ordered;
    }
}
