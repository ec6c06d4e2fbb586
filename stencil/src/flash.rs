//! Flash messages — short-lived, categorised notes consumed by the next render.
//!
//! Reads are destructive: [`Flashes::get`] and [`Flashes::all`] remove what
//! they return, and the engine clears the whole store after every render.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Category used by [`Flashes::push`].
pub const DEFAULT_CATEGORY: &str = "info";

/// Shared handle to an engine's flash store. Clones share the same messages.
#[derive(Debug, Clone, Default)]
pub struct Flashes {
    msgs: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl Flashes {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.msgs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `msg` to `category`, e.g. `info`, `error` or `success`.
    pub fn push_to(&self, category: &str, msg: impl Into<String>) {
        self.lock()
            .entry(category.to_string())
            .or_default()
            .push(msg.into());
    }

    /// Appends `msg` to the `info` category.
    pub fn push(&self, msg: impl Into<String>) {
        self.push_to(DEFAULT_CATEGORY, msg);
    }

    /// Takes every message in `category`, oldest first.
    pub fn get(&self, category: &str) -> Vec<String> {
        self.lock().remove(category).unwrap_or_default()
    }

    /// Takes every message in every category. Category order is unspecified.
    pub fn all(&self) -> Vec<String> {
        self.lock().drain().flat_map(|(_, msgs)| msgs).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().values().all(Vec::is_empty)
    }
}

/// Clears the store when dropped.
pub(crate) struct DrainGuard<'a>(pub(crate) &'a Flashes);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.clear();
    }
}
