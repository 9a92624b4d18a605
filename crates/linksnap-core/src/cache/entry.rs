// ── Cache entry state ──

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;

/// Logical identifier of one server-backed collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The signed-in caller's own link list.
    pub fn user_urls() -> Self {
        Self::new("user-urls")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a cache entry's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// No fetch has resolved yet.
    Pending,
    /// The last resolved fetch succeeded.
    Fresh,
    /// The last resolved fetch failed; `data` still holds the previous
    /// snapshot, if any.
    Error,
}

/// Point-in-time view of one cached collection.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub key: ResourceKey,
    /// Last good snapshot, absent before the first successful fetch.
    pub data: Option<Arc<Vec<T>>>,
    pub status: EntryStatus,
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// Present only when `status == Error`.
    pub error: Option<CoreError>,
    /// A request for this key is outstanding.
    pub is_fetching: bool,
}

impl<T> CacheEntry<T> {
    pub(crate) fn pending(key: ResourceKey) -> Self {
        Self {
            key,
            data: None,
            status: EntryStatus::Pending,
            last_fetched_at: None,
            error: None,
            is_fetching: false,
        }
    }

    /// The snapshot to display, empty when nothing has loaded yet.
    pub fn items(&self) -> &[T] {
        self.data.as_deref().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }

    pub(crate) fn apply(&mut self, result: Result<Vec<T>, CoreError>) {
        match result {
            Ok(items) => {
                self.data = Some(Arc::new(items));
                self.status = EntryStatus::Fresh;
                self.last_fetched_at = Some(Utc::now());
                self.error = None;
            }
            Err(e) => {
                self.status = EntryStatus::Error;
                self.error = Some(e.into_fetch());
            }
        }
    }
}
