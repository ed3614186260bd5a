//! Per-filter scratch data carried forward as a rupture grows.

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::RwLock;

use super::ClusterRupture;

/// Identifies the filter that owns a filter-data entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterDataKey(pub String);

impl FilterDataKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Display for FilterDataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FilterData {
    entries: RwLock<HashMap<FilterDataKey, HashSet<usize>>>,
}

impl FilterData {
    pub(crate) fn snapshot(&self) -> Self {
        Self {
            entries: RwLock::new(self.entries.read().clone()),
        }
    }
}

impl ClusterRupture {
    /// Enables the filter-data store on this rupture and its descendants.
    ///
    /// Filters record cluster keys (e.g. nucleation clusters that already
    /// failed); every rupture grown from this one via `take` starts with a
    /// copy of these records.
    pub fn with_filter_data(mut self) -> Self {
        if self.filter_data.is_none() {
            self.filter_data = Some(Default::default());
        }
        self
    }

    pub fn has_filter_data(&self) -> bool {
        self.filter_data.is_some()
    }

    /// Cluster keys recorded by the filter identified by `key`.
    pub fn filter_data(&self, key: &FilterDataKey) -> Option<HashSet<usize>> {
        self.filter_data
            .as_ref()
            .and_then(|data| data.entries.read().get(key).cloned())
    }

    /// Records cluster keys for `key`. Returns false when the store is disabled.
    pub fn add_filter_data(
        &self,
        key: &FilterDataKey,
        values: impl IntoIterator<Item = usize>,
    ) -> bool {
        let Some(data) = self.filter_data.as_ref() else {
            return false;
        };
        data.entries
            .write()
            .entry(key.clone())
            .or_default()
            .extend(values);
        true
    }
}
