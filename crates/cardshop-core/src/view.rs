// ── Derived views ──
//
// Read-only projections of a collection: free-text search over a fixed set
// of fields, an optional structured filter, and an optional stable sort.
// Recomputed lazily whenever the source snapshot or the view parameters
// change.

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::model::{Entity, SearchField, Searchable};
use crate::store::{EntityCollection, Snapshot};
use crate::stream::Filter;

// ── Pure search ──────────────────────────────────────────────────────

/// Items where at least one field contains `query` (trimmed,
/// case-insensitive), in their original order. A blank query keeps
/// everything.
pub fn filter_items<T>(items: &[Arc<T>], query: &str, fields: &[SearchField<T>]) -> Vec<Arc<T>> {
    let needle = query.trim();
    if needle.is_empty() {
        return items.to_vec();
    }
    let needle = needle.to_lowercase();
    items
        .iter()
        .filter(|item| matches_query::<T>(item, &needle, fields))
        .cloned()
        .collect()
}

/// `needle` must already be trimmed and lowercased.
fn matches_query<T>(item: &T, needle: &str, fields: &[SearchField<T>]) -> bool {
    fields.iter().any(|field| {
        (field.extract)(item).is_some_and(|value| value.to_lowercase().contains(needle))
    })
}

// ── Live view ────────────────────────────────────────────────────────

type SortFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

struct ViewParams<T> {
    query: String,
    filter: Option<Arc<dyn Filter<T>>>,
    sort: Option<SortFn<T>>,
    /// Bumped on every parameter change; part of the memo key.
    revision: u64,
}

impl<T> Clone for ViewParams<T> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            revision: self.revision,
        }
    }
}

struct Memo<T> {
    source: Snapshot<T>,
    revision: u64,
    result: Snapshot<T>,
}

/// A live, filtered projection of one [`EntityCollection`].
///
/// ```ignore
/// let view = storefront.cards().view();
/// view.set_query("bolt");
/// let hits = view.current();
/// ```
pub struct DerivedView<T: Entity + Searchable> {
    source: watch::Receiver<Snapshot<T>>,
    params: watch::Sender<ViewParams<T>>,
    params_rx: watch::Receiver<ViewParams<T>>,
    memo: Mutex<Option<Memo<T>>>,
}

impl<T: Entity + Searchable> DerivedView<T> {
    pub fn new(collection: &EntityCollection<T>) -> Self {
        Self::from_receiver(collection.watch())
    }

    pub(crate) fn from_receiver(source: watch::Receiver<Snapshot<T>>) -> Self {
        let (params, params_rx) = watch::channel(ViewParams {
            query: String::new(),
            filter: None,
            sort: None,
            revision: 0,
        });
        Self {
            source,
            params,
            params_rx,
            memo: Mutex::new(None),
        }
    }

    // Builders configure the view before anyone waits on it, so they do
    // not count as a change for `changed()`.

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.set_query(query);
        self.params_rx.borrow_and_update();
        self
    }

    pub fn with_filter(mut self, filter: impl Filter<T> + 'static) -> Self {
        self.set_filter(filter);
        self.params_rx.borrow_and_update();
        self
    }

    pub fn with_sort(
        mut self,
        cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.set_sort(cmp);
        self.params_rx.borrow_and_update();
        self
    }

    // ── Parameters ───────────────────────────────────────────────────

    pub fn query(&self) -> String {
        self.params.borrow().query.clone()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.params.send_if_modified(|p| {
            if p.query == query {
                return false;
            }
            p.query = query;
            p.revision += 1;
            true
        });
    }

    pub fn set_filter(&self, filter: impl Filter<T> + 'static) {
        self.update_params(|p| p.filter = Some(Arc::new(filter)));
    }

    pub fn clear_filter(&self) {
        self.update_params(|p| p.filter = None);
    }

    /// Stable sort applied after filtering.
    pub fn set_sort(&self, cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) {
        self.update_params(|p| p.sort = Some(Arc::new(cmp)));
    }

    pub fn clear_sort(&self) {
        self.update_params(|p| p.sort = None);
    }

    fn update_params(&self, f: impl FnOnce(&mut ViewParams<T>)) {
        self.params.send_modify(|p| {
            f(p);
            p.revision += 1;
        });
    }

    // ── Output ───────────────────────────────────────────────────────

    /// The projection of the newest snapshot under the current parameters.
    /// Recomputed only when either has changed since the last call.
    pub fn current(&self) -> Snapshot<T> {
        let source = self.source.borrow().clone();
        let params = self.params.borrow().clone();
        self.project(source, &params)
    }

    /// Wait until the source or the parameters change, then return the
    /// recomputed projection. `None` once the collection has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        tokio::select! {
            res = self.source.changed() => res.ok()?,
            res = self.params_rx.changed() => res.ok()?,
        }
        let source = self.source.borrow_and_update().clone();
        let params = self.params_rx.borrow_and_update().clone();
        Some(self.project(source, &params))
    }

    fn project(&self, source: Snapshot<T>, params: &ViewParams<T>) -> Snapshot<T> {
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(m) = memo.as_ref() {
            if Arc::ptr_eq(&m.source, &source) && m.revision == params.revision {
                return Arc::clone(&m.result);
            }
        }

        let mut items = filter_items(&source, &params.query, T::search_fields());
        if let Some(filter) = &params.filter {
            items.retain(|item| filter.matches(&**item));
        }
        if let Some(cmp) = &params.sort {
            items.sort_by(|a, b| cmp(&**a, &**b));
        }

        let result = Arc::new(items);
        *memo = Some(Memo {
            source,
            revision: params.revision,
            result: Arc::clone(&result),
        });
        result
    }
}

impl<T: Entity + Searchable> fmt::Debug for DerivedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.params.borrow();
        f.debug_struct("DerivedView")
            .field("query", &params.query)
            .field("filtered", &params.filter.is_some())
            .field("sorted", &params.sort.is_some())
            .finish_non_exhaustive()
    }
}
