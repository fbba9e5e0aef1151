// ── Entity contract ──
//
// Everything the store, views and coordinator need to know about a record
// type: how to key it, how to patch it, and how to check it.

use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;

use crate::error::CoreError;

/// A keyed record held by an [`EntityCollection`](crate::store::EntityCollection).
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Stable, unique identifier.
    type Key: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Partial update. Fields left unset are not touched by `apply_patch`.
    type Patch: Clone + fmt::Debug + Send + Sync + 'static;

    /// Human-readable entity name used in errors and logs.
    const KIND: &'static str;

    fn key(&self) -> Self::Key;

    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Check a whole value before it is sent anywhere.
    fn validate(&self) -> Result<(), CoreError> {
        Ok(())
    }

    /// Check a patch on its own, before it is queued.
    fn validate_patch(_patch: &Self::Patch) -> Result<(), CoreError> {
        Ok(())
    }
}

/// A named text projection of `T` that free-text search looks at.
///
/// `extract` returns `None` when the field is absent for a given record;
/// an absent field never matches.
pub struct SearchField<T> {
    pub name: &'static str,
    pub extract: for<'a> fn(&'a T) -> Option<Cow<'a, str>>,
}

impl<T> fmt::Debug for SearchField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchField").field("name", &self.name).finish()
    }
}

/// Entity types that expose a fixed set of searchable fields.
pub trait Searchable: Sized {
    fn search_fields() -> &'static [SearchField<Self>];
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str, field: &str) -> Result<(), CoreError> {
    require_text(value, field)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(CoreError::validation(format!(
            "{field} is not an email address: {value}"
        ))),
    }
}
