//! Persistence for analyzed design exemplars.
//!
//! Exemplars are only ever inserted and updated; nothing here deletes.

pub mod migrations;
pub mod sqlite;

use deckstyle_core::{DesignExemplar, ExemplarScope, NewExemplar, Result};

pub use sqlite::SqliteExemplarStore;

/// Exemplar repository queried by category, scope and creation order.
///
/// Reads may run concurrently. Malformed records are skipped by list
/// queries rather than failing the whole batch.
pub trait ExemplarStore: Send + Sync {
    /// Insert a new exemplar; keywords are case-folded and deduplicated.
    fn insert(&self, new: NewExemplar) -> Result<DesignExemplar>;

    fn get(&self, id: &str) -> Result<Option<DesignExemplar>>;

    /// Overwrite the mutable fields of an existing exemplar.
    fn update(&self, exemplar: &DesignExemplar) -> Result<()>;

    /// Ranking candidates, at most `cap` of them.
    ///
    /// A set scope filters to that set; an uploader scope only moves the
    /// uploader's exemplars to the front of the retrieval order.
    fn candidates(&self, scope: &ExemplarScope, cap: usize) -> Result<Vec<DesignExemplar>>;

    /// Most recently created exemplar whose category starts with `prefix`.
    fn latest_with_category_prefix(&self, prefix: &str) -> Result<Option<DesignExemplar>>;

    /// Every exemplar with exactly this category, oldest first.
    fn list_by_category(&self, category_tag: &str) -> Result<Vec<DesignExemplar>>;

    /// Bump the usage count; returns the new count, or `None` if unknown.
    ///
    /// Not atomic across callers: usage is an advisory ranking signal.
    fn increment_usage(&self, id: &str) -> Result<Option<u32>>;
}
