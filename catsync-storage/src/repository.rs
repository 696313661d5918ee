//! The repository contract consumed by the sync engine.

use crate::error::StorageResult;
use catsync_model::{CorrelationRecord, InternalElement, NewElement};
use catsync_types::{ElementId, Timestamp};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One page of related elements.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub elements: Vec<InternalElement>,
    /// Cursor for the next page; `None` when this was the last page.
    pub next_cursor: Option<String>,
}

/// Access to the internal metadata graph.
///
/// Calls are blocking. Authorization is the implementation's concern; the
/// engine only passes the identity it acts as.
pub trait MetadataRepository: Send + Sync {
    /// Creates an element and returns its id.
    fn create_element(&self, user_id: &str, element: NewElement) -> StorageResult<ElementId>;

    /// Creates an element starting from a template element's properties.
    ///
    /// `{{key}}` occurrences in the template's string properties are replaced
    /// by `placeholders[key]`; the element's own properties then override the
    /// template's.
    fn create_from_template(
        &self,
        user_id: &str,
        template: ElementId,
        element: NewElement,
        placeholders: &BTreeMap<String, String>,
    ) -> StorageResult<ElementId>;

    /// Updates an element's properties. With `merge`, keys not present in
    /// `properties` are kept; otherwise the bag is replaced.
    fn update_element(
        &self,
        user_id: &str,
        id: ElementId,
        properties: Map<String, Value>,
        merge: bool,
    ) -> StorageResult<()>;

    /// Deletes an element, its descendants and their correlation records.
    fn delete_element(&self, user_id: &str, id: ElementId) -> StorageResult<()>;

    fn get_element(&self, user_id: &str, id: ElementId) -> StorageResult<Option<InternalElement>>;

    fn get_by_qualified_name(
        &self,
        user_id: &str,
        qualified_name: &str,
    ) -> StorageResult<Option<InternalElement>>;

    /// Returns the children of `parent` with the given type, in creation
    /// order, starting after `cursor`.
    fn related_elements(
        &self,
        user_id: &str,
        parent: ElementId,
        type_name: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> StorageResult<Page>;

    /// Adds a correlation record, replacing any record for the same source.
    fn add_external_identifier(
        &self,
        user_id: &str,
        id: ElementId,
        record: &CorrelationRecord,
    ) -> StorageResult<()>;

    /// Updates the existing record for `record.source`.
    fn update_external_identifier(
        &self,
        user_id: &str,
        id: ElementId,
        record: &CorrelationRecord,
    ) -> StorageResult<()>;

    /// Records a successful synchronization: advances the record's
    /// `last_known_update` and stamps `last_synchronized`.
    fn confirm_synchronization(
        &self,
        user_id: &str,
        id: ElementId,
        source: &str,
        external_id: &str,
        last_known_update: Option<Timestamp>,
    ) -> StorageResult<()>;
}
