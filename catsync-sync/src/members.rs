//! Paged iteration over repository elements.

use crate::error::SyncResult;
use catsync_model::{CorrelationRecord, InternalElement};
use catsync_storage::MetadataRepository;
use catsync_types::ElementId;
use std::collections::VecDeque;
use tracing::warn;

/// A repository element together with its correlation record for the
/// engine's source.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub element: InternalElement,
    pub correlation: Option<CorrelationRecord>,
}

impl Member {
    pub fn new(element: InternalElement, source: &str) -> Self {
        let correlation = element.correlation(source).cloned();
        Self {
            element,
            correlation,
        }
    }
}

/// Walks the children of one parent with one type name, a page at a time.
///
/// Pages are requested by cursor, so elements deleted while iterating do not
/// cause later elements to be skipped.
pub struct MemberIterator<'a> {
    repository: &'a dyn MetadataRepository,
    user_id: &'a str,
    source: &'a str,
    parent: ElementId,
    type_name: &'a str,
    page_size: usize,
    buffer: VecDeque<InternalElement>,
    cursor: Option<String>,
    exhausted: bool,
}

impl<'a> MemberIterator<'a> {
    pub fn new(
        repository: &'a dyn MetadataRepository,
        user_id: &'a str,
        source: &'a str,
        parent: ElementId,
        type_name: &'a str,
        page_size: usize,
    ) -> Self {
        Self {
            repository,
            user_id,
            source,
            parent,
            type_name,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
        }
    }

    /// Starts again from the first page.
    pub fn restart(&mut self) {
        self.buffer.clear();
        self.cursor = None;
        self.exhausted = false;
    }

    /// Looks up a single member by qualified name, regardless of parent.
    pub fn by_qualified_name(&self, qualified_name: &str) -> SyncResult<Option<Member>> {
        Ok(self
            .repository
            .get_by_qualified_name(self.user_id, qualified_name)?
            .map(|element| Member::new(element, self.source)))
    }

    fn fetch_page(&mut self) -> SyncResult<()> {
        let page = self.repository.related_elements(
            self.user_id,
            self.parent,
            self.type_name,
            self.cursor.as_deref(),
            self.page_size,
        )?;

        match page.next_cursor {
            None => self.exhausted = true,
            // Empty pages with a fresh cursor are skipped over; only a
            // repeated cursor ends the walk early.
            Some(next) if self.cursor.as_deref() == Some(next.as_str()) => {
                warn!(parent = %self.parent, type_name = self.type_name, "cursor did not advance");
                self.exhausted = true;
            }
            Some(next) => self.cursor = Some(next),
        }
        self.buffer.extend(page.elements);
        Ok(())
    }
}

impl Iterator for MemberIterator<'_> {
    type Item = SyncResult<Member>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.is_empty() {
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer
            .pop_front()
            .map(|element| Ok(Member::new(element, self.source)))
    }
}
