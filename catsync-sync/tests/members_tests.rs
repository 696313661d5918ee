use catsync_model::{CorrelationRecord, InternalElement, NewElement};
use catsync_storage::{MetadataRepository, Page, SqliteRepository, StorageResult};
use catsync_sync::MemberIterator;
use catsync_types::{ElementId, SyncDirection, Timestamp};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

const USER: &str = "catsync";
const SOURCE: &str = "uc";

fn repo_with_children(count: usize) -> (SqliteRepository, ElementId, Vec<ElementId>) {
    let repo = SqliteRepository::open_in_memory().unwrap();
    let parent = repo
        .create_element(USER, NewElement::new("schema", "DatabaseSchema"))
        .unwrap();
    let children = (0..count)
        .map(|i| {
            repo.create_element(
                USER,
                NewElement::new(format!("t{i}"), "Table").with_parent(parent),
            )
            .unwrap()
        })
        .collect();
    (repo, parent, children)
}

fn names(iter: MemberIterator<'_>) -> Vec<String> {
    iter.map(|m| m.unwrap().element.qualified_name).collect()
}

#[test]
fn iterates_every_member_across_pages() {
    let (repo, parent, _) = repo_with_children(5);
    let iter = MemberIterator::new(&repo, USER, SOURCE, parent, "Table", 2);
    assert_eq!(names(iter), vec!["t0", "t1", "t2", "t3", "t4"]);
}

#[test]
fn exact_multiple_of_page_size_terminates() {
    let (repo, parent, _) = repo_with_children(4);
    let iter = MemberIterator::new(&repo, USER, SOURCE, parent, "Table", 2);
    assert_eq!(names(iter).len(), 4);
}

#[test]
fn empty_parent_yields_nothing() {
    let (repo, parent, _) = repo_with_children(0);
    let mut iter = MemberIterator::new(&repo, USER, SOURCE, parent, "Table", 10);
    assert!(iter.next().is_none());
}

#[test]
fn only_members_of_the_requested_type() {
    let (repo, parent, _) = repo_with_children(2);
    repo.create_element(USER, NewElement::new("v0", "DataFolder").with_parent(parent))
        .unwrap();
    let iter = MemberIterator::new(&repo, USER, SOURCE, parent, "DataFolder", 10);
    assert_eq!(names(iter), vec!["v0"]);
}

#[test]
fn deleting_visited_members_does_not_skip_later_ones() {
    let (repo, parent, _) = repo_with_children(6);
    let mut seen = Vec::new();
    for member in MemberIterator::new(&repo, USER, SOURCE, parent, "Table", 2) {
        let member = member.unwrap();
        seen.push(member.element.qualified_name.clone());
        repo.delete_element(USER, member.element.id).unwrap();
    }
    assert_eq!(seen, vec!["t0", "t1", "t2", "t3", "t4", "t5"]);
}

#[test]
fn restart_begins_again() {
    let (repo, parent, _) = repo_with_children(3);
    let mut iter = MemberIterator::new(&repo, USER, SOURCE, parent, "Table", 2);
    assert!(iter.next().is_some());
    assert!(iter.next().is_some());
    iter.restart();
    assert_eq!(names(iter), vec!["t0", "t1", "t2"]);
}

#[test]
fn members_carry_their_correlation_for_the_source() {
    let (repo, parent, children) = repo_with_children(2);
    repo.add_external_identifier(
        USER,
        children[0],
        &CorrelationRecord::new("uc-1", SOURCE, SyncDirection::FromThirdParty),
    )
    .unwrap();
    repo.add_external_identifier(
        USER,
        children[1],
        &CorrelationRecord::new("x-1", "other", SyncDirection::FromThirdParty),
    )
    .unwrap();

    let members: Vec<_> = MemberIterator::new(&repo, USER, SOURCE, parent, "Table", 10)
        .map(Result::unwrap)
        .collect();
    assert_eq!(
        members[0].correlation.as_ref().map(|c| c.external_id.as_str()),
        Some("uc-1")
    );
    assert!(members[1].correlation.is_none());
}

#[test]
fn lookup_by_qualified_name() {
    let (repo, parent, children) = repo_with_children(2);
    let iter = MemberIterator::new(&repo, USER, SOURCE, parent, "Table", 10);
    let member = iter.by_qualified_name("t1").unwrap().unwrap();
    assert_eq!(member.element.id, children[1]);
    assert!(iter.by_qualified_name("missing").unwrap().is_none());
}

/// Hides some elements from pages the way a permission check would, while
/// keeping the underlying cursor.
struct HidingRepository {
    inner: SqliteRepository,
    hidden: HashSet<String>,
}

impl MetadataRepository for HidingRepository {
    fn create_element(&self, user_id: &str, element: NewElement) -> StorageResult<ElementId> {
        self.inner.create_element(user_id, element)
    }

    fn create_from_template(
        &self,
        user_id: &str,
        template: ElementId,
        element: NewElement,
        placeholders: &BTreeMap<String, String>,
    ) -> StorageResult<ElementId> {
        self.inner
            .create_from_template(user_id, template, element, placeholders)
    }

    fn update_element(
        &self,
        user_id: &str,
        id: ElementId,
        properties: Map<String, Value>,
        merge: bool,
    ) -> StorageResult<()> {
        self.inner.update_element(user_id, id, properties, merge)
    }

    fn delete_element(&self, user_id: &str, id: ElementId) -> StorageResult<()> {
        self.inner.delete_element(user_id, id)
    }

    fn get_element(&self, user_id: &str, id: ElementId) -> StorageResult<Option<InternalElement>> {
        self.inner.get_element(user_id, id)
    }

    fn get_by_qualified_name(
        &self,
        user_id: &str,
        qualified_name: &str,
    ) -> StorageResult<Option<InternalElement>> {
        self.inner.get_by_qualified_name(user_id, qualified_name)
    }

    fn related_elements(
        &self,
        user_id: &str,
        parent: ElementId,
        type_name: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> StorageResult<Page> {
        let mut page = self
            .inner
            .related_elements(user_id, parent, type_name, cursor, page_size)?;
        page.elements.retain(|e| !self.hidden.contains(&e.qualified_name));
        Ok(page)
    }

    fn add_external_identifier(
        &self,
        user_id: &str,
        id: ElementId,
        record: &CorrelationRecord,
    ) -> StorageResult<()> {
        self.inner.add_external_identifier(user_id, id, record)
    }

    fn update_external_identifier(
        &self,
        user_id: &str,
        id: ElementId,
        record: &CorrelationRecord,
    ) -> StorageResult<()> {
        self.inner.update_external_identifier(user_id, id, record)
    }

    fn confirm_synchronization(
        &self,
        user_id: &str,
        id: ElementId,
        source: &str,
        external_id: &str,
        last_known_update: Option<Timestamp>,
    ) -> StorageResult<()> {
        self.inner
            .confirm_synchronization(user_id, id, source, external_id, last_known_update)
    }
}

#[test]
fn empty_pages_in_the_middle_are_skipped() {
    let (inner, parent, _) = repo_with_children(6);
    let repo = HidingRepository {
        inner,
        hidden: ["t0", "t1", "t2", "t3"].iter().map(|s| s.to_string()).collect(),
    };
    let iter = MemberIterator::new(&repo, USER, SOURCE, parent, "Table", 2);
    assert_eq!(names(iter), vec!["t4", "t5"]);
}
