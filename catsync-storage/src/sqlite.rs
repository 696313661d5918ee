//! SQLite implementation of [`MetadataRepository`].

use crate::error::{StorageError, StorageResult};
use crate::repository::{MetadataRepository, Page};
use catsync_model::{CorrelationRecord, InternalElement, NewElement};
use catsync_types::{ElementId, SyncDirection, Timestamp};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const ELEMENT_COLUMNS: &str = "seq, id, qualified_name, type_name, parent_id, anchor_id, \
     properties, created_at, updated_at, created_by, updated_by";

/// Metadata repository backed by SQLite.
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    /// Opens (or creates) a repository at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory repository (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS elements (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                qualified_name TEXT NOT NULL UNIQUE,
                type_name TEXT NOT NULL,
                parent_id TEXT,
                anchor_id TEXT,
                properties TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                created_by TEXT NOT NULL,
                updated_by TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_elements_parent
                ON elements (parent_id, type_name, seq);

            CREATE TABLE IF NOT EXISTS external_ids (
                element_id TEXT NOT NULL,
                source TEXT NOT NULL,
                external_id TEXT NOT NULL,
                last_known_update INTEGER,
                last_synchronized INTEGER,
                direction TEXT NOT NULL,
                UNIQUE(element_id, source)
            );
            ",
        )?;
        Ok(())
    }

    fn insert_element(
        conn: &Connection,
        user_id: &str,
        element: &NewElement,
    ) -> StorageResult<ElementId> {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT seq FROM elements WHERE qualified_name = ?1",
                params![element.qualified_name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StorageError::Duplicate(element.qualified_name.clone()));
        }

        let id = ElementId::new();
        let now = Timestamp::now().as_millis();
        conn.execute(
            "INSERT INTO elements (id, qualified_name, type_name, parent_id, anchor_id, \
             properties, created_at, updated_at, created_by, updated_by) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8, ?8)",
            params![
                id.to_string(),
                element.qualified_name,
                element.type_name,
                element.parent.map(|p| p.to_string()),
                element.anchor.map(|a| a.to_string()),
                serde_json::to_string(&element.properties)?,
                now,
                user_id,
            ],
        )?;
        Ok(id)
    }

    fn load_correlations(
        conn: &Connection,
        id: ElementId,
    ) -> StorageResult<Vec<CorrelationRecord>> {
        let mut stmt = conn.prepare(
            "SELECT external_id, source, last_known_update, last_synchronized, direction \
             FROM external_ids WHERE element_id = ?1 ORDER BY source",
        )?;
        let rows = stmt.query_map(params![id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (external_id, source, last_known, last_sync, direction) = row?;
            let direction: SyncDirection = direction
                .parse()
                .map_err(|e| StorageError::InvalidData(format!("direction: {e}")))?;
            records.push(CorrelationRecord {
                external_id,
                source,
                last_known_update: last_known.map(Timestamp::from_millis),
                last_synchronized: last_sync.map(Timestamp::from_millis),
                direction,
            });
        }
        Ok(records)
    }

    fn load_element(
        conn: &Connection,
        clause: &str,
        value: &str,
    ) -> StorageResult<Option<InternalElement>> {
        let sql = format!("SELECT {ELEMENT_COLUMNS} FROM elements WHERE {clause} = ?1");
        let row = conn
            .query_row(&sql, params![value], ElementRow::from_row)
            .optional()?;
        match row {
            Some(row) => Ok(Some(row.into_element(conn)?)),
            None => Ok(None),
        }
    }

    fn require_element(conn: &Connection, id: ElementId) -> StorageResult<InternalElement> {
        Self::load_element(conn, "id", &id.to_string())?
            .ok_or_else(|| StorageError::NotFound(format!("element {id}")))
    }

    fn subtree_ids(conn: &Connection, id: ElementId) -> StorageResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "WITH RECURSIVE tree(id) AS (
                 SELECT ?1
                 UNION ALL
                 SELECT e.id FROM elements e JOIN tree t ON e.parent_id = t.id
             )
             SELECT id FROM tree",
        )?;
        let ids = stmt
            .query_map(params![id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

/// Raw column values of an `elements` row.
struct ElementRow {
    seq: i64,
    id: String,
    qualified_name: String,
    type_name: String,
    parent_id: Option<String>,
    anchor_id: Option<String>,
    properties: String,
    created_at: i64,
    updated_at: i64,
    created_by: String,
    updated_by: String,
}

impl ElementRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            seq: row.get(0)?,
            id: row.get(1)?,
            qualified_name: row.get(2)?,
            type_name: row.get(3)?,
            parent_id: row.get(4)?,
            anchor_id: row.get(5)?,
            properties: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            created_by: row.get(9)?,
            updated_by: row.get(10)?,
        })
    }

    fn into_element(self, conn: &Connection) -> StorageResult<InternalElement> {
        let id = parse_id(&self.id)?;
        let properties: Map<String, Value> = serde_json::from_str(&self.properties)?;
        Ok(InternalElement {
            id,
            qualified_name: self.qualified_name,
            type_name: self.type_name,
            properties,
            parent: self.parent_id.as_deref().map(parse_id).transpose()?,
            anchor: self.anchor_id.as_deref().map(parse_id).transpose()?,
            correlations: SqliteRepository::load_correlations(conn, id)?,
            created_at: Timestamp::from_millis(self.created_at),
            updated_at: Timestamp::from_millis(self.updated_at),
            created_by: self.created_by,
            updated_by: self.updated_by,
        })
    }
}

fn parse_id(s: &str) -> StorageResult<ElementId> {
    ElementId::parse(s).map_err(|e| StorageError::InvalidData(format!("element id {s}: {e}")))
}

/// Replaces `{{key}}` in every string of `value` using `placeholders`.
fn substitute(value: &mut Value, placeholders: &BTreeMap<String, String>) {
    match value {
        Value::String(s) => {
            for (key, replacement) in placeholders {
                let pattern = format!("{{{{{key}}}}}");
                if s.contains(&pattern) {
                    *s = s.replace(&pattern, replacement);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| substitute(v, placeholders)),
        Value::Object(map) => map.values_mut().for_each(|v| substitute(v, placeholders)),
        _ => {}
    }
}

impl MetadataRepository for SqliteRepository {
    fn create_element(&self, user_id: &str, element: NewElement) -> StorageResult<ElementId> {
        let conn = self.lock()?;
        Self::insert_element(&conn, user_id, &element)
    }

    fn create_from_template(
        &self,
        user_id: &str,
        template: ElementId,
        element: NewElement,
        placeholders: &BTreeMap<String, String>,
    ) -> StorageResult<ElementId> {
        let conn = self.lock()?;
        let template = Self::load_element(&conn, "id", &template.to_string())?
            .ok_or_else(|| StorageError::NotFound(format!("template {template}")))?;

        let mut properties = template.properties;
        for value in properties.values_mut() {
            substitute(value, placeholders);
        }
        properties.extend(element.properties);

        let element = NewElement {
            properties,
            ..element
        };
        Self::insert_element(&conn, user_id, &element)
    }

    fn update_element(
        &self,
        user_id: &str,
        id: ElementId,
        properties: Map<String, Value>,
        merge: bool,
    ) -> StorageResult<()> {
        let conn = self.lock()?;
        let current = Self::require_element(&conn, id)?;

        let merged = if merge {
            let mut merged = current.properties;
            merged.extend(properties);
            merged
        } else {
            properties
        };

        conn.execute(
            "UPDATE elements SET properties = ?1, updated_at = ?2, updated_by = ?3 WHERE id = ?4",
            params![
                serde_json::to_string(&merged)?,
                Timestamp::now().as_millis(),
                user_id,
                id.to_string(),
            ],
        )?;
        Ok(())
    }

    fn delete_element(&self, _user_id: &str, id: ElementId) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let ids = Self::subtree_ids(&conn, id)?;

        let tx = conn.transaction()?;
        let mut removed = 0;
        for element_id in &ids {
            tx.execute(
                "DELETE FROM external_ids WHERE element_id = ?1",
                params![element_id],
            )?;
            removed += tx.execute("DELETE FROM elements WHERE id = ?1", params![element_id])?;
        }
        tx.commit()?;

        if removed == 0 {
            return Err(StorageError::NotFound(format!("element {id}")));
        }
        Ok(())
    }

    fn get_element(&self, _user_id: &str, id: ElementId) -> StorageResult<Option<InternalElement>> {
        let conn = self.lock()?;
        Self::load_element(&conn, "id", &id.to_string())
    }

    fn get_by_qualified_name(
        &self,
        _user_id: &str,
        qualified_name: &str,
    ) -> StorageResult<Option<InternalElement>> {
        let conn = self.lock()?;
        Self::load_element(&conn, "qualified_name", qualified_name)
    }

    fn related_elements(
        &self,
        _user_id: &str,
        parent: ElementId,
        type_name: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> StorageResult<Page> {
        let after: i64 = match cursor {
            Some(c) => c
                .parse()
                .map_err(|_| StorageError::InvalidData(format!("cursor {c}")))?,
            None => 0,
        };
        let limit = page_size.max(1);

        let conn = self.lock()?;
        let sql = format!(
            "SELECT {ELEMENT_COLUMNS} FROM elements \
             WHERE parent_id = ?1 AND type_name = ?2 AND seq > ?3 \
             ORDER BY seq LIMIT ?4"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![parent.to_string(), type_name, after, limit as i64],
                ElementRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let last_seq = rows.last().map(|r| r.seq);
        let full = rows.len() == limit;
        let mut elements = Vec::with_capacity(rows.len());
        for row in rows {
            elements.push(row.into_element(&conn)?);
        }

        Ok(Page {
            elements,
            next_cursor: if full {
                last_seq.map(|s| s.to_string())
            } else {
                None
            },
        })
    }

    fn add_external_identifier(
        &self,
        _user_id: &str,
        id: ElementId,
        record: &CorrelationRecord,
    ) -> StorageResult<()> {
        let conn = self.lock()?;
        Self::require_element(&conn, id)?;
        conn.execute(
            "INSERT OR REPLACE INTO external_ids \
             (element_id, source, external_id, last_known_update, last_synchronized, direction) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                record.source,
                record.external_id,
                record.last_known_update.map(|t| t.as_millis()),
                record.last_synchronized.map(|t| t.as_millis()),
                record.direction.as_str(),
            ],
        )?;
        Ok(())
    }

    fn update_external_identifier(
        &self,
        _user_id: &str,
        id: ElementId,
        record: &CorrelationRecord,
    ) -> StorageResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE external_ids SET external_id = ?1, last_known_update = ?2, \
             last_synchronized = ?3, direction = ?4 WHERE element_id = ?5 AND source = ?6",
            params![
                record.external_id,
                record.last_known_update.map(|t| t.as_millis()),
                record.last_synchronized.map(|t| t.as_millis()),
                record.direction.as_str(),
                id.to_string(),
                record.source,
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound(format!(
                "correlation for element {id} from {}",
                record.source
            )));
        }
        Ok(())
    }

    fn confirm_synchronization(
        &self,
        _user_id: &str,
        id: ElementId,
        source: &str,
        external_id: &str,
        last_known_update: Option<Timestamp>,
    ) -> StorageResult<()> {
        let conn = self.lock()?;
        let element = Self::require_element(&conn, id)?;

        // Never stamp earlier than the element's own last write, or that write
        // would later read as an unsynchronized local edit.
        let synced_at = Timestamp::now().max(element.updated_at);

        let updated = conn.execute(
            "UPDATE external_ids SET last_known_update = ?1, last_synchronized = ?2 \
             WHERE element_id = ?3 AND source = ?4 AND external_id = ?5",
            params![
                last_known_update.map(|t| t.as_millis()),
                synced_at.as_millis(),
                id.to_string(),
                source,
                external_id,
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound(format!(
                "correlation {external_id} for element {id} from {source}"
            )));
        }
        Ok(())
    }
}
