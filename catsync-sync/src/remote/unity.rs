//! Unity Catalog REST client.
//!
//! Talks to the `/api/2.1/unity-catalog` API of an open-source Unity Catalog
//! server (or a compatible facade). List calls follow `next_page_token`
//! until the server stops returning one.

use super::client::{CatalogClient, Fetch, UNITY_CATALOG_CONNECTOR};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use catsync_model::{ColumnInfo, EntityPayload, ExternalEntity, ParameterInfo, RemoteDraft};
use catsync_types::{EntityKind, Timestamp};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};

const API_PREFIX: &str = "api/2.1/unity-catalog";

/// Unity Catalog connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnityCatalogConfig {
    /// Server address, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Bearer token; requests are unauthenticated when unset.
    pub token: Option<String>,
    /// `max_results` sent with list calls.
    pub page_size: u32,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for UnityCatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            page_size: 100,
            timeout_secs: 30,
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UcColumn {
    name: String,
    type_text: Option<String>,
    type_name: Option<String>,
    position: Option<i64>,
    nullable: Option<bool>,
    comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UcParameter {
    name: String,
    type_text: Option<String>,
    type_name: Option<String>,
    position: Option<i64>,
    comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UcParameters {
    parameters: Option<Vec<UcParameter>>,
}

/// Any entity returned by the API; each kind fills a subset of the fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UcEntity {
    name: Option<String>,
    catalog_name: Option<String>,
    schema_name: Option<String>,
    full_name: Option<String>,
    comment: Option<String>,
    properties: Option<BTreeMap<String, String>>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
    id: Option<String>,
    schema_id: Option<String>,
    table_id: Option<String>,
    volume_id: Option<String>,
    function_id: Option<String>,
    storage_root: Option<String>,
    storage_location: Option<String>,
    table_type: Option<String>,
    data_source_format: Option<String>,
    columns: Option<Vec<UcColumn>>,
    volume_type: Option<String>,
    data_type: Option<String>,
    full_data_type: Option<String>,
    routine_body: Option<String>,
    routine_definition: Option<String>,
    external_language: Option<String>,
    is_deterministic: Option<bool>,
    input_params: Option<UcParameters>,
}

impl UcEntity {
    fn into_entity(self, kind: EntityKind) -> SyncResult<ExternalEntity> {
        let full_name = match self.full_name.clone() {
            Some(full_name) => full_name,
            None => self.compose_full_name(kind)?,
        };

        let external_id = match kind {
            EntityKind::Catalog | EntityKind::Model => self.id.clone(),
            EntityKind::Schema => self.schema_id.clone(),
            EntityKind::Table => self.table_id.clone(),
            EntityKind::Volume => self.volume_id.clone(),
            EntityKind::Function => self.function_id.clone(),
        }
        .or_else(|| self.id.clone());

        let payload = match kind {
            EntityKind::Catalog => EntityPayload::Catalog {
                storage_root: self.storage_root,
            },
            EntityKind::Schema => EntityPayload::Schema {
                storage_root: self.storage_root,
            },
            EntityKind::Table => EntityPayload::Table {
                table_type: self.table_type,
                data_source_format: self.data_source_format,
                storage_location: self.storage_location,
                columns: self
                    .columns
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| ColumnInfo {
                        name: c.name,
                        type_text: c.type_text,
                        type_name: c.type_name,
                        position: c.position,
                        nullable: c.nullable,
                        comment: c.comment,
                    })
                    .collect(),
            },
            EntityKind::Volume => EntityPayload::Volume {
                volume_type: self.volume_type,
                storage_location: self.storage_location,
            },
            EntityKind::Function => EntityPayload::Function {
                data_type: self.data_type,
                full_data_type: self.full_data_type,
                routine_body: self.routine_body,
                routine_definition: self.routine_definition,
                language: self.external_language,
                is_deterministic: self.is_deterministic,
                parameters: self
                    .input_params
                    .and_then(|p| p.parameters)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|p| ParameterInfo {
                        name: p.name,
                        type_text: p.type_text,
                        type_name: p.type_name,
                        position: p.position,
                        comment: p.comment,
                    })
                    .collect(),
            },
            EntityKind::Model => EntityPayload::Model {
                storage_location: self.storage_location,
            },
        };

        Ok(ExternalEntity {
            kind,
            full_name,
            external_id,
            created_at: self.created_at.map(Timestamp::from_millis),
            updated_at: self.updated_at.map(Timestamp::from_millis),
            comment: self.comment,
            properties: self.properties.unwrap_or_default(),
            payload,
        })
    }

    fn compose_full_name(&self, kind: EntityKind) -> SyncResult<String> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| SyncError::InvalidEntity(format!("{kind} without a name")))?;
        let parts = match kind {
            EntityKind::Catalog => vec![Some(name)],
            EntityKind::Schema => vec![self.catalog_name.as_deref(), Some(name)],
            _ => vec![
                self.catalog_name.as_deref(),
                self.schema_name.as_deref(),
                Some(name),
            ],
        };
        parts
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .map(|p| p.join("."))
            .ok_or_else(|| SyncError::InvalidEntity(format!("{kind} {name} without a parent name")))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UcListPage {
    catalogs: Option<Vec<UcEntity>>,
    schemas: Option<Vec<UcEntity>>,
    tables: Option<Vec<UcEntity>>,
    volumes: Option<Vec<UcEntity>>,
    functions: Option<Vec<UcEntity>>,
    registered_models: Option<Vec<UcEntity>>,
    next_page_token: Option<String>,
}

impl UcListPage {
    fn take_items(&mut self, kind: EntityKind) -> Vec<UcEntity> {
        let items = match kind {
            EntityKind::Catalog => self.catalogs.take(),
            EntityKind::Schema => self.schemas.take(),
            EntityKind::Table => self.tables.take(),
            EntityKind::Volume => self.volumes.take(),
            EntityKind::Function => self.functions.take(),
            EntityKind::Model => self.registered_models.take(),
        };
        items.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct UcErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct UcColumnBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UcParameterBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UcParametersBody<'a> {
    parameters: Vec<UcParameterBody<'a>>,
}

/// Create request body; each kind sends the fields it supports.
#[derive(Debug, Default, Serialize)]
struct UcCreateBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_root: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    table_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_source_format: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<UcColumnBody<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_data_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    routine_body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    routine_definition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_deterministic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_params: Option<UcParametersBody<'a>>,
}

impl<'a> UcCreateBody<'a> {
    fn from_draft(draft: &'a RemoteDraft) -> Self {
        let mut body = UcCreateBody {
            name: &draft.name,
            catalog_name: draft.catalog_name(),
            schema_name: draft.schema_name(),
            comment: draft.comment.as_deref(),
            ..Default::default()
        };
        if supports_properties(draft.kind) {
            body.properties = Some(&draft.properties);
        }

        match &draft.payload {
            EntityPayload::Catalog { storage_root } | EntityPayload::Schema { storage_root } => {
                body.storage_root = storage_root.as_deref();
            }
            EntityPayload::Table {
                table_type,
                data_source_format,
                storage_location,
                columns,
            } => {
                body.table_type = table_type.as_deref();
                body.data_source_format = data_source_format.as_deref();
                body.storage_location = storage_location.as_deref();
                body.columns = Some(
                    columns
                        .iter()
                        .map(|c| UcColumnBody {
                            name: &c.name,
                            type_text: c.type_text.as_deref(),
                            type_name: c.type_name.as_deref(),
                            position: c.position,
                            nullable: c.nullable,
                            comment: c.comment.as_deref(),
                        })
                        .collect(),
                );
            }
            EntityPayload::Volume {
                volume_type,
                storage_location,
            } => {
                body.volume_type = volume_type.as_deref();
                body.storage_location = storage_location.as_deref();
            }
            EntityPayload::Function {
                data_type,
                full_data_type,
                routine_body,
                routine_definition,
                language,
                is_deterministic,
                parameters,
            } => {
                body.data_type = data_type.as_deref();
                body.full_data_type = full_data_type.as_deref();
                body.routine_body = routine_body.as_deref();
                body.routine_definition = routine_definition.as_deref();
                body.external_language = language.as_deref();
                body.is_deterministic = *is_deterministic;
                body.input_params = Some(UcParametersBody {
                    parameters: parameters
                        .iter()
                        .map(|p| UcParameterBody {
                            name: &p.name,
                            type_text: p.type_text.as_deref(),
                            type_name: p.type_name.as_deref(),
                            position: p.position,
                            comment: p.comment.as_deref(),
                        })
                        .collect(),
                });
            }
            EntityPayload::Model { storage_location } => {
                body.storage_location = storage_location.as_deref();
            }
        }
        body
    }
}

#[derive(Debug, Serialize)]
struct UcFunctionCreateBody<'a> {
    function_info: UcCreateBody<'a>,
}

#[derive(Debug, Serialize)]
struct UcUpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<&'a BTreeMap<String, String>>,
}

/// Volumes, functions and registered models carry no property map.
fn supports_properties(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::Catalog | EntityKind::Schema | EntityKind::Table
    )
}

fn collection(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Catalog => "catalogs",
        EntityKind::Schema => "schemas",
        EntityKind::Table => "tables",
        EntityKind::Volume => "volumes",
        EntityKind::Function => "functions",
        EntityKind::Model => "models",
    }
}

/// Unity Catalog client over HTTP.
pub struct UnityCatalogClient {
    config: UnityCatalogConfig,
    endpoint: String,
    client: Client,
}

impl UnityCatalogClient {
    pub fn new(config: UnityCatalogConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Configuration(format!("failed to create HTTP client: {e}")))?;
        let endpoint = config.base_url.trim_end_matches('/').to_string();

        info!("Unity Catalog client for {endpoint}");
        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    pub fn config(&self) -> &UnityCatalogConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{API_PREFIX}/{path}", self.endpoint);
        let builder = self.client.request(method, url);
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn entity_path(kind: EntityKind, full_name: &str) -> String {
        format!("{}/{}", collection(kind), urlencoding::encode(full_name))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> SyncResult<Response> {
        request
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("{what} failed: {e}")))
    }

    async fn read_entity(response: Response, kind: EntityKind, what: &str) -> SyncResult<ExternalEntity> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::remote_error(response).await);
        }
        let body: UcEntity = response
            .json()
            .await
            .map_err(|e| SyncError::Network(format!("failed to parse {what} response: {e}")))?;
        body.into_entity(kind)
    }

    async fn remote_error(response: Response) -> SyncError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<UcErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or(text);
        SyncError::Remote { status, message }
    }

    fn list_query(kind: EntityKind, parent: Option<&str>) -> SyncResult<Vec<(&'static str, String)>> {
        let mut query = Vec::new();
        match (kind, parent) {
            (EntityKind::Catalog, _) => {}
            (EntityKind::Schema, Some(catalog)) => {
                query.push(("catalog_name", catalog.to_string()));
            }
            (_, Some(schema)) => {
                let (catalog, schema) = schema.split_once('.').ok_or_else(|| {
                    SyncError::InvalidEntity(format!("{kind} parent {schema} is not a schema name"))
                })?;
                query.push(("catalog_name", catalog.to_string()));
                query.push(("schema_name", schema.to_string()));
            }
            (_, None) => {
                return Err(SyncError::InvalidEntity(format!(
                    "listing {kind} entities requires a parent"
                )));
            }
        }
        Ok(query)
    }
}

#[async_trait]
impl CatalogClient for UnityCatalogClient {
    fn connector_type(&self) -> &str {
        UNITY_CATALOG_CONNECTOR
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list(
        &self,
        kind: EntityKind,
        parent: Option<&str>,
    ) -> SyncResult<Vec<ExternalEntity>> {
        let query = Self::list_query(kind, parent)?;
        let max_results = self.config.page_size.to_string();

        let mut entities = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let mut request = self
                .request(Method::GET, collection(kind))
                .query(&query)
                .query(&[("max_results", max_results.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("page_token", token.as_str())]);
            }

            let response = self.send(request, "list").await?;
            if response.status() == StatusCode::NOT_FOUND {
                if page_token.is_none() {
                    debug!(%kind, parent = ?parent, "parent not found, listing as empty");
                    return Ok(Vec::new());
                }
                return Err(Self::remote_error(response).await);
            }
            if !response.status().is_success() {
                return Err(Self::remote_error(response).await);
            }

            let mut page: UcListPage = response
                .json()
                .await
                .map_err(|e| SyncError::Network(format!("failed to parse {kind} list: {e}")))?;

            for item in page.take_items(kind) {
                entities.push(item.into_entity(kind)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                None => break,
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    warn!(%kind, parent = ?parent, token = %next, "page token repeated, stopping");
                    break;
                }
                Some(next) => page_token = Some(next),
            }
        }

        debug!(%kind, count = entities.len(), "listed");
        Ok(entities)
    }

    async fn get(&self, kind: EntityKind, full_name: &str) -> SyncResult<Fetch<ExternalEntity>> {
        let request = self.request(Method::GET, &Self::entity_path(kind, full_name));
        let response = self.send(request, "get").await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Fetch::Absent);
        }
        Ok(Fetch::Found(Self::read_entity(response, kind, "get").await?))
    }

    async fn create(&self, kind: EntityKind, draft: &RemoteDraft) -> SyncResult<ExternalEntity> {
        let body = UcCreateBody::from_draft(draft);
        let request = self.request(Method::POST, collection(kind));
        let request = if kind == EntityKind::Function {
            request.json(&UcFunctionCreateBody {
                function_info: body,
            })
        } else {
            request.json(&body)
        };

        let response = self.send(request, "create").await?;
        let created = Self::read_entity(response, kind, "create").await?;
        info!(%kind, full_name = %created.full_name, "created in Unity Catalog");
        Ok(created)
    }

    async fn update(
        &self,
        kind: EntityKind,
        full_name: &str,
        draft: &RemoteDraft,
    ) -> SyncResult<ExternalEntity> {
        let body = UcUpdateBody {
            comment: draft.comment.as_deref(),
            properties: supports_properties(kind).then_some(&draft.properties),
        };
        let request = self
            .request(Method::PATCH, &Self::entity_path(kind, full_name))
            .json(&body);

        let response = self.send(request, "update").await?;
        let updated = Self::read_entity(response, kind, "update").await?;
        info!(%kind, %full_name, "updated in Unity Catalog");
        Ok(updated)
    }

    async fn delete(&self, kind: EntityKind, full_name: &str) -> SyncResult<()> {
        let mut request = self.request(Method::DELETE, &Self::entity_path(kind, full_name));
        // Non-empty catalogs and schemas are only deleted with `force`.
        if matches!(kind, EntityKind::Catalog | EntityKind::Schema) {
            request = request.query(&[("force", "true")]);
        }
        let response = self.send(request, "delete").await?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(Self::remote_error(response).await);
        }

        info!(%kind, %full_name, "deleted from Unity Catalog");
        Ok(())
    }
}
