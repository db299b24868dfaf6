use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{error::RoleStoreError, models::Role};

/// Collection holding one record per identity, keyed by identity id.
pub const USERS_COLLECTION: &str = "users";

/// Record
///
/// A single document from the external store, flattened to plain JSON values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub key: String,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(key: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// The record's role, if the `role` field is exactly one of the known values.
    /// Missing, empty, padded, non-string and unknown values all yield `None`.
    pub fn role(&self) -> Option<Role> {
        self.fields
            .get("role")
            .and_then(Value::as_str)
            .and_then(|value| value.parse().ok())
    }
}

/// RecordStore Contract
///
/// Async keyed point reads against the external document store. `Ok(None)` means
/// the document does not exist; `Err` means the store could not answer.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_record(&self, collection: &str, key: &str)
    -> Result<Option<Record>, RoleStoreError>;
}

/// RecordStoreState
///
/// The concrete type used to share record store access across the application state.
pub type RecordStoreState = Arc<dyn RecordStore>;

// --- In-Memory Implementation (local development and tests) ---

/// InMemoryRecordStore
///
/// Documents held in a process-local map. `new_failing()` builds a store whose every
/// lookup reports the store as unavailable.
#[derive(Default)]
pub struct InMemoryRecordStore {
    documents: RwLock<HashMap<(String, String), Map<String, Value>>>,
    should_fail: bool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Seeds the `users` collection from JSON shaped like
    /// `{ "<identity id>": { "role": "elder" }, ... }`.
    pub fn from_users_json(json: &str) -> Result<Self, RoleStoreError> {
        let users: HashMap<String, Map<String, Value>> = serde_json::from_str(json)
            .map_err(|e| RoleStoreError::Malformed(format!("user seed: {}", e)))?;

        let store = Self::new();
        for (id, fields) in users {
            store.insert(USERS_COLLECTION, &id, fields);
        }
        Ok(store)
    }

    pub fn insert(&self, collection: &str, key: &str, fields: Map<String, Value>) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((collection.to_string(), key.to_string()), fields);
    }

    /// Writes (or overwrites) the `role` field of a user record.
    pub fn set_user_role(&self, id: &str, role: Role) {
        let mut fields = Map::new();
        fields.insert("role".to_string(), Value::from(role.as_str()));
        self.insert(USERS_COLLECTION, id, fields);
    }

    pub fn with_user_role(self, id: &str, role: Role) -> Self {
        self.set_user_role(id, role);
        self
    }

    pub fn remove(&self, collection: &str, key: &str) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(collection.to_string(), key.to_string()));
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_record(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Record>, RoleStoreError> {
        if self.should_fail {
            return Err(RoleStoreError::Unavailable(
                "in-memory store configured to fail".to_string(),
            ));
        }

        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents
            .get(&(collection.to_string(), key.to_string()))
            .map(|fields| Record::new(key, fields.clone())))
    }
}

// --- Firestore REST Implementation ---

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// FirestoreRecordStore
///
/// Thin adapter over the Firestore REST document endpoint:
/// `GET {base}/projects/{project}/databases/(default)/documents/{collection}/{key}`.
/// A 404 is a missing document; any other non-success status is an outage.
#[derive(Clone)]
pub struct FirestoreRecordStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreRecordStore {
    pub fn new(base_url: &str, project_id: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            api_key,
        }
    }

    fn document_url(&self, collection: &str, key: &str) -> Result<Url, RoleStoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RoleStoreError::Unavailable(format!("bad base url: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| RoleStoreError::Unavailable("base url cannot hold a path".to_string()))?
            .extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                collection,
                key,
            ]);

        if let Some(api_key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", api_key);
        }
        Ok(url)
    }
}

#[async_trait]
impl RecordStore for FirestoreRecordStore {
    async fn get_record(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Record>, RoleStoreError> {
        // These would address the collection itself rather than a document.
        if matches!(key, "" | "." | "..") {
            return Ok(None);
        }

        let url = self.document_url(collection, key)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RoleStoreError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(RoleStoreError::Unavailable(format!(
                    "firestore answered {}",
                    status
                )));
            }
            _ => {}
        }

        let document: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| RoleStoreError::Malformed(e.to_string()))?;

        let fields = document
            .fields
            .iter()
            .filter_map(|(name, typed)| plain_value(typed).map(|v| (name.clone(), v)))
            .collect();

        Ok(Some(Record::new(key, fields)))
    }
}

/// Unwraps a Firestore typed value (`{"stringValue": "elder"}`) into plain JSON.
/// Maps, arrays, references and timestamps are not needed here and are dropped.
fn plain_value(typed: &Value) -> Option<Value> {
    let typed = typed.as_object()?;
    if let Some(value) = typed.get("stringValue").or_else(|| typed.get("booleanValue")) {
        return Some(value.clone());
    }
    if let Some(value) = typed.get("doubleValue") {
        return Some(value.clone());
    }
    if let Some(value) = typed.get("integerValue") {
        // Firestore serializes int64 as a decimal string.
        return value
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .or_else(|| Some(value.clone()));
    }
    if typed.contains_key("nullValue") {
        return Some(Value::Null);
    }
    None
}
