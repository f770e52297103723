//! In-memory versioned workflow store.
//!
//! Every workflow keeps its full version history. New versions are routed by
//! the `id` declared at the top of the SWADL source, and only the author of the
//! latest version may publish a newer one.

use crate::{DocumentStore, NewVersion, StoreError};
use core_state::{DocumentSnapshot, UserId, VersionId, WorkflowId, WorkflowRef, WorkflowSummary};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct StoredVersion {
    version: VersionId,
    swadl: String,
    created_by: UserId,
    description: String,
}

/// One seed record (JSON), appended as the next version of `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub id: WorkflowId,
    pub swadl: String,
    pub created_by: UserId,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    workflows: Mutex<BTreeMap<WorkflowId, Vec<StoredVersion>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(entries: Vec<SeedEntry>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.workflows.lock() {
            for entry in entries {
                append(&mut map, entry.id, entry.swadl, entry.created_by, entry.description);
            }
        }
        store
    }

    /// Parse a JSON array of [`SeedEntry`] records.
    pub fn from_seed_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<SeedEntry> = serde_json::from_str(json)?;
        Ok(Self::from_seed(entries))
    }

    /// Insert a version directly, bypassing authorship checks.
    pub fn insert(
        &self,
        id: WorkflowId,
        swadl: impl Into<String>,
        created_by: UserId,
    ) -> Result<VersionId, StoreError> {
        let mut map = self.lock()?;
        Ok(append(&mut map, id, swadl.into(), created_by, String::new()))
    }

    pub fn version_count(&self, id: &WorkflowId) -> usize {
        self.lock()
            .map(|map| map.get(id).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<WorkflowId, Vec<StoredVersion>>>, StoreError> {
        self.workflows
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn fetch_now(&self, workflow: &WorkflowRef) -> Result<DocumentSnapshot, StoreError> {
        let map = self.lock()?;
        let versions = map
            .get(&workflow.id)
            .ok_or_else(|| StoreError::NotFound(workflow.id.to_string()))?;
        let found = match workflow.active_version {
            Some(v) => versions.iter().find(|s| s.version == v),
            None => versions.last(),
        };
        let stored = found.ok_or_else(|| StoreError::NotFound(workflow.to_string()))?;
        debug!(target: "store", workflow = %workflow, version = %stored.version, "fetch_ok");
        Ok(DocumentSnapshot::new(
            stored.swadl.clone(),
            stored.created_by.clone(),
        ))
    }

    fn create_now(&self, version: NewVersion) -> Result<(), StoreError> {
        let id = declared_workflow_id(&version.content)?;
        let mut map = self.lock()?;
        if let Some(latest) = map.get(&id).and_then(|v| v.last())
            && latest.created_by != version.author_id
        {
            return Err(StoreError::Rejected(format!(
                "Only {} can publish new versions of {}",
                latest.created_by, id
            )));
        }
        let NewVersion {
            content,
            author_id,
            label,
        } = version;
        let assigned = append(&mut map, id.clone(), content, author_id, label);
        info!(target: "store", workflow = %id, version = %assigned, "version_created");
        Ok(())
    }

    fn list_now(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        let map = self.lock()?;
        Ok(map
            .iter()
            .filter_map(|(id, versions)| {
                versions.last().map(|latest| WorkflowSummary {
                    id: id.clone(),
                    latest_version: latest.version,
                    created_by: latest.created_by.clone(),
                    description: latest.description.clone(),
                })
            })
            .collect())
    }
}

fn append(
    map: &mut BTreeMap<WorkflowId, Vec<StoredVersion>>,
    id: WorkflowId,
    swadl: String,
    created_by: UserId,
    description: String,
) -> VersionId {
    let versions = map.entry(id).or_default();
    let next = VersionId(versions.last().map_or(1, |v| v.version.0 + 1));
    versions.push(StoredVersion {
        version: next,
        swadl,
        created_by,
        description,
    });
    next
}

/// Extract the top-level `id` a SWADL document declares. YAML reads
/// `id: 123` as a number; any scalar string or number is accepted.
fn declared_workflow_id(content: &str) -> Result<WorkflowId, StoreError> {
    use serde_yaml::Value;

    let value: Value = serde_yaml::from_str(content)
        .map_err(|e| StoreError::Rejected(format!("Invalid workflow: {e}")))?;
    match value.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(WorkflowId::new(id.as_str())),
        Some(Value::Number(n)) => Ok(WorkflowId::new(n.to_string())),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Err(StoreError::Rejected("Workflow id is missing".into()))
        }
        Some(_) => Err(StoreError::Rejected(
            "Workflow id must be a string or a number".into(),
        )),
    }
}

impl DocumentStore for MemoryStore {
    async fn fetch_document(&self, workflow: &WorkflowRef) -> Result<DocumentSnapshot, StoreError> {
        self.fetch_now(workflow)
    }

    async fn create_version(&self, version: NewVersion) -> Result<(), StoreError> {
        self.create_now(version)
    }

    async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        self.list_now()
    }
}
