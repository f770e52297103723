//! Remote document store seam.
//!
//! The controller never talks to a transport directly. It asks for a
//! [`DocumentStore`] implementation and runs its futures on the runtime,
//! so the store may be HTTP, IPC, or the in-memory [`MemoryStore`] used by
//! the binary and the tests. The persisted format is opaque text.

use core_state::{DocumentSnapshot, UserId, WorkflowRef, WorkflowSummary};
use std::future::Future;
use thiserror::Error;

mod memory;
pub use memory::{MemoryStore, SeedEntry};

/// Store failures. `Display` is the user-facing message routed to the
/// status channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Workflow {0} not found")]
    NotFound(String),
    #[error("{0}")]
    Rejected(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Payload for publishing a new version.
#[derive(Clone, PartialEq, Eq)]
pub struct NewVersion {
    pub content: String,
    pub author_id: UserId,
    pub label: String,
}

impl std::fmt::Debug for NewVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewVersion")
            .field("len_bytes", &self.content.len())
            .field("author_id", &self.author_id)
            .field("label", &self.label)
            .finish()
    }
}

/// Async document store. Futures must be `Send` so the runtime can spawn them.
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetch the selected version (or latest) of a workflow.
    fn fetch_document(
        &self,
        workflow: &WorkflowRef,
    ) -> impl Future<Output = Result<DocumentSnapshot, StoreError>> + Send;

    /// Publish `version` as the newest version of the workflow it declares.
    fn create_version(
        &self,
        version: NewVersion,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Summaries of all known workflows, for the listing UI.
    fn list_workflows(
        &self,
    ) -> impl Future<Output = Result<Vec<WorkflowSummary>, StoreError>> + Send;
}

impl<S: DocumentStore> DocumentStore for std::sync::Arc<S> {
    fn fetch_document(
        &self,
        workflow: &WorkflowRef,
    ) -> impl Future<Output = Result<DocumentSnapshot, StoreError>> + Send {
        (**self).fetch_document(workflow)
    }

    fn create_version(
        &self,
        version: NewVersion,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).create_version(version)
    }

    fn list_workflows(
        &self,
    ) -> impl Future<Output = Result<Vec<WorkflowSummary>, StoreError>> + Send {
        (**self).list_workflows()
    }
}
