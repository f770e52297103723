//! Session state: identities, document snapshots, dirty tracking, markers,
//! and the observable slots shared with the surrounding UI.
//!
//! Ownership model:
//! - `Session` is immutable for the lifetime of an editing session and is
//!   passed into the controller at construction (never a global).
//! - `DocumentSnapshot` values are immutable once fetched; a newer fetch
//!   supersedes the previous snapshot, nothing mutates it in place.
//! - `DirtyTracker` and `MarkerStore` are owned by the controller and mutated
//!   only from its single event-handling thread.
//! - `Slot<T>` is the cross-component notification primitive: a read/write
//!   value with subscription semantics, cheap to clone and hand out.
//!
//! Nothing in this crate performs IO; it is pure data plus transition logic
//! so the controller's behavior can be asserted without a widget or a store.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod dirty;
pub mod guard;
pub mod markers;
pub mod slot;

pub use dirty::{ChangeKind, ContentChange, DirtyState, DirtyTracker};
pub use markers::{Marker, MarkerStore};
pub use slot::Slot;

/// Identity of an authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable workflow identifier (the `id` of a SWADL document).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version number of a stored workflow. Versions increase monotonically per
/// workflow; the highest is the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub u64);

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// The locally authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub current_user_id: UserId,
}

impl Session {
    pub fn new(current_user_id: UserId) -> Self {
        Self { current_user_id }
    }
}

/// Which document, and which historical version of it, is selected.
/// `active_version == None` selects the latest version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowRef {
    pub id: WorkflowId,
    pub active_version: Option<VersionId>,
}

impl WorkflowRef {
    pub fn latest(id: WorkflowId) -> Self {
        Self {
            id,
            active_version: None,
        }
    }

    pub fn at(id: WorkflowId, version: VersionId) -> Self {
        Self {
            id,
            active_version: Some(version),
        }
    }
}

impl fmt::Display for WorkflowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.active_version {
            Some(v) => write!(f, "{}@{}", self.id, v),
            None => write!(f, "{}@latest", self.id),
        }
    }
}

/// Remotely fetched content plus the identity of its author.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub source_text: String,
    pub authored_by: UserId,
}

impl DocumentSnapshot {
    pub fn new(source_text: impl Into<String>, authored_by: UserId) -> Self {
        Self {
            source_text: source_text.into(),
            authored_by,
        }
    }
}

impl fmt::Debug for DocumentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSnapshot")
            .field("len_bytes", &self.source_text.len())
            .field("authored_by", &self.authored_by)
            .finish()
    }
}

/// One row of the workflow listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub latest_version: VersionId,
    pub created_by: UserId,
    #[serde(default)]
    pub description: String,
}

/// Listing slot: `None` means stale (the listing UI refetches on next read).
pub type ListingSlot = Slot<Option<Vec<WorkflowSummary>>>;
