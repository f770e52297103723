//! Event types and async event sources for the editor session runtime.
//!
//! Every input to the session controller arrives as an [`Event`] on one
//! bounded channel and is handled to completion before the next one is read.
//! Store responses are events too: the runtime spawns each store call as a
//! task that posts `FetchCompleted` / `SaveCompleted` back onto the channel,
//! so completions interleave with user input but never run concurrently with it.

use core_keymap::KeyCombo;
use core_state::{ContentChange, DocumentSnapshot, Marker, WorkflowRef, WorkflowSummary};
use core_store::StoreError;
use std::sync::atomic::AtomicU64;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Bounded mpsc channel sized by `EVENT_CHANNEL_CAP`. Producers (stdin source, store tasks) await
// capacity rather than dropping events: losing a `SaveCompleted` would leave the session stuck in
// the saving state.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static FETCHES_SPAWNED: AtomicU64 = AtomicU64::new(0);
pub static SAVES_SPAWNED: AtomicU64 = AtomicU64::new(0);

/// Identity of a fetch: the selection generation it was issued for plus the
/// reference it targets. A completion is applied only if both still match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub generation: u64,
    pub workflow: WorkflowRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaveTicket(pub u64);

/// Identity of a snippet request. Two requests with the same id are the same
/// request, however many times it is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnippetId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRequest {
    pub id: SnippetId,
    pub text: String,
}

impl SnippetRequest {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id: SnippetId(id),
            text: text.into(),
        }
    }
}

/// Read-only views the runtime hands to its hooks on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectTarget {
    Problems,
    Buffer,
    Listing,
}

/// Top-level event enum consumed by the session runtime.
#[derive(Debug, Clone)]
pub enum Event {
    /// Document or version selection changed (`None`: nothing open).
    Select(Option<WorkflowRef>),
    /// Text typed by the user at the caret.
    TextInput(String),
    /// Content-change notification from an external widget.
    Content(ContentChange),
    /// Validation pass result from an external validation engine.
    Markers(Vec<Marker>),
    /// A key combo pressed inside the widget.
    Key(KeyCombo),
    /// Explicit save action (toolbar button).
    SaveRequested,
    Snippet(SnippetRequest),
    Goto {
        line: usize,
        column: usize,
    },
    GotoProblem(usize),
    /// Listing UI wants the workflow list (refetched only if stale).
    ListingRequested,
    FetchCompleted {
        ticket: FetchTicket,
        result: Result<DocumentSnapshot, StoreError>,
    },
    SaveCompleted {
        ticket: SaveTicket,
        result: Result<(), StoreError>,
    },
    ListingLoaded(Result<Vec<WorkflowSummary>, StoreError>),
    /// Ask the runtime hooks to report on session state; no state change.
    Inspect(InspectTarget),
    Shutdown,
}

impl Event {
    /// Stable short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Select(_) => "select",
            Event::TextInput(_) => "text_input",
            Event::Content(_) => "content",
            Event::Markers(_) => "markers",
            Event::Key(_) => "key",
            Event::SaveRequested => "save_requested",
            Event::Snippet(_) => "snippet",
            Event::Goto { .. } => "goto",
            Event::GotoProblem(_) => "goto_problem",
            Event::ListingRequested => "listing_requested",
            Event::FetchCompleted { .. } => "fetch_completed",
            Event::SaveCompleted { .. } => "save_completed",
            Event::ListingLoaded(_) => "listing_loaded",
            Event::Inspect(_) => "inspect",
            Event::Shutdown => "shutdown",
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------

/// Trait implemented by any async event producer (stdin commands, a selection UI bridge, a
/// wizard emitting snippets). Each source spawns one background task that pushes `Event`s into
/// the shared channel and stops when `tx.send(..).await` returns Err (channel closed).
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task, returning a JoinHandle.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }
    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }
    pub fn len(&self) -> usize {
        self.sources.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
    /// Spawn all registered sources, returning their JoinHandles. Each source receives its own
    /// clone of `tx`; the registry is drained so a second call spawns nothing.
    ///
    /// During shutdown the caller should drop its final `Sender` clone before awaiting the
    /// returned handles so the sources observe the closed channel and exit cooperatively.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}
