#![allow(dead_code)] // Shared across integration test binaries; each uses a subset.

use core_events::{FetchTicket, SaveTicket};
use core_session::{EditorSession, ListingCache, SessionEffect, SessionSettings, StatusNotice};
use core_state::{DocumentSnapshot, Session, UserId, WorkflowId, WorkflowRef, WorkflowSummary};
use core_store::{DocumentStore, MemoryStore, NewVersion, StoreError};
use core_widget::HeadlessFactory;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::fmt::MakeWriter;

pub const PING: &str = "id: ping\nactivities:\n  - send-message:\n      id: pong\n      content: pong\n";
pub const ECHO: &str = "id: echo\nactivities:\n  - send-message:\n      id: reply\n      content: echo\n";

/// Viewport height small enough that centering is observable in short documents.
pub const VIEWPORT_HEIGHT: usize = 4;

pub fn alice() -> UserId {
    UserId::new("alice")
}

pub fn bob() -> UserId {
    UserId::new("bob")
}

pub fn latest(id: &str) -> WorkflowRef {
    WorkflowRef::latest(WorkflowId::new(id))
}

#[derive(Clone, Default)]
pub struct CountingListing {
    count: Arc<AtomicUsize>,
}

impl CountingListing {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ListingCache for CountingListing {
    fn invalidate(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub session: EditorSession<HeadlessFactory>,
    pub status: UnboundedReceiver<StatusNotice>,
    pub listing: CountingListing,
}

impl Harness {
    pub fn new(user: UserId) -> Self {
        Self::with_settings(user, SessionSettings::default())
    }

    pub fn with_settings(user: UserId, settings: SessionSettings) -> Self {
        let (tx, status) = mpsc::unbounded_channel::<StatusNotice>();
        let listing = CountingListing::default();
        let session = EditorSession::new(
            Session::new(user),
            settings,
            HeadlessFactory::new(VIEWPORT_HEIGHT),
            Box::new(tx),
            Box::new(listing.clone()),
        );
        Self {
            session,
            status,
            listing,
        }
    }

    /// Select `workflow` and resolve its fetch with `snapshot` immediately.
    pub fn open(&mut self, workflow: WorkflowRef, snapshot: DocumentSnapshot) {
        let ticket = fetch_ticket(self.session.select_document(Some(workflow)));
        self.session
            .on_fetch_completed(ticket, Ok(snapshot))
            .expect("fetch applies");
    }

    pub fn notices(&mut self) -> Vec<StatusNotice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.status.try_recv() {
            out.push(notice);
        }
        out
    }
}

pub fn fetch_ticket(effect: Option<SessionEffect>) -> FetchTicket {
    match effect {
        Some(SessionEffect::Fetch(ticket)) => ticket,
        other => panic!("expected fetch effect, got {other:?}"),
    }
}

pub fn submission(effect: SessionEffect) -> (SaveTicket, NewVersion) {
    match effect {
        SessionEffect::Submit(ticket, version) => (ticket, version),
        other => panic!("expected submit effect, got {other:?}"),
    }
}

/// `MemoryStore` wrapper that counts calls and can be told to fail saves.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    fetches: AtomicUsize,
    creates: AtomicUsize,
    lists: AtomicUsize,
    fail_creates: Mutex<Option<StoreError>>,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn fail_next_create(&self, err: StoreError) {
        *self.fail_creates.lock().expect("fail flag poisoned") = Some(err);
    }
}

impl DocumentStore for CountingStore {
    async fn fetch_document(&self, workflow: &WorkflowRef) -> Result<DocumentSnapshot, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_document(workflow).await
    }

    async fn create_version(&self, version: NewVersion) -> Result<(), StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let injected = self.fail_creates.lock().expect("fail flag poisoned").take();
        match injected {
            Some(err) => Err(err),
            None => self.inner.create_version(version).await,
        }
    }

    async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_workflows().await
    }
}

/// Log sink for asserting on emitted tracing output.
#[derive(Clone)]
pub struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl BufferWriter {
    pub fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        (Self { inner: buf.clone() }, buf)
    }
}

pub struct LockedWriter<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl Write for LockedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = LockedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriter {
            guard: self.inner.lock().expect("log buffer poisoned"),
        }
    }
}
