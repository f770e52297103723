//! Tokio event loop driving an [`EditorSession`].
//!
//! All events arrive on one bounded channel and are handled to completion in
//! arrival order. Store calls are spawned as tasks that post their result back
//! onto the same channel, so a completion is just another event.

use crate::{EditorSession, SessionEffect};
use core_events::{
    AsyncEventSource, CHANNEL_SEND_FAILURES, EVENT_CHANNEL_CAP, Event, EventSourceRegistry,
    FETCHES_SPAWNED, FetchTicket, InspectTarget, SAVES_SPAWNED, SaveTicket,
};
use core_state::{ListingSlot, WorkflowSummary};
use core_store::{DocumentStore, NewVersion, StoreError};
use core_widget::WidgetFactory;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

const SOURCE_JOIN_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Break(ShutdownReason),
}

/// Observation points for the embedding binary. Hooks see state, never mutate it.
pub trait RuntimeHooks<F: WidgetFactory> {
    fn post_handle(&mut self, _event: &'static str, _session: &EditorSession<F>) {}
    fn inspect(
        &mut self,
        _target: InspectTarget,
        _session: &EditorSession<F>,
        _listing: &ListingSlot,
    ) {
    }
}

pub struct NoopHooks;

impl<F: WidgetFactory> RuntimeHooks<F> for NoopHooks {}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

pub struct SessionRuntime<S: DocumentStore, F: WidgetFactory> {
    session: EditorSession<F>,
    store: Arc<S>,
    listing: ListingSlot,
    listing_in_flight: bool,
    hooks: Box<dyn RuntimeHooks<F>>,
    rx: Receiver<Event>,
    tx: Option<Sender<Event>>,
    source_handles: Vec<JoinHandle<()>>,
    store_tasks: Vec<JoinHandle<()>>,
}

impl<S: DocumentStore, F: WidgetFactory> SessionRuntime<S, F> {
    pub fn new(session: EditorSession<F>, store: Arc<S>, listing: ListingSlot) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAP);
        Self {
            session,
            store,
            listing,
            listing_in_flight: false,
            hooks: Box::new(NoopHooks),
            rx,
            tx: Some(tx),
            source_handles: Vec::new(),
            store_tasks: Vec::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: Box<dyn RuntimeHooks<F>>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sender for external producers. `None` once shutdown has begun.
    pub fn sender(&self) -> Option<Sender<Event>> {
        self.tx.clone()
    }

    pub fn session(&self) -> &EditorSession<F> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession<F> {
        &mut self.session
    }

    pub fn listing(&self) -> &ListingSlot {
        &self.listing
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Spawn every registered event source against this runtime's channel.
    pub fn spawn_sources(&mut self, registry: &mut EventSourceRegistry) {
        if let Some(tx) = self.tx.as_ref() {
            self.source_handles.extend(registry.spawn_all(tx));
        }
    }

    pub fn spawn_source<E: AsyncEventSource>(&mut self, source: E) {
        let mut registry = EventSourceRegistry::new();
        registry.register(source);
        self.spawn_sources(&mut registry);
    }

    /// Drain the channel until a shutdown event or channel closure.
    pub async fn run(&mut self) -> ShutdownReason {
        let span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter = span.enter();

        let mut reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            if let LoopControl::Break(r) = self.dispatch(event) {
                reason = r;
                break;
            }
        }

        self.rx.close();
        self.finalize_shutdown(reason).await;
        reason
    }

    /// Receive and handle exactly one event. Returns `None` when the channel
    /// is closed.
    pub async fn pump(&mut self) -> Option<LoopControl> {
        let event = self.rx.recv().await?;
        Some(self.dispatch(event))
    }

    /// Handle one event synchronously, spawning whatever store work it needs.
    pub fn dispatch(&mut self, event: Event) -> LoopControl {
        let name = event.name();
        trace!(target: "runtime.events", event = name, "dispatch");
        match event {
            Event::Shutdown => {
                info!(target: "runtime", "shutdown_requested");
                return LoopControl::Break(ShutdownReason::ShutdownEvent);
            }
            Event::ListingRequested => self.request_listing(),
            Event::ListingLoaded(result) => self.on_listing_loaded(result),
            Event::Inspect(target) => self.hooks.inspect(target, &self.session, &self.listing),
            other => {
                for effect in self.session.handle(other) {
                    self.execute(effect);
                }
            }
        }
        self.hooks.post_handle(name, &self.session);
        LoopControl::Continue
    }

    fn execute(&mut self, effect: SessionEffect) {
        let Some(tx) = self.tx.clone() else {
            warn!(target: "runtime", "effect_dropped_during_shutdown");
            return;
        };
        self.store_tasks.retain(|h| !h.is_finished());
        let store = Arc::clone(&self.store);
        let handle = match effect {
            SessionEffect::Fetch(ticket) => {
                FETCHES_SPAWNED.fetch_add(1, Ordering::Relaxed);
                tokio::spawn(run_fetch(store, tx, ticket))
            }
            SessionEffect::Submit(ticket, version) => {
                SAVES_SPAWNED.fetch_add(1, Ordering::Relaxed);
                tokio::spawn(run_save(store, tx, ticket, version))
            }
        };
        self.store_tasks.push(handle);
    }

    /// Refetch the listing when it is stale; otherwise report the cached one.
    fn request_listing(&mut self) {
        if self.listing.read().is_some() {
            self.hooks
                .inspect(InspectTarget::Listing, &self.session, &self.listing);
            return;
        }
        if self.listing_in_flight {
            trace!(target: "runtime", "listing_fetch_already_in_flight");
            return;
        }
        let Some(tx) = self.tx.clone() else {
            return;
        };
        self.listing_in_flight = true;
        let store = Arc::clone(&self.store);
        self.store_tasks.push(tokio::spawn(async move {
            let result = store.list_workflows().await;
            send_event(&tx, Event::ListingLoaded(result)).await;
        }));
    }

    fn on_listing_loaded(&mut self, result: Result<Vec<WorkflowSummary>, StoreError>) {
        self.listing_in_flight = false;
        match result {
            Ok(summaries) => {
                debug!(target: "runtime", count = summaries.len(), "listing_loaded");
                self.listing.set(Some(summaries));
                self.hooks
                    .inspect(InspectTarget::Listing, &self.session, &self.listing);
            }
            Err(e) => {
                warn!(target: "runtime", error = %e, "listing_failed");
                self.session.status().notify(true, &e.to_string());
            }
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        if let Some(tx) = self.tx.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "dropping_runtime_sender"
            );
            drop(tx);
        }

        for handle in self.store_tasks.drain(..) {
            if !handle.is_finished() {
                trace!(target: "runtime.shutdown", reason = reason.as_str(), "store_task_aborted");
                handle.abort();
            }
        }

        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(SOURCE_JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_stopped"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "event_source_task_error"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }

        log_shutdown_stage(reason, "complete");
    }
}

async fn run_fetch<S: DocumentStore>(store: Arc<S>, tx: Sender<Event>, ticket: FetchTicket) {
    let result = store.fetch_document(&ticket.workflow).await;
    send_event(&tx, Event::FetchCompleted { ticket, result }).await;
}

async fn run_save<S: DocumentStore>(
    store: Arc<S>,
    tx: Sender<Event>,
    ticket: SaveTicket,
    version: NewVersion,
) {
    let result = store.create_version(version).await;
    send_event(&tx, Event::SaveCompleted { ticket, result }).await;
}

async fn send_event(tx: &Sender<Event>, event: Event) {
    let name = event.name();
    if tx.send(event).await.is_err() {
        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
        debug!(target: "runtime.events", event = name, "completion_dropped_channel_closed");
    }
}
