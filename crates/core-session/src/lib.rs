//! Editor session controller.
//!
//! `EditorSession` keeps one editing widget in sync with the selected workflow
//! version and coordinates everything that touches it: the single-author
//! write guard, dirty tracking, saves, snippet insertion and diagnostics
//! navigation.
//!
//! The controller is synchronous. Whenever it needs the store it returns a
//! [`SessionEffect`]; [`runtime::SessionRuntime`] executes effects on tokio and
//! feeds the completions back as events. This keeps every state transition a
//! plain method call, so tests drive the controller directly and resolve
//! tickets in whatever order they like.
//!
//! Module map:
//! * `sync`      selection, fetch completion, rebinding
//! * `save`      save preconditions and completion
//! * `snippet`   external text insertion
//! * `navigator` problem list, goto, layout
//! * `runtime`   tokio event loop and store task spawning

use core_config::Config;
use core_events::{Event, FetchTicket, SaveTicket, SnippetId};
use core_keymap::{KeyCombo, ShortcutCommand};
use core_state::{
    ContentChange, DirtyState, DirtyTracker, DocumentSnapshot, Marker, MarkerStore, Session,
    WorkflowRef, guard,
};
use core_store::NewVersion;
use core_widget::{TextWidget, WidgetFactory};
use std::collections::HashSet;
use tracing::{debug, trace};

mod error;
pub mod navigator;
pub mod runtime;
mod save;
mod snippet;
pub mod status;
mod sync;

pub use error::{PreconditionViolation, SessionError};
pub use navigator::{Layout, ProblemEntry};
pub use status::{ListingCache, StatusNotice, StatusSink};

/// Store work requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    Fetch(FetchTicket),
    Submit(SaveTicket, NewVersion),
}

/// What the editor area shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionView {
    /// No workflow selected; presentation offers to create one.
    #[default]
    Empty,
    Editor,
}

/// Values the controller takes from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub schema_uri: String,
    pub language: String,
    /// Widget theme identifier (`vs-light` / `vs-dark`).
    pub theme: String,
    pub save_label: String,
    pub save_shortcut: KeyCombo,
    pub success_message: String,
}

impl SessionSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            schema_uri: cfg.file.schema.uri.clone(),
            language: cfg.file.editor.language.clone(),
            theme: cfg.file.editor.theme.widget_theme().to_string(),
            save_label: cfg.file.save.label.clone(),
            save_shortcut: cfg.save_shortcut(),
            success_message: cfg.file.save.success_message.clone(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct EditorSession<F: WidgetFactory> {
    session: Session,
    settings: SessionSettings,
    factory: F,
    widget: Option<F::Widget>,
    status: Box<dyn StatusSink>,
    listing: Box<dyn ListingCache>,
    /// Latest requested selection; `None` when nothing is open.
    selection: Option<WorkflowRef>,
    generation: u64,
    snapshot: Option<DocumentSnapshot>,
    view: SessionView,
    dirty: DirtyTracker,
    markers: MarkerStore,
    saving: Option<SaveTicket>,
    next_save: u64,
    /// Selection made while a save was in flight, applied on its completion.
    deferred: Option<Option<WorkflowRef>>,
    /// A current fetch that resolved while a save was in flight.
    held_fetch: Option<FetchTicket>,
    consumed_snippets: HashSet<SnippetId>,
}

impl<F: WidgetFactory> EditorSession<F> {
    pub fn new(
        session: Session,
        settings: SessionSettings,
        factory: F,
        status: Box<dyn StatusSink>,
        listing: Box<dyn ListingCache>,
    ) -> Self {
        Self {
            session,
            settings,
            factory,
            widget: None,
            status,
            listing,
            selection: None,
            generation: 0,
            snapshot: None,
            view: SessionView::Empty,
            dirty: DirtyTracker::new(),
            markers: MarkerStore::new(),
            saving: None,
            next_save: 0,
            deferred: None,
            held_fetch: None,
            consumed_snippets: HashSet::new(),
        }
    }

    /// Route one event to the matching operation. Events that belong to the
    /// runtime (listing, inspection, shutdown) are ignored here.
    pub fn handle(&mut self, event: Event) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        match event {
            Event::Select(selection) => effects.extend(self.select_document(selection)),
            Event::TextInput(text) => self.type_text(&text),
            Event::Content(change) => self.on_content_change(&change),
            Event::Markers(markers) => self.on_markers(markers),
            Event::Key(combo) => {
                if let Some(effect) = self.on_key(&combo) {
                    effects.push(effect);
                }
            }
            Event::SaveRequested => {
                if let Ok(effect) = self.save() {
                    effects.push(effect);
                }
            }
            Event::Snippet(request) => {
                self.insert_snippet(request);
            }
            Event::Goto { line, column } => self.goto(line, column),
            Event::GotoProblem(index) => {
                self.goto_problem(index);
            }
            Event::FetchCompleted { ticket, result } => {
                if let Err(e) = self.on_fetch_completed(ticket, result) {
                    debug!(target: "session.sync", error = %e, "fetch_failure_reported");
                }
            }
            Event::SaveCompleted { ticket, result } => {
                effects.extend(self.on_save_completed(ticket, result));
            }
            other @ (Event::ListingRequested
            | Event::ListingLoaded(_)
            | Event::Inspect(_)
            | Event::Shutdown) => {
                trace!(target: "session", event = other.name(), "event_not_for_session");
            }
        }
        effects
    }

    /// User keystrokes at the caret. Dropped while the widget is read-only.
    pub fn type_text(&mut self, text: &str) {
        if self.snapshot.is_none() {
            trace!(target: "session", "typing_without_document");
            return;
        }
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        if let Some(change) = widget.type_text(text) {
            self.dirty.apply(&change);
            self.collect_markers();
        }
    }

    /// Content-change notification reported by an external widget.
    pub fn on_content_change(&mut self, change: &ContentChange) {
        if self.snapshot.is_none() {
            trace!(target: "session", "content_change_without_document");
            return;
        }
        self.dirty.apply(change);
    }

    /// Validation pass reported by an external validation engine.
    pub fn on_markers(&mut self, markers: Vec<Marker>) {
        if self.snapshot.is_none() {
            trace!(target: "session", count = markers.len(), "markers_without_document");
            return;
        }
        self.markers.replace(markers);
    }

    fn on_key(&mut self, combo: &KeyCombo) -> Option<SessionEffect> {
        let command = self.widget.as_ref()?.shortcut(combo)?;
        match command {
            ShortcutCommand::Save => self.save().ok(),
        }
    }

    /// Replace the marker set with the widget's latest validation pass, if any.
    fn collect_markers(&mut self) {
        if let Some(markers) = self.widget.as_mut().and_then(TextWidget::take_markers) {
            trace!(target: "session", count = markers.len(), "markers_collected");
            self.markers.replace(markers);
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn widget(&self) -> Option<&F::Widget> {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> Option<&mut F::Widget> {
        self.widget.as_mut()
    }

    pub fn selection(&self) -> Option<&WorkflowRef> {
        self.selection.as_ref()
    }

    pub fn snapshot(&self) -> Option<&DocumentSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn view(&self) -> SessionView {
        self.view
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty.state()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    /// `None` when no document is open.
    pub fn is_writable(&self) -> Option<bool> {
        self.snapshot
            .as_ref()
            .map(|snapshot| guard::is_writable(snapshot, &self.session))
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    /// Current buffer text, if a widget exists.
    pub fn buffer_text(&self) -> Option<String> {
        self.widget.as_ref().map(TextWidget::value)
    }

    pub fn status(&self) -> &dyn StatusSink {
        self.status.as_ref()
    }
}
