//! Buffer synchronization: selection changes, fetch completion, rebinding.
//!
//! Every selection bumps `generation`. A fetch completion is applied only if
//! its ticket still names the current generation and reference, so a slow
//! response for a document the user already left can never overwrite the
//! buffer. Selections made while a save is in flight are held back and
//! replayed once the save completes. A fetch that lands during a save is not
//! bound either: the buffer being published stays in place until the store
//! answers.

use crate::{EditorSession, SessionEffect, SessionError, SessionView};
use core_events::FetchTicket;
use core_keymap::ShortcutCommand;
use core_state::{DocumentSnapshot, WorkflowRef, guard};
use core_store::StoreError;
use core_widget::{TextWidget, WidgetFactory, WidgetOptions};
use tracing::{debug, info, trace, warn};

impl<F: WidgetFactory> EditorSession<F> {
    /// Select a workflow version, or close the editor with `None`.
    ///
    /// Returns the fetch to run, if any. Nothing is returned while a save is
    /// in flight: the selection is queued and replayed by `on_save_completed`.
    pub fn select_document(&mut self, selection: Option<WorkflowRef>) -> Option<SessionEffect> {
        if self.saving.is_some() {
            debug!(
                target: "session.sync",
                workflow = selection.as_ref().map(ToString::to_string).as_deref(),
                "selection_deferred_until_save_completes"
            );
            self.deferred = Some(selection);
            return None;
        }

        self.generation += 1;
        self.selection = selection.clone();
        match selection {
            None => {
                self.close_document();
                None
            }
            Some(workflow) => {
                debug!(
                    target: "session.sync",
                    workflow = %workflow,
                    generation = self.generation,
                    "fetch_requested"
                );
                Some(SessionEffect::Fetch(FetchTicket {
                    generation: self.generation,
                    workflow,
                }))
            }
        }
    }

    /// Apply a fetch result. Stale tickets are dropped without any visible
    /// effect. Failures are reported on the status channel and returned; the
    /// current buffer stays as it was.
    pub fn on_fetch_completed(
        &mut self,
        ticket: FetchTicket,
        result: Result<DocumentSnapshot, StoreError>,
    ) -> Result<(), SessionError> {
        if !self.is_current(&ticket) {
            debug!(
                target: "session.sync",
                workflow = %ticket.workflow,
                generation = ticket.generation,
                current = self.generation,
                "stale_fetch_discarded"
            );
            return Ok(());
        }

        match result {
            Ok(_) if self.saving.is_some() => {
                debug!(
                    target: "session.sync",
                    workflow = %ticket.workflow,
                    generation = ticket.generation,
                    "fetch_held_until_save_completes"
                );
                self.held_fetch = Some(ticket);
                Ok(())
            }
            Ok(snapshot) => {
                self.bind_snapshot(snapshot);
                Ok(())
            }
            Err(e) => {
                warn!(target: "session.sync", workflow = %ticket.workflow, error = %e, "fetch_failed");
                let err = SessionError::Fetch(e);
                self.status.notify(true, &err.user_message());
                Err(err)
            }
        }
    }

    pub(crate) fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && self.selection.as_ref() == Some(&ticket.workflow)
    }

    fn bind_snapshot(&mut self, snapshot: DocumentSnapshot) {
        self.markers.clear();
        let read_only = guard::read_only_for(&snapshot, &self.session);

        match self.widget.as_mut() {
            Some(widget) => {
                widget.replace_value(&snapshot.source_text);
                widget.set_read_only(read_only);
                trace!(target: "session.sync", read_only, "widget_rebound");
            }
            None => {
                let widget = self.factory.create(WidgetOptions {
                    text: snapshot.source_text.clone(),
                    read_only,
                    language: self.settings.language.clone(),
                    theme: self.settings.theme.clone(),
                    model_uri: self.settings.schema_uri.clone(),
                });
                self.attach_widget(widget);
            }
        }

        self.dirty.rebind(&snapshot.source_text);
        info!(
            target: "session.sync",
            len_bytes = snapshot.source_text.len(),
            authored_by = %snapshot.authored_by,
            read_only,
            "snapshot_bound"
        );
        self.snapshot = Some(snapshot);
        self.collect_markers();
        self.view = SessionView::Editor;
    }

    /// One-shot setup for a freshly created widget.
    fn attach_widget(&mut self, mut widget: F::Widget) {
        let combo = self.settings.save_shortcut;
        let registration = widget.register_shortcut(combo, ShortcutCommand::Save);
        debug!(
            target: "session.sync",
            combo = %combo,
            registration = ?registration,
            "widget_attached"
        );
        self.widget = Some(widget);
    }

    fn close_document(&mut self) {
        if let Some(widget) = self.widget.as_mut() {
            widget.replace_value("");
            widget.set_read_only(true);
            // Validation of the blank model is not a diagnostic for any document.
            let _ = widget.take_markers();
        }
        self.markers.clear();
        self.snapshot = None;
        self.dirty.rebind("");
        self.view = SessionView::Empty;
        info!(target: "session.sync", generation = self.generation, "document_closed");
    }
}
