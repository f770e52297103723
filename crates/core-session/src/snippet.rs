//! Snippet injection from external producers (e.g. the activity wizard).

use crate::EditorSession;
use core_events::SnippetRequest;
use core_widget::{TextWidget, WidgetFactory};
use tracing::{debug, trace};

/// Edit source reported to the widget for inserted snippets.
pub const SNIPPET_EDIT_SOURCE: &str = "wizard";

impl<F: WidgetFactory> EditorSession<F> {
    /// Insert a snippet at the widget's selection as one user edit.
    ///
    /// Each request id is consumed on first delivery, whether or not it could
    /// be applied. Returns true when the buffer changed.
    pub fn insert_snippet(&mut self, request: SnippetRequest) -> bool {
        if !self.consumed_snippets.insert(request.id) {
            trace!(target: "session.snippet", id = request.id.0, "duplicate_snippet_ignored");
            return false;
        }
        if request.text.is_empty() {
            trace!(target: "session.snippet", id = request.id.0, "empty_snippet_ignored");
            return false;
        }
        if self.snapshot.is_none() {
            debug!(target: "session.snippet", id = request.id.0, "snippet_without_document");
            return false;
        }
        let Some(widget) = self.widget.as_mut() else {
            debug!(target: "session.snippet", id = request.id.0, "snippet_without_widget");
            return false;
        };
        if widget.is_read_only() {
            debug!(target: "session.snippet", id = request.id.0, "snippet_refused_read_only");
            return false;
        }

        let change = widget.apply_edit_at_selection(SNIPPET_EDIT_SOURCE, &request.text);
        widget.focus();
        let state = self.dirty.apply(&change);
        debug!(
            target: "session.snippet",
            id = request.id.0,
            len_bytes = request.text.len(),
            dirty = state.as_str(),
            "snippet_inserted"
        );
        self.collect_markers();
        true
    }
}
