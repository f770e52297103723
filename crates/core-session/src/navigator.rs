//! Diagnostics navigation: the problem list and jumping to a location.

use crate::EditorSession;
use core_text::Position;
use core_widget::{TextWidget, WidgetFactory};
use tracing::{debug, trace};

/// One row of the problems panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemEntry {
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// `"{line}: {message}"`
    pub label: String,
}

/// Editor area layout. Only marker presence decides the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Large,
    WithProblems,
}

impl<F: WidgetFactory> EditorSession<F> {
    pub fn problems(&self) -> Vec<ProblemEntry> {
        self.markers
            .iter()
            .map(|m| ProblemEntry {
                line: m.line,
                column: m.column,
                message: m.message.clone(),
                label: format!("{}: {}", m.line, m.message),
            })
            .collect()
    }

    pub fn layout(&self) -> Layout {
        if self.markers.is_empty() {
            Layout::Large
        } else {
            Layout::WithProblems
        }
    }

    /// Center `line`, put the caret at (`line`, `column`) and focus the widget.
    pub fn goto(&mut self, line: usize, column: usize) {
        let Some(widget) = self.widget.as_mut() else {
            trace!(target: "session.nav", line, column, "goto_without_widget");
            return;
        };
        widget.reveal_line_in_center(line);
        widget.set_position(Position::new(line, column));
        widget.focus();
        debug!(target: "session.nav", line, column, "goto");
    }

    /// Jump to the `index`-th problem. Returns false when out of range.
    pub fn goto_problem(&mut self, index: usize) -> bool {
        let Some(marker) = self.markers.get(index) else {
            debug!(target: "session.nav", index, count = self.markers.len(), "problem_index_out_of_range");
            return false;
        };
        let (line, column) = (marker.line, marker.column);
        self.goto(line, column);
        true
    }
}
