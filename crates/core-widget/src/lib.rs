//! Text-editing widget seam.
//!
//! The session controller drives the editing widget only through
//! [`TextWidget`] and creates it only through [`WidgetFactory`]. A browser
//! host would implement these over its embedded editor; [`HeadlessWidget`] is
//! the in-process implementation used by the binary and the tests.
//!
//! Change reporting: every mutating call returns the resulting
//! [`ContentChange`] tagged with its origin instead of invoking a registered
//! callback. `replace_value` always reports `ProgrammaticReplace`; typing and
//! `apply_edit_at_selection` report `UserEdit`.
//!
//! Validation reporting: `take_markers` yields the result of the latest
//! validation pass exactly once (the marker listener). Each pass covers the
//! full text; there is no incremental patching.

use core_keymap::{KeyCombo, Registration, ShortcutCommand};
use core_state::{ContentChange, Marker};
use core_text::{Position, Selection};

mod headless;
pub mod validate;

pub use headless::{HeadlessFactory, HeadlessWidget};

/// Creation options for a widget instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOptions {
    pub text: String,
    pub read_only: bool,
    pub language: String,
    /// Widget theme identifier, e.g. `vs-light`.
    pub theme: String,
    /// Schema-bound model URI used by the validation engine.
    pub model_uri: String,
}

/// Visible line window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible line (1-based).
    pub first_line: usize,
    /// Number of visible lines.
    pub height: usize,
    /// Line most recently requested to be shown centered.
    pub centered_on: Option<usize>,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            first_line: 1,
            height: height.max(1),
            centered_on: None,
        }
    }

    /// Line sitting in the middle row of the viewport.
    pub fn center_line(&self) -> usize {
        self.first_line + self.height / 2
    }

    pub fn last_line(&self) -> usize {
        self.first_line + self.height - 1
    }

    /// Scroll so `line` sits in the middle row, never above line 1.
    pub fn center_on(&mut self, line: usize) {
        let half = self.height / 2;
        self.first_line = if line > half { line - half } else { 1 };
        self.centered_on = Some(line);
    }
}

pub trait TextWidget {
    /// Full text of the bound model.
    fn value(&self) -> String;

    /// Overwrite the bound model's value. Reported as a programmatic replace.
    fn replace_value(&mut self, text: &str) -> ContentChange;

    fn set_read_only(&mut self, read_only: bool);
    fn is_read_only(&self) -> bool;

    fn selection(&self) -> Selection;
    fn set_selection(&mut self, selection: Selection);

    /// Replace the current selection with `text` as one deliberate edit.
    /// `source` names the originator (e.g. `"wizard"`).
    fn apply_edit_at_selection(&mut self, source: &str, text: &str) -> ContentChange;

    /// User keystrokes at the caret. `None` when the widget is read-only.
    fn type_text(&mut self, text: &str) -> Option<ContentChange>;

    fn position(&self) -> Position;
    fn set_position(&mut self, pos: Position);

    fn reveal_line_in_center(&mut self, line: usize);
    fn viewport(&self) -> Viewport;

    fn focus(&mut self);
    fn has_focus(&self) -> bool;

    /// Register a keyboard shortcut. Safe to call repeatedly with the same pair.
    fn register_shortcut(&mut self, combo: KeyCombo, command: ShortcutCommand) -> Registration;
    /// Command bound to a pressed combo, if any.
    fn shortcut(&self, pressed: &KeyCombo) -> Option<ShortcutCommand>;

    /// Markers from the latest validation pass, if one completed since the last call.
    fn take_markers(&mut self) -> Option<Vec<Marker>>;
}

pub trait WidgetFactory {
    type Widget: TextWidget;

    fn create(&mut self, options: WidgetOptions) -> Self::Widget;
}
