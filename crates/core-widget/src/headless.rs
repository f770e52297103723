//! In-process widget over a rope buffer.
//!
//! Runs validation synchronously after every mutation, so `take_markers`
//! always reflects the text at the time of the call.

use crate::validate::validate;
use crate::{TextWidget, Viewport, WidgetFactory, WidgetOptions};
use core_keymap::{KeyCombo, Registration, ShortcutCommand, ShortcutMap};
use core_state::{ContentChange, Marker};
use core_text::{Buffer, Position, Selection};
use tracing::trace;

pub const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

#[derive(Debug)]
pub struct HeadlessWidget {
    buffer: Buffer,
    options: WidgetOptions,
    read_only: bool,
    selection: Selection,
    viewport: Viewport,
    focused: bool,
    shortcuts: ShortcutMap,
    pending_markers: Option<Vec<Marker>>,
}

impl HeadlessWidget {
    pub fn new(options: WidgetOptions, viewport_height: usize) -> Self {
        let buffer = Buffer::new(&options.text);
        let mut widget = Self {
            buffer,
            read_only: options.read_only,
            options,
            selection: Selection::default(),
            viewport: Viewport::new(viewport_height),
            focused: false,
            shortcuts: ShortcutMap::new(),
            pending_markers: None,
        };
        widget.revalidate();
        widget
    }

    /// Options the widget was created with (`text` is the initial value).
    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    pub fn shortcut_count(&self) -> usize {
        self.shortcuts.len()
    }

    fn revalidate(&mut self) {
        self.pending_markers = Some(validate(&self.buffer.text()));
    }

    fn user_change(&mut self) -> ContentChange {
        self.revalidate();
        ContentChange::user(self.buffer.text())
    }
}

impl TextWidget for HeadlessWidget {
    fn value(&self) -> String {
        self.buffer.text()
    }

    fn replace_value(&mut self, text: &str) -> ContentChange {
        self.buffer.replace_all(text);
        self.selection = Selection::caret(self.buffer.clamp(self.selection.end));
        trace!(target: "widget", len_bytes = text.len(), "model_value_replaced");
        self.revalidate();
        ContentChange::replace(self.buffer.text())
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = Selection::new(
            self.buffer.clamp(selection.start),
            self.buffer.clamp(selection.end),
        );
    }

    fn apply_edit_at_selection(&mut self, source: &str, text: &str) -> ContentChange {
        let after = self.buffer.replace_range(self.selection, text);
        self.selection = Selection::caret(after);
        trace!(target: "widget", source, len_bytes = text.len(), "edit_applied");
        self.user_change()
    }

    fn type_text(&mut self, text: &str) -> Option<ContentChange> {
        if self.read_only {
            trace!(target: "widget", "typing_blocked_read_only");
            return None;
        }
        let after = self.buffer.replace_range(self.selection, text);
        self.selection = Selection::caret(after);
        Some(self.user_change())
    }

    fn position(&self) -> Position {
        self.selection.end
    }

    fn set_position(&mut self, pos: Position) {
        self.selection = Selection::caret(self.buffer.clamp(pos));
    }

    fn reveal_line_in_center(&mut self, line: usize) {
        let line = line.clamp(1, self.buffer.line_count());
        self.viewport.center_on(line);
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn register_shortcut(&mut self, combo: KeyCombo, command: ShortcutCommand) -> Registration {
        self.shortcuts.bind(combo, command)
    }

    fn shortcut(&self, pressed: &KeyCombo) -> Option<ShortcutCommand> {
        self.shortcuts.resolve(pressed)
    }

    fn take_markers(&mut self) -> Option<Vec<Marker>> {
        self.pending_markers.take()
    }
}

/// Factory producing [`HeadlessWidget`]s with a fixed viewport height.
#[derive(Debug, Clone)]
pub struct HeadlessFactory {
    viewport_height: usize,
    created: usize,
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_HEIGHT)
    }
}

impl HeadlessFactory {
    pub fn new(viewport_height: usize) -> Self {
        Self {
            viewport_height,
            created: 0,
        }
    }

    /// Number of widgets created so far.
    pub fn created(&self) -> usize {
        self.created
    }
}

impl WidgetFactory for HeadlessFactory {
    type Widget = HeadlessWidget;

    fn create(&mut self, options: WidgetOptions) -> HeadlessWidget {
        self.created += 1;
        trace!(
            target: "widget",
            read_only = options.read_only,
            language = options.language.as_str(),
            theme = options.theme.as_str(),
            "widget_created"
        );
        HeadlessWidget::new(options, self.viewport_height)
    }
}
