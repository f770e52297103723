//! Dirty-state tracking relative to the last bound snapshot.
//!
//! Content-change notifications carry an explicit [`ChangeKind`]. A
//! programmatic replace (re-sync from the store) always lands in
//! [`DirtyState::Original`], even though the widget reports it through the
//! same change channel as typing. A user edit lands in `Modified` iff the
//! resulting text differs from the baseline, so undoing back to the baseline
//! returns to `Original`.

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirtyState {
    #[default]
    Original,
    Modified,
}

/// Origin of a content change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Keystrokes, paste, snippet insertion: anything expressing user intent.
    UserEdit,
    /// Bulk replacement of the whole model value during a re-sync.
    ProgrammaticReplace,
}

/// A content-change notification: the resulting full text plus its origin.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub kind: ChangeKind,
    pub text: String,
}

impl ContentChange {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::UserEdit,
            text: text.into(),
        }
    }

    pub fn replace(text: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::ProgrammaticReplace,
            text: text.into(),
        }
    }
}

impl std::fmt::Debug for ContentChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentChange")
            .field("kind", &self.kind)
            .field("len_bytes", &self.text.len())
            .finish()
    }
}

impl DirtyState {
    /// Transition function. Total over every (baseline, change) pair.
    pub fn next(baseline: &str, change: &ContentChange) -> DirtyState {
        match change.kind {
            ChangeKind::ProgrammaticReplace => DirtyState::Original,
            ChangeKind::UserEdit if change.text == baseline => DirtyState::Original,
            ChangeKind::UserEdit => DirtyState::Modified,
        }
    }

    pub fn is_modified(self) -> bool {
        matches!(self, DirtyState::Modified)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DirtyState::Original => "original",
            DirtyState::Modified => "modified",
        }
    }
}

/// Holds the baseline text of the last bound snapshot and the current state.
#[derive(Debug, Default, Clone)]
pub struct DirtyTracker {
    baseline: String,
    state: DirtyState,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a new baseline (snapshot text). Always resets to `Original`.
    pub fn rebind(&mut self, baseline: &str) {
        self.baseline.clear();
        self.baseline.push_str(baseline);
        self.state = DirtyState::Original;
        trace!(target: "state.dirty", len_bytes = baseline.len(), "dirty_rebind");
    }

    /// Feed a content-change notification. Returns the resulting state.
    pub fn apply(&mut self, change: &ContentChange) -> DirtyState {
        let next = DirtyState::next(&self.baseline, change);
        if next != self.state {
            trace!(
                target: "state.dirty",
                from = self.state.as_str(),
                to = next.as_str(),
                kind = ?change.kind,
                "dirty_transition"
            );
        }
        self.state = next;
        next
    }

    pub fn state(&self) -> DirtyState {
        self.state
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }
}
