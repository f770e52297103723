//! Diagnostic markers produced by validation passes.

/// One diagnostic. Positions are 1-based and refer to the currently bound buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Marker {
    pub fn error(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// The current diagnostic set. Every validation pass replaces it wholesale;
/// iteration order is the order the pass emitted.
#[derive(Debug, Default, Clone)]
pub struct MarkerStore {
    markers: Vec<Marker>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, markers: Vec<Marker>) {
        self.markers = markers;
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn as_slice(&self) -> &[Marker] {
        &self.markers
    }
}
