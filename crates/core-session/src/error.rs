use core_store::StoreError;
use thiserror::Error;

/// Why a save request was refused before reaching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    #[error("a save is already in flight")]
    SaveInFlight,
    #[error("no unsaved changes")]
    NotModified,
    #[error("current user is not the author")]
    NotAuthorized,
    #[error("no document is open")]
    NoDocument,
}

impl PreconditionViolation {
    pub fn as_str(self) -> &'static str {
        match self {
            PreconditionViolation::SaveInFlight => "save_in_flight",
            PreconditionViolation::NotModified => "not_modified",
            PreconditionViolation::NotAuthorized => "not_authorized",
            PreconditionViolation::NoDocument => "no_document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("save refused: {0}")]
    Precondition(#[from] PreconditionViolation),
    #[error("fetch failed: {0}")]
    Fetch(#[source] StoreError),
    #[error("save failed: {0}")]
    Save(#[source] StoreError),
}

impl SessionError {
    /// Message for the status channel. Store failures surface their own text.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Fetch(e) | SessionError::Save(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}
