//! Outbound collaborators: the status channel and the listing cache.

use core_state::ListingSlot;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

/// One user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotice {
    pub is_error: bool,
    pub message: String,
}

impl StatusNotice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            is_error: false,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            message: message.into(),
        }
    }
}

pub trait StatusSink {
    fn notify(&self, is_error: bool, message: &str);
}

impl StatusSink for UnboundedSender<StatusNotice> {
    fn notify(&self, is_error: bool, message: &str) {
        let notice = StatusNotice {
            is_error,
            message: message.to_string(),
        };
        if self.send(notice).is_err() {
            trace!(target: "session", is_error, "status_receiver_dropped");
        }
    }
}

/// Cache of the workflow listing held by the surrounding UI.
pub trait ListingCache {
    /// Mark the listing stale so its next read refetches.
    fn invalidate(&self);
}

impl ListingCache for ListingSlot {
    fn invalidate(&self) {
        let was_loaded = self.update(|rows| rows.take().is_some());
        debug!(target: "session.save", was_loaded, "listing_invalidated");
    }
}
