//! Save coordination.
//!
//! Preconditions are checked in a fixed order (in-flight, modified,
//! authorized). A refused save has no observable effect: no status notice and
//! no store call. The `saving` ticket is the only reentrancy guard.

use crate::{EditorSession, PreconditionViolation, SessionEffect, SessionError};
use core_events::SaveTicket;
use core_store::{NewVersion, StoreError};
use core_widget::{TextWidget, WidgetFactory};
use tracing::{debug, info, warn};

impl<F: WidgetFactory> EditorSession<F> {
    /// Start publishing the buffer as a new version.
    pub fn save(&mut self) -> Result<SessionEffect, SessionError> {
        let content = self.check_save().map_err(|violation| {
            debug!(target: "session.save", reason = violation.as_str(), "save_refused");
            SessionError::Precondition(violation)
        })?;

        self.next_save += 1;
        let ticket = SaveTicket(self.next_save);
        self.saving = Some(ticket);
        let version = NewVersion {
            content,
            author_id: self.session.current_user_id.clone(),
            label: self.settings.save_label.clone(),
        };
        info!(
            target: "session.save",
            ticket = ticket.0,
            len_bytes = version.content.len(),
            label = version.label.as_str(),
            "save_submitted"
        );
        Ok(SessionEffect::Submit(ticket, version))
    }

    /// Returns the text to publish when every precondition holds.
    fn check_save(&self) -> Result<String, PreconditionViolation> {
        if self.saving.is_some() {
            return Err(PreconditionViolation::SaveInFlight);
        }
        if !self.dirty.state().is_modified() {
            return Err(PreconditionViolation::NotModified);
        }
        match self.is_writable() {
            None => return Err(PreconditionViolation::NoDocument),
            Some(false) => return Err(PreconditionViolation::NotAuthorized),
            Some(true) => {}
        }
        self.widget
            .as_ref()
            .map(TextWidget::value)
            .ok_or(PreconditionViolation::NoDocument)
    }

    /// Apply the store's answer to a submitted save, then replay any
    /// selection queued while it was in flight.
    ///
    /// Dirty state and the bound snapshot are left alone on success: the
    /// buffer stays `Modified` against the text it was last synced from.
    ///
    /// A fetch held back during the save is superseded by a queued selection.
    /// Otherwise it is reissued after a successful save, so the buffer picks
    /// up the version just published, and dropped after a failed one, so the
    /// unsaved text survives.
    pub fn on_save_completed(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), StoreError>,
    ) -> Option<SessionEffect> {
        if self.saving != Some(ticket) {
            debug!(target: "session.save", ticket = ticket.0, "unknown_save_ticket_ignored");
            return None;
        }
        self.saving = None;

        let held = self.held_fetch.take();
        let saved = result.is_ok();
        match result {
            Ok(()) => {
                self.listing.invalidate();
                info!(target: "session.save", ticket = ticket.0, "save_succeeded");
                self.status.notify(false, &self.settings.success_message);
            }
            Err(e) => {
                let err = SessionError::Save(e);
                warn!(target: "session.save", ticket = ticket.0, error = %err, "save_failed");
                self.status.notify(true, &err.user_message());
            }
        }

        if let Some(selection) = self.deferred.take() {
            debug!(target: "session.save", "replaying_deferred_selection");
            return self.select_document(selection);
        }
        let held = held.filter(|ticket| self.is_current(ticket))?;
        if saved {
            debug!(target: "session.save", workflow = %held.workflow, "refetching_held_selection");
            self.select_document(Some(held.workflow))
        } else {
            debug!(target: "session.save", workflow = %held.workflow, "held_fetch_dropped_buffer_kept");
            None
        }
    }
}
