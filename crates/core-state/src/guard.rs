//! Write-authorization guard: single writer by recorded author.
//!
//! The rule is advisory and UI-level only. A store may enforce its own policy
//! on `create_version`; nothing here assumes it does.

use crate::{DocumentSnapshot, Session};

/// A document is writable only by the user recorded as its author.
pub fn is_writable(snapshot: &DocumentSnapshot, session: &Session) -> bool {
    snapshot.authored_by == session.current_user_id
}

/// Read-only flag the widget should carry for `snapshot`.
pub fn read_only_for(snapshot: &DocumentSnapshot, session: &Session) -> bool {
    !is_writable(snapshot, session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;

    #[test]
    fn author_may_write() {
        let session = Session::new(UserId::new("bob"));
        let snap = DocumentSnapshot::new("id: a", UserId::new("bob"));
        assert!(is_writable(&snap, &session));
        assert!(!read_only_for(&snap, &session));
    }

    #[test]
    fn other_user_is_read_only() {
        let session = Session::new(UserId::new("bob"));
        let snap = DocumentSnapshot::new("id: a", UserId::new("alice"));
        assert!(!is_writable(&snap, &session));
        assert!(read_only_for(&snap, &session));
    }
}
