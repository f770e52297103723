//! Console output: status notices and inspection reports.

use core_events::InspectTarget;
use core_session::runtime::RuntimeHooks;
use core_session::{EditorSession, SessionView, StatusNotice};
use core_state::ListingSlot;
use core_widget::{HeadlessFactory, TextWidget};
use std::io::{self, Write};
use tokio::sync::mpsc::UnboundedReceiver;

/// Write one line to stdout. A closed stdout is not an error worth surfacing.
pub fn emit(line: &str) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{line}");
}

pub fn format_notice(notice: &StatusNotice) -> String {
    if notice.is_error {
        format!("[error] {}", notice.message)
    } else {
        format!("[ok] {}", notice.message)
    }
}

/// Print notices until every sender is gone.
pub async fn print_notices(mut rx: UnboundedReceiver<StatusNotice>) {
    while let Some(notice) = rx.recv().await {
        emit(&format_notice(&notice));
    }
}

pub struct ConsoleHooks;

impl RuntimeHooks<HeadlessFactory> for ConsoleHooks {
    fn inspect(
        &mut self,
        target: InspectTarget,
        session: &EditorSession<HeadlessFactory>,
        listing: &ListingSlot,
    ) {
        let lines = match target {
            InspectTarget::Problems => problems_report(session),
            InspectTarget::Buffer => buffer_report(session),
            InspectTarget::Listing => listing_report(listing),
        };
        for line in lines {
            emit(&line);
        }
    }
}

pub fn problems_report(session: &EditorSession<HeadlessFactory>) -> Vec<String> {
    let problems = session.problems();
    if problems.is_empty() {
        return vec!["no problems".to_string()];
    }
    problems
        .iter()
        .enumerate()
        .map(|(i, p)| format!("#{} {}", i + 1, p.label))
        .collect()
}

pub fn buffer_report(session: &EditorSession<HeadlessFactory>) -> Vec<String> {
    if session.view() == SessionView::Empty {
        return vec!["no workflow open (use `open <id>`)".to_string()];
    }
    let selection = session
        .selection()
        .map(ToString::to_string)
        .unwrap_or_default();
    let access = match session.is_writable() {
        Some(true) => "editable",
        Some(false) => "read-only",
        None => "closed",
    };
    let mut out = vec![format!(
        "{selection} [{access}] [{}]{} layout={:?}",
        session.dirty_state().as_str(),
        if session.is_saving() { " [saving]" } else { "" },
        session.layout(),
    )];
    if let Some(widget) = session.widget() {
        let caret = widget.position();
        out.push(format!("caret {}:{}", caret.line, caret.column));
        let text = widget.value();
        out.extend(
            text.lines()
                .enumerate()
                .map(|(i, l)| format!("{:>4} | {l}", i + 1)),
        );
    }
    out
}

pub fn listing_report(listing: &ListingSlot) -> Vec<String> {
    match &*listing.read() {
        None => vec!["listing not loaded".to_string()],
        Some(rows) if rows.is_empty() => vec!["no workflows".to_string()],
        Some(rows) => rows
            .iter()
            .map(|s| {
                let mut row = format!("{} {} by {}", s.id, s.latest_version, s.created_by);
                if !s.description.is_empty() {
                    row.push_str(" - ");
                    row.push_str(&s.description);
                }
                row
            })
            .collect(),
    }
}
