//! Line command parsing for the stdin driver.
//!
//! One command per line. Text arguments accept `\n` and `\t` escapes so a
//! multi-line snippet fits on one line.

use anyhow::{Context, Result, bail};
use core_events::{Event, InspectTarget, SnippetRequest};
use core_keymap::KeyCombo;
use core_state::{VersionId, WorkflowId, WorkflowRef};

pub const HELP: &str = "\
commands:
  open <id>             open the latest version of a workflow
  version <id> <n>      open version <n> of a workflow
  close                 close the current workflow
  type <text>           type at the caret (\\n, \\t escapes)
  snippet <text>        insert a snippet at the selection
  save                  publish the buffer as a new version
  key <combo>           press a key combo, e.g. ctrl+s
  problems              list validation problems
  goto <line> [col]     move the caret and center the line
  goto #<n>             jump to problem <n>
  show                  print session state and buffer
  list                  print the workflow listing
  quit                  exit";

/// Stateful parser; hands out a fresh snippet id per `snippet` command.
#[derive(Debug, Default)]
pub struct CommandParser {
    next_snippet: u64,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(None)` for blank lines, comments and `help`.
    pub fn parse(&mut self, line: &str) -> Result<Option<Event>> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        let (verb, rest) = match trimmed.split_once(' ') {
            Some((verb, rest)) => (verb, rest),
            None => (trimmed, ""),
        };

        let event = match verb {
            "open" => Event::Select(Some(WorkflowRef::latest(workflow_id(rest)?))),
            "version" => {
                let mut parts = rest.split_whitespace();
                let id = workflow_id(parts.next().unwrap_or_default())?;
                let raw = parts.next().context("usage: version <id> <n>")?;
                let n = raw
                    .trim_start_matches('v')
                    .parse::<u64>()
                    .with_context(|| format!("invalid version `{raw}`"))?;
                Event::Select(Some(WorkflowRef::at(id, VersionId(n))))
            }
            "close" => Event::Select(None),
            "type" => Event::TextInput(unescape(rest)),
            "snippet" => {
                self.next_snippet += 1;
                Event::Snippet(SnippetRequest::new(self.next_snippet, unescape(rest)))
            }
            "save" => Event::SaveRequested,
            "key" => {
                let combo = rest
                    .trim()
                    .parse::<KeyCombo>()
                    .with_context(|| format!("invalid key combo `{}`", rest.trim()))?;
                Event::Key(combo)
            }
            "problems" => Event::Inspect(InspectTarget::Problems),
            "goto" => parse_goto(rest)?,
            "show" => Event::Inspect(InspectTarget::Buffer),
            "list" => Event::ListingRequested,
            "quit" | "exit" => Event::Shutdown,
            "help" => return Ok(None),
            other => bail!("unknown command `{other}` (try `help`)"),
        };
        Ok(Some(event))
    }
}

fn workflow_id(raw: &str) -> Result<WorkflowId> {
    let id = raw.trim();
    if id.is_empty() {
        bail!("missing workflow id");
    }
    Ok(WorkflowId::new(id))
}

fn parse_goto(rest: &str) -> Result<Event> {
    let rest = rest.trim();
    if let Some(n) = rest.strip_prefix('#') {
        let n: usize = n
            .parse()
            .with_context(|| format!("invalid problem number `{n}`"))?;
        if n == 0 {
            bail!("problems are numbered from 1");
        }
        return Ok(Event::GotoProblem(n - 1));
    }
    let mut parts = rest.split_whitespace();
    let line: usize = parts
        .next()
        .context("usage: goto <line> [col]")?
        .parse()
        .context("invalid line number")?;
    let column: usize = match parts.next() {
        Some(col) => col.parse().context("invalid column number")?,
        None => 1,
    };
    Ok(Event::Goto { line, column })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
