//! Stdin line-command event source.
//!
//! Lines are read on a dedicated OS thread so a pending read never holds up
//! runtime shutdown. The async half parses lines and forwards events until the
//! runtime closes the channel. End of input is treated as `quit`.

use crate::commands::CommandParser;
use crate::console::emit;
use core_events::{AsyncEventSource, CHANNEL_SEND_FAILURES, Event};
use std::io::BufRead;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const LINE_CHANNEL_CAP: usize = 64;

#[derive(Debug, Default)]
pub struct StdinCommandSource;

impl StdinCommandSource {
    pub fn new() -> Self {
        Self
    }
}

impl AsyncEventSource for StdinCommandSource {
    fn name(&self) -> &'static str {
        "stdin_commands"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let (line_tx, mut line_rx) = mpsc::channel::<String>(LINE_CHANNEL_CAP);
        let reader = std::thread::Builder::new()
            .name("swadl-stdin".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if line_tx.blocking_send(line).is_err() {
                        break;
                    }
                }
            });
        if let Err(e) = reader {
            warn!(target: "input.stdin", error = %e, "stdin_reader_spawn_failed");
        }

        tokio::spawn(async move {
            info!(target: "input.stdin", "stdin_source_started");
            let mut parser = CommandParser::new();
            loop {
                let next = tokio::select! {
                    biased;
                    _ = tx.closed() => break,
                    line = line_rx.recv() => line,
                };
                let Some(line) = next else {
                    debug!(target: "input.stdin", "stdin_closed");
                    let _ = tx.send(Event::Shutdown).await;
                    break;
                };
                match parser.parse(&line) {
                    Ok(Some(event)) => {
                        if tx.send(event).await.is_err() {
                            CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                            break;
                        }
                    }
                    Ok(None) => {
                        if line.trim() == "help" {
                            emit(crate::commands::HELP);
                        }
                    }
                    Err(e) => emit(&format!("[error] {e:#}")),
                }
            }
            info!(target: "input.stdin", "stdin_source_stopped");
        })
    }
}
