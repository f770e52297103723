//! swadl-edit entrypoint.
//!
//! Runs one editor session over an in-memory store, driven by line commands on
//! stdin. Logs go to `swadl-edit.log` in the working directory (filter with
//! `RUST_LOG`).

use anyhow::{Context, Result};
use clap::Parser;
use core_events::{Event, EventSourceRegistry};
use core_session::runtime::SessionRuntime;
use core_session::{EditorSession, SessionSettings};
use core_state::{ListingSlot, Session, UserId, WorkflowId, WorkflowRef};
use core_store::MemoryStore;
use core_widget::HeadlessFactory;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

mod commands;
mod console;
mod source;

use console::{ConsoleHooks, emit, print_notices};
use source::StdinCommandSource;

const LOG_FILE: &str = "swadl-edit.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "swadl-edit", version, about = "SWADL workflow editor session")]
struct Args {
    /// Identity of the local user. Only a workflow's author may edit it.
    #[arg(long = "user", default_value = "anonymous")]
    pub user: String,
    /// JSON array of `{id, swadl, created_by, description}` records seeding the store.
    #[arg(long = "seed")]
    pub seed: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `swadl-edit.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Workflow to open at startup.
    #[arg(long = "open")]
    pub open: Option<String>,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Global subscriber already installed; dropping the guard stops the writer.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn load_store(seed: Option<&Path>) -> Result<MemoryStore> {
    let Some(path) = seed else {
        info!(target: "store", "empty_store");
        return Ok(MemoryStore::new());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let store = MemoryStore::from_seed_json(&json)
        .with_context(|| format!("parsing seed file {}", path.display()))?;
    info!(target: "store", path = %path.display(), "store_seeded");
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", user = args.user.as_str(), "startup");

    let config = core_config::load_from(args.config.clone())?;
    let store = Arc::new(load_store(args.seed.as_deref())?);

    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_notices(status_rx));

    let listing = ListingSlot::default();
    let session = EditorSession::new(
        Session::new(UserId::new(args.user)),
        SessionSettings::from_config(&config),
        HeadlessFactory::default(),
        Box::new(status_tx),
        Box::new(listing.clone()),
    );
    let mut runtime =
        SessionRuntime::new(session, store, listing).with_hooks(Box::new(ConsoleHooks));

    if let Some(id) = args.open
        && let Some(tx) = runtime.sender()
    {
        tx.send(Event::Select(Some(WorkflowRef::latest(WorkflowId::new(id)))))
            .await
            .context("event channel closed before startup")?;
    }

    let mut registry = EventSourceRegistry::new();
    registry.register(StdinCommandSource::new());
    runtime.spawn_sources(&mut registry);
    emit("swadl-edit ready (type `help` for commands)");

    let reason = runtime.run().await;
    info!(target: "runtime", reason = %reason, "exit");

    // Dropping the session drops the last status sender, which ends the printer.
    drop(runtime);
    let _ = printer.await;
    Ok(())
}
