//! Run state shared between the batch runner and the signal watcher.
//!
//! The runner publishes a fresh snapshot of completed results after every
//! brand. On the first SIGINT/SIGTERM the watcher marks the run as
//! interrupted and writes that snapshot as a partial run; a second signal
//! exits immediately. Once the batch has finished and the run is being saved
//! normally, signals are acknowledged and ignored.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use brandfind_core::{BrandResult, CompletionStore, RunDescriptor, RunRecord, StoreError};
use chrono::Utc;
use tokio::sync::Notify;

use crate::summary::print_run_summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShutdownPhase {
    Running,
    ShuttingDown,
    Finishing,
}

/// What the watcher should do in response to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalAction {
    SavePartialAndExit,
    ForceExit,
    Ignore,
}

pub(crate) struct RunState {
    descriptor: RunDescriptor,
    store: CompletionStore,
    interrupted: AtomicBool,
    phase: Mutex<ShutdownPhase>,
    snapshot: Mutex<Arc<Vec<BrandResult>>>,
    wake: Notify,
}

impl RunState {
    pub(crate) fn new(descriptor: RunDescriptor, store: CompletionStore) -> Self {
        Self {
            descriptor,
            store,
            interrupted: AtomicBool::new(false),
            phase: Mutex::new(ShutdownPhase::Running),
            snapshot: Mutex::new(Arc::new(Vec::new())),
            wake: Notify::new(),
        }
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> ShutdownPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the published snapshot with a copy of `results`.
    pub(crate) fn publish(&self, results: &[BrandResult]) {
        let next = Arc::new(results.to_vec());
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<BrandResult>> {
        Arc::clone(&self.snapshot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Advance the shutdown state machine for one received signal.
    pub(crate) fn on_signal(&self) -> SignalAction {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match *phase {
            ShutdownPhase::Running => {
                *phase = ShutdownPhase::ShuttingDown;
                self.interrupted.store(true, Ordering::SeqCst);
                self.wake.notify_waiters();
                SignalAction::SavePartialAndExit
            }
            ShutdownPhase::ShuttingDown => SignalAction::ForceExit,
            ShutdownPhase::Finishing => SignalAction::Ignore,
        }
    }

    /// Claim the end of the run for the normal save.
    ///
    /// Returns `false` when a signal already claimed it; the watcher then
    /// owns the partial save and the process exit.
    pub(crate) fn begin_finishing(&self) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match *phase {
            ShutdownPhase::Running => {
                *phase = ShutdownPhase::Finishing;
                true
            }
            ShutdownPhase::Finishing => true,
            ShutdownPhase::ShuttingDown => false,
        }
    }

    /// Sleep for `delay` unless the run is interrupted first.
    ///
    /// Returns `true` when the pause ended because of an interruption.
    pub(crate) async fn pause(&self, delay: std::time::Duration) -> bool {
        let notified = self.wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_interrupted() {
            return true;
        }
        tokio::select! {
            () = tokio::time::sleep(delay) => self.is_interrupted(),
            () = notified => true,
        }
    }

    /// Write the current snapshot as a partial run.
    ///
    /// Returns `Ok(None)` when no brand has completed yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the run file cannot be written.
    pub(crate) fn save_partial(&self) -> Result<Option<(PathBuf, RunRecord)>, StoreError> {
        let results = self.snapshot();
        if results.is_empty() {
            return Ok(None);
        }
        let record = RunRecord::build(&self.descriptor, results.to_vec(), true, Utc::now());
        let path = self.store.save_run(&record)?;
        Ok(Some((path, record)))
    }
}

/// Spawn the task that turns SIGINT/SIGTERM into a partial save and exit.
pub(crate) fn spawn_signal_watcher(state: Arc<RunState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(watch_signals(state))
}

async fn watch_signals(state: Arc<RunState>) {
    #[cfg(unix)]
    let mut terminate =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                None
            }
        };

    loop {
        #[cfg(unix)]
        let received = tokio::select! {
            r = tokio::signal::ctrl_c() => r.map(|()| "SIGINT"),
            Some(()) = async {
                match terminate.as_mut() {
                    Some(stream) => stream.recv().await,
                    None => std::future::pending().await,
                }
            } => Ok("SIGTERM"),
        };
        #[cfg(not(unix))]
        let received = tokio::signal::ctrl_c().await.map(|()| "ctrl-c");

        let signal = match received {
            Ok(signal) => signal,
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for shutdown signals");
                return;
            }
        };

        match state.on_signal() {
            SignalAction::SavePartialAndExit => {
                tracing::info!(signal, "interrupt received, saving partial results");
                eprintln!("\ninterrupted; saving partial results (press Ctrl+C again to exit immediately)");
                let state = Arc::clone(&state);
                // Saving runs off the watcher so a second signal is still seen.
                tokio::task::spawn_blocking(move || {
                    let code = finish_interrupted(&state);
                    std::process::exit(code);
                });
            }
            SignalAction::ForceExit => {
                tracing::warn!(signal, "second interrupt received, exiting without saving");
                eprintln!("forced exit");
                std::process::exit(1);
            }
            SignalAction::Ignore => {
                tracing::info!(signal, "run already finishing, ignoring signal");
                eprintln!("\nrun finished; saving results, please wait");
            }
        }
    }
}

/// Save and report the partial run. Returns the process exit code.
fn finish_interrupted(state: &RunState) -> i32 {
    match state.save_partial() {
        Ok(Some((path, record))) => {
            print_run_summary(&record);
            println!(
                "saved {} partial results to {}",
                record.results.len(),
                path.display()
            );
            0
        }
        Ok(None) => {
            println!("no brands completed yet; nothing to save");
            0
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to save partial results");
            eprintln!("error: failed to save partial results: {e}");
            1
        }
    }
}
