//! Generation Invoker
//!
//! Runs the provider's schema generation on one dedicated worker thread that owns the
//! execution environment and configuration, and blocks the caller until it reports back.

use crate::environment::ExecutionEnvironment;
use crate::error::{DdlError, ProviderError};
use crate::generation::{GeneratedScripts, GenerationConfig, GenerationOutcome, PersistenceUnitRef};
use crate::provider::SchemaProvider;
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvocationState {
    Created,
    Running,
    Succeeded,
    Failed,
}

impl InvocationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, InvocationState::Succeeded | InvocationState::Failed)
    }

    pub fn can_transition_to(self, next: InvocationState) -> bool {
        matches!(
            (self, next),
            (InvocationState::Created, InvocationState::Running)
                | (InvocationState::Running, InvocationState::Succeeded)
                | (InvocationState::Running, InvocationState::Failed)
        )
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Illegal invocation state transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: InvocationState,
    pub to: InvocationState,
}

/// Lifecycle of one invocation. Shared so callers can observe progress from other threads.
#[derive(Debug)]
pub struct Invocation {
    state: Mutex<InvocationState>,
}

impl Invocation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(InvocationState::Created),
        })
    }

    pub fn state(&self) -> InvocationState {
        *self.state.lock()
    }

    pub fn advance(&self, next: InvocationState) -> Result<(), IllegalTransition> {
        let mut state = self.state.lock();
        if !state.can_transition_to(next) {
            return Err(IllegalTransition {
                from: *state,
                to: next,
            });
        }
        *state = next;
        Ok(())
    }
}

/// Runs a [`SchemaProvider`] on a worker thread per invocation.
pub struct GenerationInvoker<P: SchemaProvider + 'static> {
    provider: Arc<P>,
    timeout: Option<Duration>,
}

impl<P: SchemaProvider + 'static> GenerationInvoker<P> {
    pub fn new(provider: P) -> Self {
        Self::from_shared(Arc::new(provider))
    }

    pub fn from_shared(provider: Arc<P>) -> Self {
        Self {
            provider,
            timeout: None,
        }
    }

    /// Stop waiting for the worker after `timeout`. The worker is detached, not killed.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn invoke(
        &self,
        unit: &PersistenceUnitRef,
        config: GenerationConfig,
        env: ExecutionEnvironment,
    ) -> GenerationOutcome {
        self.invoke_tracked(&Invocation::new(), unit, config, env)
    }

    /// Like [`invoke`](Self::invoke), recording state changes on `invocation`.
    pub fn invoke_tracked(
        &self,
        invocation: &Invocation,
        unit: &PersistenceUnitRef,
        config: GenerationConfig,
        env: ExecutionEnvironment,
    ) -> GenerationOutcome {
        if let Err(err) = invocation.advance(InvocationState::Running) {
            return GenerationOutcome::Failed(DdlError::Configuration(err.to_string()));
        }

        let result = self.run_worker(unit.name(), config, env);
        let (next, outcome) = match result {
            Ok(scripts) => (InvocationState::Succeeded, GenerationOutcome::Succeeded(scripts)),
            Err(cause) => {
                error!(unit = %unit.name(), error = %cause, "Schema generation failed");
                (
                    InvocationState::Failed,
                    GenerationOutcome::Failed(DdlError::generation(unit.name(), cause)),
                )
            }
        };
        if let Err(err) = invocation.advance(next) {
            // Only reachable if another thread advanced the same invocation.
            warn!(error = %err, "Invocation state changed concurrently");
        }
        outcome
    }

    fn run_worker(
        &self,
        unit: &str,
        config: GenerationConfig,
        env: ExecutionEnvironment,
    ) -> Result<GeneratedScripts, ProviderError> {
        let (tx, rx) = mpsc::channel();
        let provider = Arc::clone(&self.provider);
        let worker_unit = unit.to_string();
        let started = Instant::now();

        let handle = thread::Builder::new()
            .name(format!("ddlgen-{}", unit))
            .spawn(move || {
                debug!(unit = %worker_unit, locations = ?env.locations(), "Worker started");
                let result = provider.generate_schema(&worker_unit, &config, &env);
                // The caller may have stopped waiting.
                let _ = tx.send(result);
            })
            .map_err(ProviderError::WorkerSpawn)?;

        info!(unit = %unit, "Generation worker spawned");

        let received = match self.timeout {
            Some(timeout) => match rx.recv_timeout(timeout) {
                Ok(result) => Some(result),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    warn!(unit = %unit, ?timeout, "Generation worker timed out; detaching");
                    return Err(ProviderError::TimedOut(timeout));
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => None,
            },
            None => rx.recv().ok(),
        };

        let joined = handle.join();
        debug!(unit = %unit, elapsed_ms = started.elapsed().as_millis() as u64, "Generation worker joined");

        match (received, joined) {
            (Some(result), _) => result,
            (None, Err(payload)) => Err(ProviderError::WorkerPanicked(panic_message(payload.as_ref()))),
            (None, Ok(())) => Err(ProviderError::WorkerPanicked(
                "worker exited without reporting a result".to_string(),
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
