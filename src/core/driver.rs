//! DK-012: Run driver. Invokes a program once and reports one terminal outcome.
//!
//! NotStarted → Running → Succeeded | Failed.
//! The program runs synchronously on the calling thread. The first error it
//! returns ends the run verbatim; on failure the registry is discarded and
//! no snapshot is written. The snapshot is saved before the event log is
//! flushed, so the log's last event always matches the reported outcome.

use super::config::{self, RunConfig};
use super::context::Context;
use super::error::{Error, Result};
use super::registry::Registry;
use super::state;
use super::types::{RunEvent, RunState};
use crate::tripwire::eventlog;
use std::time::Instant;

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Succeeded(Registry),
    Failed(Error),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Process exit status: 0 iff succeeded.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Succeeded(_) => 0,
            Self::Failed(_) => 1,
        }
    }

    pub fn registry(&self) -> Option<&Registry> {
        match self {
            Self::Succeeded(r) => Some(r),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<Registry> {
        match self {
            Self::Succeeded(r) => Ok(r),
            Self::Failed(e) => Err(e),
        }
    }
}

/// Drives a single run.
#[derive(Debug)]
pub struct Driver {
    config: RunConfig,
    state: RunState,
}

impl Driver {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run `program` against a fresh context. A driver runs at most once.
    pub fn run<F>(&mut self, program: F) -> RunOutcome
    where
        F: FnOnce(&mut Context) -> Result<()>,
    {
        if self.state != RunState::NotStarted {
            return RunOutcome::Failed(Error::AlreadyRun);
        }
        self.state = RunState::Running;

        if self.persists() {
            if let Err(error) = config::check_stack_name(&self.config.stack) {
                tracing::warn!(%error, "refusing to run");
                self.state = RunState::Failed;
                return RunOutcome::Failed(error);
            }
        }

        let start = Instant::now();
        let run_id = eventlog::generate_run_id();
        let mut ctx = Context::new(self.config.clone(), run_id.clone());
        let span = tracing::info_span!("run", project = %ctx.project(), stack = %ctx.stack(), %run_id);
        let _guard = span.enter();
        tracing::info!("run started");

        let result = program(&mut ctx);
        let (registry, mut events) = ctx.into_parts();
        events.insert(
            0,
            RunEvent::RunStarted {
                project: self.config.project.clone(),
                stack: self.config.stack.clone(),
                run_id: run_id.clone(),
                declkit_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        );
        let total_seconds = start.elapsed().as_secs_f64();

        let outcome = match result {
            Ok(()) => {
                tracing::info!(resources = registry.len(), "run succeeded");
                events.push(RunEvent::RunSucceeded {
                    run_id: run_id.clone(),
                    resources: u32::try_from(registry.len()).unwrap_or(u32::MAX),
                    fingerprint: registry.fingerprint(),
                    total_seconds,
                });
                RunOutcome::Succeeded(registry)
            }
            Err(error) => {
                tracing::warn!(kind = error.kind(), %error, "run failed");
                events.push(RunEvent::RunFailed {
                    run_id: run_id.clone(),
                    kind: error.kind().to_string(),
                    error: error.to_string(),
                    total_seconds,
                });
                RunOutcome::Failed(error)
            }
        };

        let outcome = self.persist(outcome, &run_id, events);
        self.state = if outcome.is_success() {
            RunState::Succeeded
        } else {
            RunState::Failed
        };
        outcome
    }

    fn persists(&self) -> bool {
        self.config.state_dir.is_some() && !self.config.dry_run
    }

    /// Save the snapshot on success, then write the event log. A snapshot
    /// failure turns a successful run into a failed one, and the queued
    /// `run_succeeded` event becomes `run_failed` before anything is written.
    fn persist(&self, outcome: RunOutcome, run_id: &str, mut events: Vec<RunEvent>) -> RunOutcome {
        let state_dir = match self.config.state_dir {
            Some(ref dir) if self.persists() => dir,
            _ => return outcome,
        };
        let stack = &self.config.stack;

        let outcome = match outcome {
            RunOutcome::Succeeded(registry) => {
                let snap = state::snapshot(&registry, &self.config.project, stack, run_id);
                match state::save_snapshot(state_dir, &snap) {
                    Ok(()) => RunOutcome::Succeeded(registry),
                    Err(error) => {
                        tracing::warn!(kind = error.kind(), %error, "cannot save snapshot");
                        if let Some(last) = events.last_mut() {
                            if let RunEvent::RunSucceeded { total_seconds, .. } = *last {
                                *last = RunEvent::RunFailed {
                                    run_id: run_id.to_string(),
                                    kind: error.kind().to_string(),
                                    error: error.to_string(),
                                    total_seconds,
                                };
                            }
                        }
                        RunOutcome::Failed(error)
                    }
                }
            }
            failed => failed,
        };

        for event in events {
            if let Err(e) = eventlog::append_event(state_dir, stack, event) {
                tracing::warn!(error = %e, "cannot append event");
            }
        }
        outcome
    }
}

/// Run `program` with a fresh driver.
pub fn run<F>(config: RunConfig, program: F) -> RunOutcome
where
    F: FnOnce(&mut Context) -> Result<()>,
{
    Driver::new(config).run(program)
}
