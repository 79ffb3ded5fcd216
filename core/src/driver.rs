//! The busy loop.
//!
//! [`Driver::run`] writes the readiness marker, then repeatedly spawns one tokio
//! task per iteration to run the mutually recursive workload and waits for its
//! completion signal before starting the next. Cancellation is polled between
//! iterations only; a recursion that has started always runs to completion.

use std::io::{self, Write};
use std::sync::Arc;

use labrat_types::{CancelFlag, DEFAULT_MARKER, Depth, DriverState, TransitionError};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinError;

use crate::depth::{DepthSampler, ExpDepthSampler};
use crate::recursion::{RandomBranches, recurse_a};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to write readiness marker: {0}")]
    Marker(#[source] io::Error),
    #[error("recursion task failed: {0}")]
    Task(#[from] JoinError),
    #[error("recursion task exited without signalling completion")]
    CompletionLost,
    #[error(transparent)]
    State(#[from] TransitionError),
}

/// Observer for the driver's lifecycle. Every method defaults to a no-op.
///
/// `task_started` runs on the driving flow before the spawn, `task_finishing`
/// runs inside the spawned task right before the completion signal fires.
pub trait Probe: Send + Sync {
    fn transition(&self, _state: DriverState) {}
    fn task_started(&self, _iteration: u64, _depth: Depth) {}
    fn task_finishing(&self, _iteration: u64) {}
    fn iteration_complete(&self, _iteration: u64, _prev: i64, _counter: i64) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProbe;

impl Probe for NoopProbe {}

pub struct Driver<S = ExpDepthSampler> {
    sampler: S,
    marker: String,
    probe: Arc<dyn Probe>,
}

impl Default for Driver<ExpDepthSampler> {
    fn default() -> Self {
        Self::new(ExpDepthSampler::default())
    }
}

impl<S: DepthSampler> Driver<S> {
    #[must_use]
    pub fn new(sampler: S) -> Self {
        Self {
            sampler,
            marker: DEFAULT_MARKER.to_string(),
            probe: Arc::new(NoopProbe),
        }
    }

    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = probe;
        self
    }

    /// Run until `cancel` is observed between iterations.
    ///
    /// Writes the marker line to `marker_out` once, before the first iteration.
    /// Returns the counter's value at cancellation; `counter` holds the same value.
    pub async fn run<W>(
        &self,
        cancel: &CancelFlag,
        counter: &mut i64,
        marker_out: &mut W,
    ) -> Result<i64, DriverError>
    where
        W: Write + ?Sized,
    {
        writeln!(marker_out, "{}", self.marker).map_err(DriverError::Marker)?;
        marker_out.flush().map_err(DriverError::Marker)?;
        let mut state = self.advance(DriverState::Idle, DriverState::Ready)?;
        tracing::info!(initial = *counter, "Busy loop starting");

        let mut prev = *counter;
        let mut iteration: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                self.advance(state, DriverState::Cancelled)?;
                tracing::info!(
                    iterations = iteration,
                    counter = *counter,
                    prev,
                    "Busy loop cancelled"
                );
                return Ok(*counter);
            }

            let depth = self.sampler.sample();
            iteration += 1;
            state = self.advance(state, DriverState::Busy)?;
            let next = self.spawn_iteration(iteration, depth, *counter).await?;

            prev = *counter;
            *counter = next;
            tracing::trace!(iteration, %depth, prev, counter = next, "Iteration complete");
            self.probe.iteration_complete(iteration, prev, next);
            state = self.advance(state, DriverState::Ready)?;
        }
    }

    async fn spawn_iteration(
        &self,
        iteration: u64,
        depth: Depth,
        value: i64,
    ) -> Result<i64, DriverError> {
        let (done_tx, done_rx) = oneshot::channel();
        let probe = Arc::clone(&self.probe);

        self.probe.task_started(iteration, depth);
        let handle = tokio::spawn(async move {
            let next = recurse_a(value, depth, 0, &mut RandomBranches);
            probe.task_finishing(iteration);
            // The driver is always waiting on the receiver.
            let _ = done_tx.send(next);
        });

        match done_rx.await {
            Ok(next) => Ok(next),
            Err(_) => match handle.await {
                Err(err) => {
                    tracing::error!(iteration, %depth, "Recursion task failed: {err}");
                    Err(DriverError::Task(err))
                }
                Ok(()) => Err(DriverError::CompletionLost),
            },
        }
    }

    fn advance(&self, from: DriverState, to: DriverState) -> Result<DriverState, DriverError> {
        let next = from.transition(to)?;
        self.probe.transition(next);
        Ok(next)
    }
}
