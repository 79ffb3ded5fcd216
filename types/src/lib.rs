//! Core domain types for labrat.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the fixture.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Line written to stdout once the busy loop is about to start.
pub const DEFAULT_MARKER: &str = "busyLoop starting";

// ============================================================================
// Recursion depth
// ============================================================================

/// Default depth shape: `floor((E + offset) ^ exponent)` with `E ~ Exp(1)`.
pub const DEFAULT_DEPTH_OFFSET: f64 = 1.0;
pub const DEFAULT_DEPTH_EXPONENT: f64 = 5.0;

/// Number of recursive steps a single iteration performs before its base case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Depth(u64);

impl Depth {
    pub const ZERO: Depth = Depth(0);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Floor a raw floating point sample into a depth.
    ///
    /// NaN, infinities and negative samples become [`Depth::ZERO`] (an immediate
    /// base case). Finite samples above `u64::MAX` saturate.
    #[must_use]
    pub fn from_sample(sample: f64) -> Self {
        if !sample.is_finite() || sample <= 0.0 {
            return Self::ZERO;
        }
        // `as` saturates for out-of-range floats.
        Self(sample.floor() as u64)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_base(self) -> bool {
        self.0 == 0
    }

    /// One step closer to the base case. Saturates at zero.
    #[must_use]
    pub const fn descend(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Branch choice
// ============================================================================

/// Which of the two mutually recursive functions the next step enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    A,
    B,
}

impl Branch {
    /// Map a fair coin flip onto a branch.
    #[must_use]
    pub const fn from_coin(heads: bool) -> Self {
        if heads { Branch::A } else { Branch::B }
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Cooperative "stop accepting new work" flag.
///
/// Clones share the same underlying flag. Setting it never interrupts a
/// recursion that is already running; the driver polls it between iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that starts out already cancelled.
    #[must_use]
    pub fn cancelled() -> Self {
        let flag = Self::new();
        flag.cancel();
        flag
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ============================================================================
// Driver lifecycle
// ============================================================================

/// Lifecycle of the recursion driver.
///
/// ```text
/// Idle -> Ready -> Busy -> Ready -> ... -> Cancelled
///           \_________________________________/^
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DriverState {
    /// Constructed, marker not yet emitted.
    #[default]
    Idle,
    /// Marker emitted; between iterations.
    Ready,
    /// One recursive task in flight.
    Busy,
    /// Terminal.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid driver transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: DriverState,
    pub to: DriverState,
}

impl DriverState {
    #[must_use]
    pub const fn can_transition_to(self, next: DriverState) -> bool {
        matches!(
            (self, next),
            (DriverState::Idle, DriverState::Ready)
                | (DriverState::Ready, DriverState::Busy | DriverState::Cancelled)
                | (DriverState::Busy, DriverState::Ready)
        )
    }

    pub fn transition(self, next: DriverState) -> Result<DriverState, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, DriverState::Cancelled)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DriverState::Idle => "idle",
            DriverState::Ready => "ready",
            DriverState::Busy => "busy",
            DriverState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
