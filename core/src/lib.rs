//! Recursion driver for the labrat stack-walking fixture.
//!
//! The driver keeps exactly one tokio task at a time busy in a deep, randomly
//! branching recursion so that an external tool can walk the stack of a task
//! whose frames keep growing, shrinking and hopping between stack segments.
//!
//! ```text
//! Driver::run -> marker line -> loop { cancelled? -> sample depth -> spawn(recurse_a) -> await }
//! ```

pub mod depth;
pub mod driver;
pub mod recursion;

pub use depth::{DepthSampler, ExpDepthSampler};
pub use driver::{Driver, DriverError, NoopProbe, Probe};
pub use recursion::{BranchSource, RandomBranches, ScriptedBranches, recurse_a, recurse_b};
