//! Mutually recursive workload.
//!
//! [`recurse_a`] and [`recurse_b`] call each other at random. The two functions
//! have different frame footprints, so a stack walker that reuses a stale frame
//! pointer lands on garbage instead of a plausible-looking frame.
//!
//! Every step goes through [`stacker::maybe_grow`]: once the current stack runs
//! low the recursion continues on a freshly allocated segment. Deep iterations
//! therefore move across several stacks while they run.

use std::hint::black_box;

use labrat_types::{Branch, Depth};

/// Remaining stack below which the next step switches to a new segment.
const RED_ZONE: usize = 64 * 1024;
/// Size of each freshly allocated stack segment.
const STACK_SEGMENT: usize = 1024 * 1024;

/// Source of the coin flips that pick the next branch.
pub trait BranchSource {
    fn next_branch(&mut self) -> Branch;
}

/// Fair coin backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomBranches;

impl BranchSource for RandomBranches {
    fn next_branch(&mut self) -> Branch {
        Branch::from_coin(rand::random::<bool>())
    }
}

/// Replays a fixed sequence of branches, wrapping around when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedBranches {
    script: Vec<Branch>,
    position: usize,
}

impl ScriptedBranches {
    /// An empty script always answers [`Branch::B`].
    #[must_use]
    pub fn new(script: Vec<Branch>) -> Self {
        Self {
            script,
            position: 0,
        }
    }

    /// Number of branches handed out so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.position
    }
}

impl BranchSource for ScriptedBranches {
    fn next_branch(&mut self) -> Branch {
        let branch = if self.script.is_empty() {
            Branch::B
        } else {
            self.script[self.position % self.script.len()]
        };
        self.position += 1;
        branch
    }
}

/// Branch A. Base case yields `value + 1 + adjustment`; staying in A carries
/// the adjustment forward incremented, switching to B drops it.
#[must_use]
#[inline(never)]
pub fn recurse_a<B>(value: i64, depth: Depth, adjustment: i64, branches: &mut B) -> i64
where
    B: BranchSource + ?Sized,
{
    if depth.is_base() {
        return value.wrapping_add(1).wrapping_add(adjustment);
    }
    let next = depth.descend();
    let result = stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || {
        match branches.next_branch() {
            Branch::A => recurse_a(value, next, adjustment.wrapping_add(1), branches),
            Branch::B => recurse_b(value, next, branches),
        }
    });
    // Keeps the call out of tail position so every step owns a frame.
    black_box(result)
}

/// Branch B. Base case yields `value + 2`; entering A restarts the adjustment at 0.
#[must_use]
#[inline(never)]
pub fn recurse_b<B>(value: i64, depth: Depth, branches: &mut B) -> i64
where
    B: BranchSource + ?Sized,
{
    if depth.is_base() {
        return value.wrapping_add(2);
    }
    // Live across the call, which makes this frame wider than recurse_a's.
    let scratch = black_box([depth.as_u64(); 8]);
    let next = depth.descend();
    let result = stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || {
        match branches.next_branch() {
            Branch::A => recurse_a(value, next, 0, branches),
            Branch::B => recurse_b(value, next, branches),
        }
    });
    black_box(scratch);
    black_box(result)
}
