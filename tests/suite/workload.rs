//! Library-level checks of the recursive workload and the driver.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use labrat_core::{Driver, ExpDepthSampler, Probe, ScriptedBranches, recurse_a, recurse_b};
use labrat_types::{Branch, CancelFlag, Depth};

#[test]
fn deep_recursion_on_a_small_thread() {
    // 256 KiB could hold only a few thousand frames without segment growth.
    let handle = thread::Builder::new()
        .stack_size(256 * 1024)
        .spawn(|| {
            let mut branches = ScriptedBranches::new(vec![Branch::B, Branch::A]);
            recurse_a(0, Depth::new(100_000), 0, &mut branches)
        })
        .expect("spawn thread");
    let result = handle.join().expect("recursion thread");
    assert!(result > 0);
}

#[test]
fn both_entry_points_agree_on_shared_suffix() {
    // A leading B sends either entry point into recurse_b with identical state.
    let script = vec![Branch::B, Branch::B, Branch::A, Branch::B];
    let via_a = recurse_a(3, Depth::new(9), 0, &mut ScriptedBranches::new(script.clone()));
    let via_b = recurse_b(3, Depth::new(9), &mut ScriptedBranches::new(script));
    assert_eq!(via_a, via_b);
}

struct StopAfter {
    cancel: CancelFlag,
    limit: u64,
    seen: AtomicU64,
}

impl Probe for StopAfter {
    fn iteration_complete(&self, iteration: u64, _prev: i64, _counter: i64) {
        self.seen.store(iteration, Ordering::SeqCst);
        if iteration >= self.limit {
            self.cancel.cancel();
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn driver_runs_then_cancels_on_the_shared_flag() {
    let cancel = CancelFlag::new();
    let probe = Arc::new(StopAfter {
        cancel: cancel.clone(),
        limit: 50,
        seen: AtomicU64::new(0),
    });
    let sampler = ExpDepthSampler::default().with_max_depth(Some(Depth::new(5_000)));
    let driver = Driver::new(sampler).with_probe(probe.clone());

    let mut counter = 1_000;
    let mut out = Vec::new();
    let result = driver.run(&cancel, &mut counter, &mut out).await.unwrap();

    assert_eq!(probe.seen.load(Ordering::SeqCst), 50);
    assert!(result >= 1_050, "{result}");
    assert_eq!(result, counter);
    assert_eq!(out, b"busyLoop starting\n");
}

#[tokio::test]
async fn pre_cancelled_driver_is_inert() {
    let cancel = CancelFlag::cancelled();
    let mut counter = -5;
    let result = Driver::default()
        .run(&cancel, &mut counter, &mut io::sink())
        .await
        .unwrap();
    assert_eq!(result, -5);
}
