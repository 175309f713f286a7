//! Fork-join harness for parallel transform stages
//!
//! A [`Queue`] collects one round of [`Task`]s, each a sub-range of the buffer
//! bound to a [`Stage`], dispatches them to the engine's [`WorkerPool`] and
//! blocks until every task has checked in. Stages run strictly one round at a
//! time because later stages read data written across task boundaries by
//! earlier ones.
//!
//! Partitioning is static: ranges are computed up front from the buffer
//! length and task count, aligned to 8 scalar slots so no butterfly straddles
//! two tasks.

use std::any::Any;
use std::mem::ManuallyDrop;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use tracing::{debug, trace, warn};

use crate::bitrev;
use crate::buffer::SharedSlice;
use crate::common::FftFloat;
use crate::error::{FftError, Result};
use crate::radix;
use crate::real;

/// One operation applied to a sub-range of the buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Stage<T> {
    BitReverse { address_bits: u32 },
    Merge2 { block_bits: u32, forward: bool },
    Merge4 { block_bits: u32, forward: bool },
    RealPack { forward: bool },
    Scale { factor: T },
    #[cfg(test)]
    Fail,
}

impl<T: FftFloat> Stage<T> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Stage::BitReverse { .. } => "bit-reverse",
            Stage::Merge2 { .. } => "merge2",
            Stage::Merge4 { .. } => "merge4",
            Stage::RealPack { .. } => "real-pack",
            Stage::Scale { .. } => "scale",
            #[cfg(test)]
            Stage::Fail => "fail",
        }
    }

    /// Applies the stage to `[from, to)`.
    ///
    /// # Safety
    /// Concurrent calls of the same round use ranges produced by one of the
    /// partition functions below for this stage.
    pub(crate) unsafe fn run(&self, data: SharedSlice<'_, T>, from: usize, to: usize, mask: usize) {
        match *self {
            Stage::BitReverse { address_bits } => bitrev::permute(data, from, to, address_bits),
            Stage::Merge2 { block_bits, forward } => radix::merge2(data, from, to, forward, block_bits, mask),
            Stage::Merge4 { block_bits, forward } => radix::merge4(data, from, to, forward, block_bits, mask),
            Stage::RealPack { forward } => real::load_real(data, from, to, forward, mask),
            Stage::Scale { factor } => {
                for i in from..to {
                    data.set(i, data.get(i) * factor);
                }
            }
            #[cfg(test)]
            Stage::Fail => panic!("injected failure in [{from}, {to})"),
        }
    }
}

/// A stage bound to one contiguous sub-range of the buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Task<T> {
    pub stage: Stage<T>,
    pub from: usize,
    pub to: usize,
}

/// Ranges of whole multiples of 8 slots, at most `len / 8` of them.
pub(crate) fn block_ranges(len: usize, tasks: usize) -> Vec<(usize, usize)> {
    let blocks = len >> 3;
    let tasks = tasks.min(blocks).max(1);
    let dn = blocks as f64 / tasks as f64;
    (0..tasks)
        .map(|k| {
            let from = ((k as f64 * dn).round() as usize) << 3;
            let to = (((k + 1) as f64 * dn).round() as usize) << 3;
            (from, to)
        })
        .collect()
}

/// Slots a task processes between checks of the round's abort flag. A
/// multiple of 8, so pieces of an aligned range stay aligned.
const ABORT_CHECK_SLOTS: usize = 1 << 12;

/// Runs `task` piece by piece, stopping at the next piece boundary once
/// `abort` is raised. Returns the number of pieces run.
///
/// # Safety
/// As for [`Stage::run`].
unsafe fn run_pieces<T: FftFloat>(task: &Task<T>, data: SharedSlice<'_, T>, mask: usize, abort: &AtomicBool) -> usize {
    let mut pieces = 0;
    let mut from = task.from;
    while from < task.to {
        if abort.load(Ordering::Acquire) {
            break;
        }
        let to = (from + ABORT_CHECK_SLOTS).min(task.to);
        task.stage.run(data, from, to, mask);
        pieces += 1;
        from = to;
    }
    pieces
}

/// Evenly sized ranges with no alignment.
pub(crate) fn even_ranges(len: usize, tasks: usize) -> Vec<(usize, usize)> {
    let tasks = tasks.min(len).max(1);
    let dn = len as f64 / tasks as f64;
    (0..tasks)
        .map(|k| ((k as f64 * dn).round() as usize, ((k + 1) as f64 * dn).round() as usize))
        .collect()
}

/// Counts pool threads as they exit, so shutdown can wait for all of them.
#[derive(Default)]
struct ExitLatch {
    exited: Mutex<usize>,
    all_gone: Condvar,
}

impl ExitLatch {
    fn check_out(&self) {
        let mut exited = self.exited.lock().unwrap_or_else(PoisonError::into_inner);
        *exited += 1;
        self.all_gone.notify_all();
    }

    fn wait_for(&self, threads: usize) {
        let mut exited = self.exited.lock().unwrap_or_else(PoisonError::into_inner);
        while *exited < threads {
            exited = self.all_gone.wait(exited).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Fixed-size pool of worker threads owned by one engine.
///
/// Dropping the pool joins its threads: the drop does not return before
/// every worker has exited.
pub(crate) struct WorkerPool {
    pool: ManuallyDrop<rayon::ThreadPool>,
    threads: usize,
    latch: Arc<ExitLatch>,
}

impl WorkerPool {
    pub(crate) fn new(threads: usize) -> Result<Self> {
        let latch = Arc::new(ExitLatch::default());
        let exit = Arc::clone(&latch);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("split-fft-{i}"))
            .exit_handler(move |_| exit.check_out())
            .build()?;
        debug!(threads, "started fft worker pool");
        Ok(Self {
            pool: ManuallyDrop::new(pool),
            threads,
            latch,
        })
    }

    pub(crate) fn threads(&self) -> usize {
        self.threads
    }

    fn scope<'scope, OP>(&self, op: OP)
    where
        OP: FnOnce(&rayon::Scope<'scope>) + Send,
    {
        self.pool.scope(op);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Safety: the pool is not touched again after this point.
        unsafe { ManuallyDrop::drop(&mut self.pool) };
        self.latch.wait_for(self.threads);
        debug!(threads = self.threads, "fft worker pool shut down");
    }
}

/// The tasks of one synchronisation round.
pub(crate) struct Queue<'p, T> {
    pool: &'p WorkerPool,
    mask: usize,
    tasks: Vec<Task<T>>,
}

impl<'p, T: FftFloat> Queue<'p, T> {
    pub(crate) fn new(pool: &'p WorkerPool, mask: usize) -> Self {
        Self {
            pool,
            mask,
            tasks: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, stage: Stage<T>, from: usize, to: usize) {
        self.tasks.push(Task { stage, from, to });
    }

    /// Adds one task per range.
    pub(crate) fn add_all(&mut self, stage: Stage<T>, ranges: &[(usize, usize)]) {
        for &(from, to) in ranges {
            self.add(stage, from, to);
        }
    }

    /// Runs all queued tasks and waits for them.
    ///
    /// A panicking task raises the abort flag: tasks that have not started
    /// skip their range and running ones stop at their next piece boundary.
    /// The first failure is returned once every task has checked in.
    pub(crate) fn process(&mut self, data: &mut [T]) -> Result<()> {
        if self.tasks.is_empty() {
            return Ok(());
        }
        let tasks = std::mem::take(&mut self.tasks);
        trace!(stage = tasks[0].stage.name(), tasks = tasks.len(), "dispatching round");

        let view = SharedSlice::new(data);
        let mask = self.mask;
        let abort = AtomicBool::new(false);
        let failure: Mutex<Option<FftError>> = Mutex::new(None);

        self.pool.scope(|scope| {
            for task in tasks {
                let abort = &abort;
                let failure = &failure;
                scope.spawn(move |_| {
                    // Safety: the tasks of this round were built from one
                    // partition of the buffer for a single stage.
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
                        run_pieces(&task, view, mask, abort)
                    }));
                    if let Err(payload) = outcome {
                        abort.store(true, Ordering::Release);
                        let message = panic_message(payload.as_ref());
                        warn!(stage = task.stage.name(), from = task.from, to = task.to, %message, "fft task failed");
                        let mut first = failure.lock().unwrap_or_else(PoisonError::into_inner);
                        first.get_or_insert(FftError::Computation {
                            stage: task.stage.name(),
                            message,
                        });
                    }
                });
            }
        });

        match failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_ranges_are_aligned_and_cover() {
        for (len, tasks) in [(1024usize, 3usize), (64, 8), (64, 100), (8192, 16), (16, 1)] {
            let ranges = block_ranges(len, tasks);
            assert!(ranges.len() <= (len >> 3).max(1));
            assert_eq!(ranges[0].0, 0);
            assert_eq!(ranges.last().unwrap().1, len);
            for w in ranges.windows(2) {
                assert_eq!(w[0].1, w[1].0);
            }
            for &(from, to) in &ranges {
                assert_eq!(from % 8, 0);
                assert_eq!(to % 8, 0);
                assert!(to > from);
            }
        }
    }

    #[test]
    fn test_even_ranges_cover() {
        let ranges = even_ranges(100, 7);
        assert_eq!(ranges.len(), 7);
        assert_eq!(ranges[0].0, 0);
        assert_eq!(ranges[6].1, 100);
        assert_eq!(even_ranges(3, 8).len(), 3);
    }

    #[test]
    fn test_scale_round() {
        let pool = WorkerPool::new(3).unwrap();
        let mut data: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let mut queue = Queue::new(&pool, 0);
        queue.add_all(Stage::Scale { factor: 0.5 }, &even_ranges(data.len(), 6));
        queue.process(&mut data).unwrap();
        assert!(data.iter().enumerate().all(|(i, &x)| x == i as f64 * 0.5));
    }

    #[test]
    fn test_failure_names_stage_and_is_propagated() {
        let pool = WorkerPool::new(2).unwrap();
        let mut data = vec![1.0f32; 64];
        let mut queue = Queue::new(&pool, 0);
        queue.add(Stage::Scale { factor: 2.0 }, 0, 32);
        queue.add(Stage::Fail, 32, 48);
        queue.add(Stage::Scale { factor: 2.0 }, 48, 64);

        let err = queue.process(&mut data).unwrap_err();
        assert_eq!(err.stage(), Some("fail"));
        match err {
            FftError::Computation { message, .. } => assert!(message.contains("injected failure")),
            other => panic!("unexpected error {other:?}"),
        }

        // the queue is reusable after a failed round
        queue.add(Stage::Scale { factor: 0.0 }, 0, 64);
        queue.process(&mut data).unwrap();
        assert!(data.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_raised_abort_stops_at_piece_boundary() {
        let mut data = vec![1.0f64; 3 * ABORT_CHECK_SLOTS + 8];
        let task = Task {
            stage: Stage::Scale { factor: 2.0 },
            from: 0,
            to: data.len(),
        };
        let view = SharedSlice::new(&mut data);

        let abort = AtomicBool::new(false);
        assert_eq!(unsafe { run_pieces(&task, view, 0, &abort) }, 4);

        abort.store(true, Ordering::Release);
        assert_eq!(unsafe { run_pieces(&task, view, 0, &abort) }, 0);
        assert!(data.iter().all(|&x| x == 2.0));
    }

    #[test]
    fn test_pieces_match_single_run() {
        use crate::twiddle::error_mask;
        use approx::assert_abs_diff_eq;

        let len = 4 * ABORT_CHECK_SLOTS;
        let original: Vec<f64> = (0..len).map(|i| ((i * 13) % 29) as f64).collect();
        let mut whole = original.clone();
        let mut pieced = original.clone();
        let stage = Stage::Merge4 { block_bits: 6, forward: true };
        let mask = error_mask(3);
        let abort = AtomicBool::new(false);
        unsafe {
            stage.run(SharedSlice::new(&mut whole), 0, len, mask);
            run_pieces(&Task { stage, from: 0, to: len }, SharedSlice::new(&mut pieced), mask, &abort);
        }
        for (p, w) in pieced.iter().zip(&whole) {
            assert_abs_diff_eq!(p, w, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_drop_joins_workers() {
        let pool = WorkerPool::new(4).unwrap();
        let latch = Arc::clone(&pool.latch);
        drop(pool);
        assert_eq!(*latch.exited.lock().unwrap(), 4);
    }
}
