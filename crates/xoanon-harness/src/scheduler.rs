//! Single-threaded background scheduler.
//!
//! Work that must never run on the UI loop (key map inference, delayed
//! deliveries, the periodic status refresh) goes through here instead. One
//! worker thread drains a deadline-ordered queue; jobs that panic are
//! logged and the thread carries on.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::error;
use parking_lot::Mutex;

type OnceJob = Box<dyn FnOnce() + Send>;
type RepeatJob = Box<dyn FnMut() + Send>;

enum Command {
    Once(Duration, OnceJob),
    Repeat(Duration, Duration, RepeatJob),
    Stop,
}

enum JobKind {
    Once(OnceJob),
    Repeat(Duration, RepeatJob),
}

struct Entry {
    due: Instant,
    // Insertion order breaks deadline ties, keeping same-deadline jobs FIFO.
    seq: u64,
    kind: JobKind,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap pops the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

pub struct Scheduler {
    tx: Sender<Command>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        let join = thread::spawn(move || run(rx));
        Self {
            tx,
            join: Mutex::new(Some(join)),
        }
    }

    /// Run a job as soon as the worker is free.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) {
        self.schedule(Duration::ZERO, job);
    }

    /// Run a job once after `delay`.
    pub fn schedule(&self, delay: Duration, job: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(Command::Once(delay, Box::new(job)));
    }

    /// Run a job after `initial`, then repeatedly every `period`.
    pub fn schedule_at_fixed_rate(
        &self,
        initial: Duration,
        period: Duration,
        job: impl FnMut() + Send + 'static,
    ) {
        let _ = self.tx.send(Command::Repeat(initial, period, Box::new(job)));
    }

    /// Stop the worker. Pending jobs are discarded; a job already running
    /// finishes first.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Stop);
        let handle = self.join.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn run(rx: Receiver<Command>) {
    let mut heap: BinaryHeap<Entry> = BinaryHeap::new();
    let mut seq = 0u64;

    loop {
        let wait = heap
            .peek()
            .map(|entry| entry.due.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_secs(60));

        match rx.recv_timeout(wait) {
            Ok(Command::Once(delay, job)) => {
                heap.push(Entry {
                    due: Instant::now() + delay,
                    seq: next_seq(&mut seq),
                    kind: JobKind::Once(job),
                });
            }
            Ok(Command::Repeat(initial, period, job)) => {
                heap.push(Entry {
                    due: Instant::now() + initial,
                    seq: next_seq(&mut seq),
                    kind: JobKind::Repeat(period, job),
                });
            }
            Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {}
        }

        while heap
            .peek()
            .is_some_and(|entry| entry.due <= Instant::now())
        {
            let Some(entry) = heap.pop() else { break };
            match entry.kind {
                JobKind::Once(job) => {
                    if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
                        error!("scheduled job panicked: {panic:?}");
                    }
                }
                JobKind::Repeat(period, mut job) => {
                    if let Err(panic) = catch_unwind(AssertUnwindSafe(&mut job)) {
                        error!("repeating job panicked: {panic:?}");
                    }
                    heap.push(Entry {
                        due: Instant::now() + period,
                        seq: next_seq(&mut seq),
                        kind: JobKind::Repeat(period, job),
                    });
                }
            }
        }
    }
}

fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
