//! Fixed pool of search executors.
//!
//! Every executor is a dedicated OS thread owning a private [`Searcher`], so
//! transposition caches are never shared. Requests wait in a FIFO queue
//! while all executors are busy; a finishing executor pulls the next queued
//! request before it reports idle. Results come back over a oneshot channel
//! wrapped in an [`AnalysisHandle`], which also learns when an executor
//! picked the request up so timeouts only cover the search itself.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::config::{EngineConfig, WorkerConfig};
use crate::error::WorkerError;
use crate::search::{SearchResult, Searcher};

type Reply = oneshot::Sender<Result<SearchResult, WorkerError>>;

struct Task {
    id: u64,
    fen: String,
    depth: u8,
    started: oneshot::Sender<()>,
    reply: Reply,
}

enum ExecutorCommand {
    Run(Task),
    Shutdown,
}

#[derive(Default)]
struct PoolState {
    queue: VecDeque<Task>,
    idle: VecDeque<usize>,
    terminated: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    commands: Vec<Sender<ExecutorCommand>>,
    stop: Arc<AtomicBool>,
    next_id: AtomicU64,
    /// Bumped by `clear_cache`; executors reset their cache when they see a new value
    clear_generation: AtomicU64,
    idle: AtomicUsize,
    queued: AtomicUsize,
    in_flight: AtomicUsize,
}

impl Shared {
    /// Called by an executor after finishing a task: hand it the next queued
    /// task, or mark it idle.
    fn next_task(&self, executor_id: usize) -> Option<Task> {
        let mut state = self.state.lock();
        if state.terminated {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        if let Some(task) = state.queue.pop_front() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return Some(task);
        }
        state.idle.push_back(executor_id);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.idle.fetch_add(1, Ordering::SeqCst);
        None
    }
}

/// Point-in-time pool counters. Reading them never blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    pub total: usize,
    pub idle: usize,
    pub queued: usize,
    pub in_flight: usize,
}

/// Future resolving to the outcome of one submitted analysis.
pub struct AnalysisHandle {
    id: u64,
    started: Option<oneshot::Receiver<()>>,
    rx: oneshot::Receiver<Result<SearchResult, WorkerError>>,
}

impl AnalysisHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait until an executor has started on this request. Also returns if
    /// the request was discarded or rejected without ever starting.
    pub async fn dispatched(&mut self) {
        if let Some(started) = self.started.take() {
            let _ = started.await;
        }
    }
}

impl Future for AnalysisHandle {
    type Output = Result<SearchResult, WorkerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the task was discarded with the pool
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(WorkerError::PoolTerminated)))
    }
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn from_config(config: &WorkerConfig) -> Result<Self, WorkerError> {
        Self::new(config.workers, config.engine.clone())
    }

    /// Start `workers` executors, each with its own searcher built from `engine`.
    pub fn new(workers: usize, engine: EngineConfig) -> Result<Self, WorkerError> {
        if workers == 0 {
            return Err(WorkerError::Config("worker pool needs at least one executor"));
        }

        let mut commands = Vec::with_capacity(workers);
        let mut receivers = Vec::with_capacity(workers);
        for _ in 0..workers {
            let (tx, rx) = unbounded();
            commands.push(tx);
            receivers.push(rx);
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                idle: (0..workers).collect(),
                ..PoolState::default()
            }),
            commands,
            stop: Arc::new(AtomicBool::new(false)),
            next_id: AtomicU64::new(0),
            clear_generation: AtomicU64::new(0),
            idle: AtomicUsize::new(workers),
            queued: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
        });

        let mut handles = Vec::with_capacity(workers);
        for (executor_id, rx) in receivers.into_iter().enumerate() {
            let shared = Arc::clone(&shared);
            let engine = engine.clone();
            let handle = thread::Builder::new()
                .name(format!("search-executor-{executor_id}"))
                .spawn(move || run_executor(executor_id, rx, shared, engine))?;
            handles.push(handle);
        }

        info!(workers, "Worker pool started");
        Ok(Self { shared, handles })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Queue an analysis of `fen` at `depth`. Never blocks.
    pub fn submit(&self, fen: impl Into<String>, depth: u8) -> AnalysisHandle {
        let (reply, rx) = oneshot::channel();
        let (started, started_rx) = oneshot::channel();
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let task = Task {
            id,
            fen: fen.into(),
            depth,
            started,
            reply,
        };
        let handle = AnalysisHandle {
            id,
            started: Some(started_rx),
            rx,
        };

        let mut state = self.shared.state.lock();
        if state.terminated {
            drop(state);
            let _ = task.reply.send(Err(WorkerError::PoolTerminated));
            return handle;
        }

        let idle_executor = state.idle.pop_front();
        match idle_executor {
            Some(executor_id) => {
                self.shared.idle.fetch_sub(1, Ordering::SeqCst);
                self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
                drop(state);
                debug!(task_id = id, executor_id, "Dispatching analysis");
                if let Err(err) = self.shared.commands[executor_id].send(ExecutorCommand::Run(task)) {
                    // Executor thread is gone; fail the task rather than lose it
                    if let ExecutorCommand::Run(task) = err.into_inner() {
                        let _ = task.reply.send(Err(WorkerError::PoolTerminated));
                    }
                }
            }
            None => {
                state.queue.push_back(task);
                self.shared.queued.fetch_add(1, Ordering::SeqCst);
            }
        }

        handle
    }

    /// Submit and race the search against a wall-clock budget that starts
    /// when an executor picks the request up, so time spent queued behind
    /// other searches never counts. A late result is discarded and the
    /// executor keeps serving the queue.
    pub async fn analyze_with_timeout(
        &self,
        fen: impl Into<String>,
        depth: u8,
        timeout: Duration,
    ) -> Result<SearchResult, WorkerError> {
        let mut handle = self.submit(fen, depth);
        let task_id = handle.id();
        handle.dispatched().await;
        match tokio::time::timeout(timeout, handle).await {
            Ok(result) => result,
            Err(_) => {
                warn!(task_id, ?timeout, "Analysis timed out");
                Err(WorkerError::Timeout(timeout))
            }
        }
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            total: self.size(),
            idle: self.shared.idle.load(Ordering::SeqCst),
            queued: self.shared.queued.load(Ordering::SeqCst),
            in_flight: self.shared.in_flight.load(Ordering::SeqCst),
        }
    }

    /// Reset every executor's transposition cache. Applies to every request
    /// an executor starts from now on, including ones already queued.
    pub fn clear_cache(&self) {
        self.shared.clear_generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.state.lock().terminated
    }

    /// Discard queued work, abort running searches and stop the executors.
    /// Every outstanding handle resolves to `PoolTerminated`.
    pub fn terminate(&self) {
        let discarded: Vec<Task> = {
            let mut state = self.shared.state.lock();
            if state.terminated {
                return;
            }
            state.terminated = true;
            self.shared.queued.store(0, Ordering::SeqCst);
            state.queue.drain(..).collect()
        };

        self.shared.stop.store(true, Ordering::SeqCst);
        let discarded_count = discarded.len();
        for task in discarded {
            let _ = task.reply.send(Err(WorkerError::PoolTerminated));
        }
        for tx in &self.shared.commands {
            let _ = tx.send(ExecutorCommand::Shutdown);
        }
        info!(discarded = discarded_count, "Worker pool terminated");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.terminate();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("Search executor thread panicked during shutdown");
            }
        }
    }
}

fn run_executor(
    executor_id: usize,
    rx: Receiver<ExecutorCommand>,
    shared: Arc<Shared>,
    engine: EngineConfig,
) {
    let retain_cache = engine.retain_cache;
    let mut searcher = Searcher::with_stop_flag(engine, Arc::clone(&shared.stop));
    let mut seen_generation = shared.clear_generation.load(Ordering::SeqCst);
    debug!(executor_id, "Search executor ready");

    while let Ok(command) = rx.recv() {
        match command {
            ExecutorCommand::Run(task) => {
                let mut next = Some(task);
                while let Some(task) = next {
                    let generation = shared.clear_generation.load(Ordering::SeqCst);
                    if !retain_cache || generation != seen_generation {
                        searcher.clear_cache();
                        seen_generation = generation;
                    }
                    let finished = execute(executor_id, &mut searcher, &shared, task);
                    // Counters settle before the caller can observe the result
                    next = shared.next_task(executor_id);
                    if let Some((reply, result)) = finished {
                        // The caller may have stopped waiting
                        let _ = reply.send(result);
                    }
                }
            }
            ExecutorCommand::Shutdown => break,
        }
    }

    debug!(executor_id, "Search executor stopped");
}

fn execute(
    executor_id: usize,
    searcher: &mut Searcher,
    shared: &Shared,
    task: Task,
) -> Option<(Reply, Result<SearchResult, WorkerError>)> {
    if task.reply.is_closed() {
        debug!(task_id = task.id, executor_id, "Skipping abandoned analysis");
        return None;
    }

    let Task {
        id,
        fen,
        depth,
        started,
        reply,
    } = task;
    let _ = started.send(());

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| searcher.search_fen(&fen, depth)));
    let result = match outcome {
        Ok(Ok(result)) if result.aborted && shared.stop.load(Ordering::SeqCst) => {
            Err(WorkerError::PoolTerminated)
        }
        Ok(result) => result,
        Err(_) => {
            error!(task_id = id, executor_id, %fen, "Search panicked, resetting executor cache");
            searcher.clear_cache();
            Err(WorkerError::ExecutorPanicked(executor_id))
        }
    };

    if let Ok(search) = &result {
        debug!(task_id = id, executor_id, nodes = search.nodes_searched, "Analysis complete");
    }
    Some((reply, result))
}
