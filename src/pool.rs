//! Worker pool and task dispatcher.
//!
//! A fixed set of long-lived workers executes analysis tasks off the
//! caller's thread. The dispatcher owns the routing state behind one
//! mutex (routing decisions are effectively single-threaded): an idle
//! worker list, a FIFO queue of tasks waiting for a worker, and the map
//! from task id to the caller's result channel. Results come back
//! tagged with the task id; resolution is idempotent, late results for
//! cancelled tasks are dropped silently, and a lost worker fails its
//! in-flight task instead of leaving it pending forever.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{debug, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::completion::{NullSchemaProvider, SchemaProvider};
use crate::errors::TaskError;
use crate::models::enums::ServiceLanguage;
use crate::protocol::{TaskData, TaskRequest, TaskResponse, TaskResult};
use crate::worker::{self, RouterEvent, WorkerMessage};

/// Pool sizing. The defaults match the host's worker settings.
#[derive(Clone, Copy, Debug)]
pub struct PoolConfig {
    pub workers: usize,
    pub max_pending: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { workers: 3, max_pending: 1000 }
    }
}

type TaskOutcome = Result<TaskResult, TaskError>;

struct WorkerHandle {
    sender: Sender<WorkerMessage>,
    join: Option<JoinHandle<()>>,
    alive: bool,
}

struct QueuedTask {
    request: TaskRequest,
    results: UnboundedSender<TaskOutcome>,
}

struct RunningTask {
    worker: usize,
    results: UnboundedSender<TaskOutcome>,
}

struct DispatcherState {
    workers: Vec<WorkerHandle>,
    idle: VecDeque<usize>,
    pending: VecDeque<QueuedTask>,
    running: HashMap<u64, RunningTask>,
    max_pending: usize,
    shut_down: bool,
}

impl DispatcherState {
    fn live_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.alive).count()
    }

    /// Hand the task to an idle worker. Returns the task back when
    /// every idle worker turned out dead or none is idle.
    fn try_assign(&mut self, task: QueuedTask) -> Option<QueuedTask> {
        while let Some(worker) = self.idle.pop_front() {
            if !self.workers[worker].alive {
                continue;
            }

            let task_id = task.request.task_id;
            match self.workers[worker].sender.send(WorkerMessage::Run(task.request.clone())) {
                Ok(()) => {
                    debug!("task {task_id} assigned to worker {worker}");
                    self.running.insert(task_id, RunningTask { worker, results: task.results });
                    return None;
                }
                Err(_) => {
                    // Channel closed under us: the worker is gone.
                    warn!("worker {worker} unreachable, marking dead");
                    self.workers[worker].alive = false;
                }
            }
        }

        Some(task)
    }

    /// A worker became free: start the next queued task or mark idle.
    fn worker_freed(&mut self, worker: usize) {
        if !self.workers[worker].alive {
            return;
        }

        self.idle.push_back(worker);
        if let Some(task) = self.pending.pop_front() {
            if let Some(task) = self.try_assign(task) {
                self.pending.push_front(task);
            }
        }
    }
}

/// Distributes analysis tasks over a fixed set of workers and routes
/// tagged results back to the submitting callers.
pub struct WorkerPool {
    state: Arc<Mutex<DispatcherState>>,
    next_task_id: AtomicU64,
    router: Mutex<Option<JoinHandle<()>>>,
}

/// A submitted task: its id plus the stream of result messages. The
/// current operations deliver exactly one final message; the channel
/// form keeps room for non-final progress messages.
pub struct PendingTask {
    pub task_id: u64,
    receiver: UnboundedReceiver<TaskOutcome>,
}

impl PendingTask {
    /// Next message for this task, in order. `None` after the final
    /// message, or when the task was cancelled.
    pub async fn next(&mut self) -> Option<TaskOutcome> {
        self.receiver.recv().await
    }

    /// Wait for the final message.
    pub async fn final_result(mut self) -> TaskOutcome {
        let task_id = self.task_id;
        loop {
            match self.receiver.recv().await {
                Some(Ok(result)) => {
                    if result.final_ {
                        return Ok(result);
                    }
                }
                Some(Err(error)) => return Err(error),
                None => return Err(TaskError::Cancelled(task_id)),
            }
        }
    }
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default(), Arc::new(NullSchemaProvider))
    }

    pub fn with_provider(provider: Arc<dyn SchemaProvider>) -> Self {
        Self::with_config(PoolConfig::default(), provider)
    }

    pub fn with_config(config: PoolConfig, provider: Arc<dyn SchemaProvider>) -> Self {
        let worker_count = config.workers.max(1);
        let (events_tx, events_rx) = mpsc::channel::<RouterEvent>();

        let mut workers = Vec::with_capacity(worker_count);
        let mut idle = VecDeque::with_capacity(worker_count);
        for id in 0..worker_count {
            let (task_tx, task_rx) = mpsc::channel::<WorkerMessage>();
            let join =
                worker::spawn_worker(id, task_rx, events_tx.clone(), Arc::clone(&provider)).ok();
            let alive = join.is_some();
            if alive {
                idle.push_back(id);
            }
            workers.push(WorkerHandle { sender: task_tx, join, alive });
        }
        drop(events_tx); // Workers hold the only senders now.

        let state = Arc::new(Mutex::new(DispatcherState {
            workers,
            idle,
            pending: VecDeque::new(),
            running: HashMap::new(),
            max_pending: config.max_pending,
            shut_down: false,
        }));

        let router_state = Arc::clone(&state);
        let router = std::thread::Builder::new()
            .name("analysis-router".into())
            .spawn(move || {
                while let Ok(event) = events_rx.recv() {
                    match event {
                        RouterEvent::Result { worker, response } => {
                            handle_result(&router_state, worker, response);
                        }
                        RouterEvent::WorkerLost { worker, task_id } => {
                            handle_worker_lost(&router_state, worker, task_id);
                        }
                    }
                }
            })
            .ok();

        Self { state, next_task_id: AtomicU64::new(0), router: Mutex::new(router) }
    }

    /// Queue a task for execution. Returns the pending handle whose
    /// channel receives the (tagged) results.
    pub fn submit(&self, data: TaskData) -> Result<PendingTask, TaskError> {
        let task_id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let (results_tx, results_rx) = unbounded_channel();
        let task = QueuedTask { request: TaskRequest { task_id, data }, results: results_tx };

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.shut_down {
            return Err(TaskError::PoolShutdown);
        }
        if state.live_workers() == 0 {
            return Err(TaskError::PoolShutdown);
        }

        if let Some(task) = state.try_assign(task) {
            if state.pending.len() >= state.max_pending {
                return Err(TaskError::QueueFull);
            }
            debug!("task {task_id} queued ({} pending)", state.pending.len() + 1);
            state.pending.push_back(task);
        }

        Ok(PendingTask { task_id, receiver: results_rx })
    }

    /// Submit and wait for the final result.
    pub async fn run_task(&self, data: TaskData) -> TaskOutcome {
        self.submit(data)?.final_result().await
    }

    /// Send additional data to a task that is still running; results
    /// keep flowing to the original caller. No effect once the task
    /// has delivered its final message.
    pub fn continue_task(&self, task_id: u64, data: TaskData) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(running) = state.running.get(&task_id) else {
            return false;
        };

        state.workers[running.worker]
            .sender
            .send(WorkerMessage::Run(TaskRequest { task_id, data }))
            .is_ok()
    }

    /// Withdraw interest in a task. In-flight work is not interrupted;
    /// its eventual result is dropped silently.
    pub fn cancel(&self, task_id: u64) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.running.remove(&task_id).is_some() {
            debug!("task {task_id} cancelled while running");
            return true;
        }

        let before = state.pending.len();
        state.pending.retain(|task| task.request.task_id != task_id);
        if state.pending.len() != before {
            debug!("task {task_id} cancelled while pending");
            return true;
        }

        false
    }

    /// Ask every live worker to drop its per-session caches. Control
    /// message only; no response is produced.
    pub fn cleanup(&self, language: ServiceLanguage) {
        let task_id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for worker in state.workers.iter().filter(|w| w.alive) {
            let _ = worker.sender.send(WorkerMessage::Run(TaskRequest {
                task_id,
                data: TaskData::Cleanup { language },
            }));
        }
    }

    /// Number of workers still accepting tasks.
    pub fn live_workers(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).live_workers()
    }

    /// Stop accepting tasks, let workers drain their queues and join
    /// them. Pending tasks resolve as shut down.
    pub fn shutdown(&self) {
        let mut joins = Vec::new();
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.shut_down {
                return;
            }
            state.shut_down = true;

            for task in state.pending.drain(..) {
                let _ = task.results.send(Err(TaskError::PoolShutdown));
            }
            for worker in state.workers.iter_mut() {
                let _ = worker.sender.send(WorkerMessage::Shutdown);
                if let Some(join) = worker.join.take() {
                    joins.push(join);
                }
            }
        }

        for join in joins {
            let _ = join.join();
        }
        if let Some(router) = self.router.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let _ = router.join();
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Route one worker response: resolve the matching pending caller
/// exactly once; drop duplicates and results for cancelled tasks.
fn handle_result(state: &Arc<Mutex<DispatcherState>>, worker: usize, response: TaskResponse) {
    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
    let task_id = response.task_id;
    let final_ = response.data.final_;

    if final_ {
        match state.running.remove(&task_id) {
            Some(running) => {
                // The caller may have dropped its handle; that is fine.
                let _ = running.results.send(Ok(response.data));
            }
            None => {
                debug!("dropping late or duplicate result for task {task_id}");
            }
        }
        state.worker_freed(worker);
    } else {
        match state.running.get(&task_id) {
            Some(running) => {
                let _ = running.results.send(Ok(response.data));
            }
            None => {
                debug!("dropping progress message for unknown task {task_id}");
            }
        }
    }
}

/// A worker died: fail its in-flight task and stop routing to it.
fn handle_worker_lost(state: &Arc<Mutex<DispatcherState>>, worker: usize, task_id: Option<u64>) {
    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
    warn!("worker {worker} lost (in-flight task: {task_id:?})");

    state.workers[worker].alive = false;
    state.idle.retain(|&w| w != worker);

    // Any running task assigned to the dead worker resolves as failed,
    // not only the one it reported.
    let failed: Vec<u64> = state
        .running
        .iter()
        .filter(|(_, task)| task.worker == worker)
        .map(|(&id, _)| id)
        .collect();
    for id in failed {
        if let Some(task) = state.running.remove(&id) {
            let _ = task.results.send(Err(TaskError::WorkerLost(id)));
        }
    }
    if let Some(id) = task_id {
        if let Some(task) = state.running.remove(&id) {
            let _ = task.results.send(Err(TaskError::WorkerLost(id)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ResultPayload;

    fn canned_response(task_id: u64) -> TaskResponse {
        TaskResponse {
            task_id,
            data: TaskResult::final_result(ResultPayload::QueryType(
                crate::models::enums::QueryType::Select,
            )),
        }
    }

    fn bare_state() -> Arc<Mutex<DispatcherState>> {
        // One imaginary worker; its channel is never drained, which is
        // fine for routing-only tests.
        let (sender, receiver) = mpsc::channel();
        std::mem::forget(receiver);
        Arc::new(Mutex::new(DispatcherState {
            workers: vec![WorkerHandle { sender, join: None, alive: true }],
            idle: VecDeque::new(),
            pending: VecDeque::new(),
            running: HashMap::new(),
            max_pending: 10,
            shut_down: false,
        }))
    }

    #[test]
    fn duplicate_final_results_resolve_once() {
        let state = bare_state();
        let (tx, mut rx) = unbounded_channel();
        state
            .lock()
            .unwrap()
            .running
            .insert(9, RunningTask { worker: 0, results: tx });

        handle_result(&state, 0, canned_response(9));
        handle_result(&state, 0, canned_response(9));

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err()); // exactly one resolution
    }

    #[test]
    fn late_result_for_cancelled_task_is_silent() {
        let state = bare_state();
        // No running entry at all: the task was cancelled.
        handle_result(&state, 0, canned_response(4));
        // The worker still goes back to the idle list.
        assert_eq!(state.lock().unwrap().idle.len(), 1);
    }

    #[test]
    fn worker_loss_fails_inflight_tasks() {
        let state = bare_state();
        let (tx, mut rx) = unbounded_channel();
        state
            .lock()
            .unwrap()
            .running
            .insert(3, RunningTask { worker: 0, results: tx });

        handle_worker_lost(&state, 0, Some(3));

        match rx.try_recv() {
            Ok(Err(TaskError::WorkerLost(3))) => {}
            other => panic!("expected worker-lost failure, got {other:?}"),
        }
        assert!(!state.lock().unwrap().workers[0].alive);
    }
}
