//! Long-running action plumbing. The menu submits an [`ActionRequest`]; a
//! worker thread runs the blocking provider call off the input/render path
//! and delivers exactly one [`ActionOutcome`] back through the event queue.
//! Cancellation (quit while a job runs) discards the result instead of
//! waiting for it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, TryRecvError};

use crate::event::{Event, EventQueue};
use crate::log_debug;

/// Every operation a menu leaf can trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    Restart,
    Shutdown,
    SystemInfo,
    ShowIp,
    CpuTemp,
    Disk,
    Mem,
    Update,
    ContainerList,
    ContainerStart { id: String },
    ContainerStop { id: String },
    ContainerRestart { id: String },
}

impl ActionRequest {
    /// Message shown next to the spinner while the action runs.
    pub fn busy_label(&self) -> String {
        match self {
            ActionRequest::Restart => "Rebooting in 3s...".into(),
            ActionRequest::Shutdown => "Shutting down in 3s...".into(),
            ActionRequest::SystemInfo => "Reading system info...".into(),
            ActionRequest::ShowIp => "Looking up IP...".into(),
            ActionRequest::CpuTemp => "Reading CPU temp...".into(),
            ActionRequest::Disk => "Checking disk...".into(),
            ActionRequest::Mem => "Checking memory...".into(),
            ActionRequest::Update => "Updating... This may take a while".into(),
            ActionRequest::ContainerList => "Listing containers...".into(),
            ActionRequest::ContainerStart { id } => format!("Starting {id}..."),
            ActionRequest::ContainerStop { id } => format!("Stopping {id}..."),
            ActionRequest::ContainerRestart { id } => format!("Restarting {id}..."),
        }
    }
}

/// Terminal result of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Success { text: String },
    Failure { reason: String },
}

/// Result tagged with the request that produced it; delivered exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub request: ActionRequest,
    pub result: ActionResult,
}

impl ActionOutcome {
    /// Text for the transient result screen.
    pub fn display_text(&self) -> &str {
        match &self.result {
            ActionResult::Success { text } => text,
            ActionResult::Failure { reason } => reason,
        }
    }
}

/// Blocking backend that performs the real-world effect of a request.
/// Implementations must tolerate being called from a worker thread.
pub trait ActionProvider: Send + Sync {
    fn perform(&self, request: &ActionRequest) -> Result<String>;
}

/// Shared cancellation flag between the UI and a worker.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Handle the UI keeps while a worker runs. Dropping it does not stop the
/// worker; quit cancels and leaves the thread to finish on its own.
pub struct ActionJob {
    cancel: CancelToken,
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl ActionJob {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Non-blocking check whether the worker has finished; joins the thread
    /// once it has so no handle lingers.
    pub fn poll_finished(&mut self) -> bool {
        match self.done_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                true
            }
            Err(TryRecvError::Empty) => false,
        }
    }
}

/// Spawn the worker for one request. The outcome is pushed into `queue`
/// through the reserved (never-shed) path unless the token is cancelled
/// first, in which case the late result is simply discarded.
pub fn submit_action(
    provider: Arc<dyn ActionProvider>,
    request: ActionRequest,
    queue: Arc<EventQueue>,
) -> ActionJob {
    let cancel = CancelToken::new();
    let cancel_for_worker = cancel.clone();
    let (done_tx, done_rx) = bounded(1);

    let handle = thread::spawn(move || {
        let result = match provider.perform(&request) {
            Ok(text) => ActionResult::Success { text },
            Err(err) => ActionResult::Failure {
                reason: format!("{err:#}"),
            },
        };
        if cancel_for_worker.is_cancelled() {
            log_debug(&format!("discarding cancelled result for {request:?}"));
        } else {
            queue.push(Event::ActionDone(ActionOutcome { request, result }));
        }
        let _ = done_tx.send(());
    });

    ActionJob {
        cancel,
        done_rx,
        handle: Some(handle),
    }
}
