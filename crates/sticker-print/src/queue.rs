// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory print job queue and status tracker.
//
// `add_job` records a pending job and hands it to a worker task on the
// queue's runtime, so it may be called from any thread.  Workers serialize on
// a per-device lock: raster streams for one printer never interleave, while
// jobs for different printers run in parallel.  Job records live for the
// lifetime of the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use sticker_core::catalog::LabelType;
use sticker_core::error::{Result, StickerError};
use sticker_core::types::{JobId, JobSnapshot, JobStatus, PrinterInfo, Rotation};

use crate::executor::{PrintExecutor, PrintOutcome};

/// Everything a worker needs to print one label.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub image: Arc<DynamicImage>,
    pub rotate: Rotation,
    pub dither: bool,
    pub printer: PrinterInfo,
    pub label_type: LabelType,
}

/// Bookkeeping for one job.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub id: JobId,
    pub status: JobStatus,
    pub error: Option<String>,
    pub message: Option<String>,
    pub printer: PrinterInfo,
    pub label_type: LabelType,
    pub rotate: Rotation,
    pub dither: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrintJob {
    fn new(request: &JobRequest) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            error: None,
            message: None,
            printer: request.printer.clone(),
            label_type: request.label_type,
            rotate: request.rotate,
            dither: request.dither,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            status: self.status,
            error: self.error.clone(),
            message: self.message.clone(),
            printer: self.printer.clone(),
            label_type: self.label_type,
            rotate: self.rotate,
            dither: self.dither,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

struct JobEntry {
    job: PrintJob,
    status_tx: watch::Sender<JobStatus>,
}

#[derive(Default)]
struct JobTable {
    entries: HashMap<JobId, JobEntry>,
    /// Insertion order.
    order: Vec<JobId>,
}

struct QueueInner {
    executor: PrintExecutor,
    runtime: Handle,
    table: Mutex<JobTable>,
    device_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl QueueInner {
    fn table(&self) -> MutexGuard<'_, JobTable> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn device_lock(&self, identifier: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.device_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(identifier.to_string()).or_default())
    }

    /// Apply a state transition.  Returns `false` if the job is unknown or
    /// the transition is not allowed.
    fn transition(
        &self,
        id: JobId,
        next: JobStatus,
        error: Option<String>,
        message: Option<String>,
    ) -> bool {
        let mut table = self.table();
        let Some(entry) = table.entries.get_mut(&id) else {
            return false;
        };
        if !entry.job.status.can_transition_to(next) {
            warn!(
                job_id = %id,
                from = %entry.job.status,
                to = %next,
                "rejected job state transition"
            );
            return false;
        }
        entry.job.status = next;
        entry.job.updated_at = Utc::now();
        if error.is_some() {
            entry.job.error = error;
        }
        if message.is_some() {
            entry.job.message = message;
        }
        entry.status_tx.send_replace(next);
        debug!(job_id = %id, status = %next, "job status updated");
        true
    }
}

/// Shared handle to the job queue.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<QueueInner>,
}

impl JobQueue {
    /// Workers are spawned on `runtime`.
    pub fn new(executor: PrintExecutor, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                executor,
                runtime,
                table: Mutex::new(JobTable::default()),
                device_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Record a pending job and start its worker.
    #[instrument(skip_all, fields(printer = %request.printer.identifier, label_type = %request.label_type))]
    pub fn add_job(&self, request: JobRequest) -> JobId {
        let job = PrintJob::new(&request);
        let id = job.id;
        let (status_tx, _) = watch::channel(JobStatus::Pending);
        {
            let mut table = self.inner.table();
            table.entries.insert(id, JobEntry { job, status_tx });
            table.order.push(id);
        }
        info!(job_id = %id, "job queued");

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(run_job(inner, id, request));
        id
    }

    /// Current state of a job.
    pub fn get_job_status(&self, id: JobId) -> Result<JobSnapshot> {
        self.inner
            .table()
            .entries
            .get(&id)
            .map(|entry| entry.job.snapshot())
            .ok_or(StickerError::JobNotFound(id))
    }

    /// Wait until the job is completed or failed.  On timeout the job keeps
    /// running and `WaitTimeout` is returned.
    #[instrument(skip(self), fields(job_id = %id))]
    pub async fn wait_for_completion(&self, id: JobId, timeout: Duration) -> Result<JobSnapshot> {
        let mut status_rx = {
            let table = self.inner.table();
            let entry = table.entries.get(&id).ok_or(StickerError::JobNotFound(id))?;
            entry.status_tx.subscribe()
        };

        match tokio::time::timeout(timeout, status_rx.wait_for(JobStatus::is_terminal)).await {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => return Err(StickerError::JobNotFound(id)),
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs_f32(), "gave up waiting for job");
                return Err(StickerError::WaitTimeout(id));
            }
        }
        self.get_job_status(id)
    }

    /// All jobs, newest first.
    pub fn jobs(&self) -> Vec<JobSnapshot> {
        let table = self.inner.table();
        table
            .order
            .iter()
            .rev()
            .filter_map(|id| table.entries.get(id))
            .map(|entry| entry.job.snapshot())
            .collect()
    }
}

async fn run_job(inner: Arc<QueueInner>, id: JobId, request: JobRequest) {
    let device = inner.device_lock(&request.printer.identifier);
    let _guard = device.lock().await;

    if !inner.transition(id, JobStatus::Processing, None, None) {
        warn!(job_id = %id, "job could not be claimed, skipping");
        return;
    }
    info!(job_id = %id, printer = %request.printer.identifier, "job processing");

    let outcome = inner
        .executor
        .print_image(
            request.image,
            &request.printer,
            request.rotate,
            request.dither,
            request.label_type,
        )
        .await;

    let (status, error, message) = match outcome {
        PrintOutcome::Success => (JobStatus::Completed, None, None),
        PrintOutcome::SuccessAfterTimeout(advisory) => (JobStatus::Completed, None, Some(advisory)),
        PrintOutcome::Failure(detail) => (JobStatus::Failed, Some(detail), None),
    };
    if inner.transition(id, status, error, message) {
        info!(job_id = %id, %status, "job finished");
    }
}
