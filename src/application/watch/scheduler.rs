//! Background rebuilds
//!
//! At most one rebuild runs at a time, on its own thread. A plan submitted
//! while another is running waits for it, unless the two overlap: then the
//! running pass is cancelled and its plan absorbed into the next one.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::application::build::{BuildReport, BuildUseCase, CancelToken, RebuildPlan};
use crate::error::{WeaveError, WeaveResult};

/// A finished (or cancelled) rebuild.
#[derive(Debug)]
pub struct JobOutcome {
    pub plan: RebuildPlan,
    pub result: WeaveResult<BuildReport>,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub enum SchedulerEvent {
    Started { full: bool, inputs: usize },
    Finished(JobOutcome),
}

struct Job {
    plan: RebuildPlan,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

pub struct RebuildScheduler {
    build: Arc<BuildUseCase>,
    running: Option<Job>,
    queued: Option<RebuildPlan>,
    events: Vec<SchedulerEvent>,
    tx: Sender<JobOutcome>,
    rx: Receiver<JobOutcome>,
}

impl RebuildScheduler {
    pub fn new(build: Arc<BuildUseCase>) -> Self {
        let (tx, rx) = channel();
        Self {
            build,
            running: None,
            queued: None,
            events: Vec::new(),
            tx,
            rx,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_none() && self.queued.is_none()
    }

    /// Schedule `plan`. Returns whether a running rebuild was superseded.
    pub fn submit(&mut self, plan: RebuildPlan) -> bool {
        if plan.is_empty() {
            return false;
        }
        let Some(job) = &self.running else {
            self.spawn(plan);
            return false;
        };

        let overlapping = overlaps(&job.plan, &plan);
        let mut next = RebuildPlan::default();
        if overlapping {
            debug!("cancelling superseded rebuild");
            job.cancel.cancel();
            next = job.plan.clone();
        }
        if let Some(queued) = self.queued.take() {
            next.merge(queued);
        }
        next.merge(plan);
        self.queued = Some(next);
        overlapping
    }

    /// Collect a finished rebuild, if any, and start the queued one.
    pub fn poll(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.finish(outcome);
        }
    }

    /// Block until nothing is running or queued.
    pub fn wait_idle(&mut self) {
        while self.running.is_some() {
            match self.rx.recv() {
                Ok(outcome) => self.finish(outcome),
                Err(_) => break,
            }
        }
    }

    /// Cancel the running rebuild, drop the queue and wait for the worker.
    pub fn shutdown(&mut self) {
        self.queued = None;
        if let Some(job) = &self.running {
            job.cancel.cancel();
        }
        self.wait_idle();
    }

    pub fn drain_events(&mut self) -> Vec<SchedulerEvent> {
        std::mem::take(&mut self.events)
    }

    fn finish(&mut self, outcome: JobOutcome) {
        if let Some(mut job) = self.running.take() {
            if let Some(handle) = job.handle.take() {
                if handle.join().is_err() {
                    warn!("rebuild worker panicked");
                }
            }
        }
        self.events.push(SchedulerEvent::Finished(outcome));
        if let Some(next) = self.queued.take() {
            self.spawn(next);
        }
    }

    fn spawn(&mut self, plan: RebuildPlan) {
        let cancel = CancelToken::new();
        self.events.push(SchedulerEvent::Started {
            full: plan.full,
            inputs: plan.paths().len(),
        });

        let build = self.build.clone();
        let tx = self.tx.clone();
        let job_plan = plan.clone();
        let job_cancel = cancel.clone();
        let spawned = thread::Builder::new()
            .name("weave-rebuild".to_string())
            .spawn(move || {
                let started = Instant::now();
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    build.rebuild(&job_plan, &job_cancel)
                }))
                .unwrap_or_else(|payload| {
                    Err(WeaveError::WorkerPanicked {
                        message: panic_message(payload.as_ref()),
                    })
                });
                let _ = tx.send(JobOutcome {
                    plan: job_plan,
                    result,
                    elapsed: started.elapsed(),
                });
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                let _ = self.tx.send(JobOutcome {
                    plan: plan.clone(),
                    result: Err(WeaveError::Io(e)),
                    elapsed: Duration::ZERO,
                });
                None
            }
        };
        self.running = Some(Job {
            plan,
            cancel,
            handle,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Two plans overlap when either rebuilds everything or they touch a common
/// input.
fn overlaps(running: &RebuildPlan, newer: &RebuildPlan) -> bool {
    if running.full || newer.full {
        return true;
    }
    let touched = running.paths();
    newer.paths().iter().any(|p| touched.contains(p))
}
