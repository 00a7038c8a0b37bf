use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Result;
use image::DynamicImage;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::classification::preprocessing;
use crate::classification::{ClassificationModel, ModelSet};
use crate::models::{InferenceReport, InferenceRequest, ModelOutcome, RequestId};

/// Work sent to the inference thread: one image, one result slot per model
struct Job {
    request: RequestId,
    payload: InferenceRequest,
    slots: Vec<oneshot::Sender<ModelOutcome>>,
}

/// Runs every configured model over submitted images on a single background
/// thread.
///
/// Models are invoked one after another for each request. Each invocation is
/// isolated: an error or panic in one model is logged and reported through
/// that model's handle only.
pub struct InferenceRunner {
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    latest: Arc<AtomicU64>,
    tags: Vec<String>,
}

impl InferenceRunner {
    pub fn new(models: ModelSet) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let latest = Arc::new(AtomicU64::new(0));
        let tags = models.tags().map(str::to_string).collect();

        let worker_latest = latest.clone();
        let worker = std::thread::Builder::new()
            .name("otofind-inference".to_string())
            .spawn(move || run_worker(models, receiver, worker_latest))?;

        Ok(Self {
            jobs: Some(sender),
            worker: Some(worker),
            latest,
            tags,
        })
    }

    /// Tags of the models every submission is run against, in invocation order
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Queue an image for classification and return one handle per model.
    ///
    /// Submitting supersedes every earlier request: models of older requests
    /// that have not started yet are skipped.
    pub fn submit(&self, payload: InferenceRequest) -> Result<Submission> {
        let request = RequestId(self.latest.fetch_add(1, Ordering::SeqCst) + 1);

        let mut slots = Vec::with_capacity(self.tags.len());
        let mut handles = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let (sender, receiver) = oneshot::channel();
            slots.push(sender);
            handles.push(InferenceHandle {
                request,
                tag: tag.clone(),
                receiver,
            });
        }

        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Inference runner is shut down"))?;
        jobs.send(Job {
            request,
            payload,
            slots,
        })
        .map_err(|_| anyhow::anyhow!("Inference worker has stopped"))?;

        log::debug!("Submitted request {} to {} models", request, self.tags.len());

        Ok(Submission { request, handles })
    }
}

impl Drop for InferenceRunner {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the current job is done
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if !worker.is_finished() {
                // A model that never returns must not block shutdown
                log::debug!("Detaching inference worker that is still busy");
                return;
            }
            if worker.join().is_err() {
                log::error!("Inference worker terminated abnormally");
            }
        }
    }
}

/// Handles for all models of one submitted request.
#[derive(Debug)]
pub struct Submission {
    pub request: RequestId,
    pub handles: Vec<InferenceHandle>,
}

impl Submission {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every model, yielding reports in completion order.
    /// Must be called from within a tokio runtime.
    pub async fn collect_within(self, timeout: Duration) -> Vec<InferenceReport> {
        let mut pending = JoinSet::new();
        for handle in self.handles {
            pending.spawn(handle.outcome_within(timeout));
        }

        let mut reports = Vec::new();
        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => log::error!("Waiting for a model result failed: {}", e),
            }
        }
        reports
    }
}

/// Pending result of one model for one request.
#[derive(Debug)]
pub struct InferenceHandle {
    request: RequestId,
    tag: String,
    receiver: oneshot::Receiver<ModelOutcome>,
}

impl InferenceHandle {
    pub fn request(&self) -> RequestId {
        self.request
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Wait for the model to finish
    pub async fn outcome(self) -> InferenceReport {
        let outcome = self.receiver.await.unwrap_or_else(|_| worker_dropped());
        InferenceReport {
            request: self.request,
            tag: self.tag,
            outcome,
        }
    }

    /// Wait for the model to finish, giving up after `timeout`
    pub async fn outcome_within(self, timeout: Duration) -> InferenceReport {
        let outcome = match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => worker_dropped(),
            Err(_) => {
                log::warn!(
                    "Model '{}' gave no result for request {} within {:?}",
                    self.tag,
                    self.request,
                    timeout
                );
                ModelOutcome::Failed(format!("no result within {:?}", timeout))
            }
        };
        InferenceReport {
            request: self.request,
            tag: self.tag,
            outcome,
        }
    }

    /// Block the current thread until the model finishes.
    /// Must not be called from async code.
    pub fn blocking_outcome(self) -> InferenceReport {
        let outcome = self.receiver.blocking_recv().unwrap_or_else(|_| worker_dropped());
        InferenceReport {
            request: self.request,
            tag: self.tag,
            outcome,
        }
    }
}

fn worker_dropped() -> ModelOutcome {
    ModelOutcome::Failed("inference worker dropped the request".to_string())
}

fn run_worker(models: ModelSet, jobs: Receiver<Job>, latest: Arc<AtomicU64>) {
    for job in jobs {
        process_job(&models, job, &latest);
    }
    log::debug!("Inference worker stopped");
}

fn process_job(models: &ModelSet, job: Job, latest: &AtomicU64) {
    let Job {
        request,
        payload,
        slots,
    } = job;

    let image = preprocessing::normalize_orientation(payload.image, payload.orientation);
    if image.width() == 0 || image.height() == 0 {
        log::error!("Request {} carries an empty image, nothing to classify", request);
        for slot in slots {
            let _ = slot.send(ModelOutcome::Failed("image is empty".to_string()));
        }
        return;
    }

    for ((tag, model), slot) in models.iter().zip(slots) {
        if latest.load(Ordering::SeqCst) > request.0 {
            log::debug!("Skipping '{}' for superseded request {}", tag, request);
            let _ = slot.send(ModelOutcome::Superseded);
            continue;
        }

        let outcome = invoke(tag, model, &image);
        if slot.send(outcome).is_err() {
            log::debug!("Result of '{}' for request {} was not awaited", tag, request);
        }
    }
}

fn invoke(tag: &str, model: &dyn ClassificationModel, image: &DynamicImage) -> ModelOutcome {
    let started = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let input = preprocessing::prepare_input(image, model.input_size())?;
        model.predict(&input)
    }));

    match result {
        Ok(Ok(Some(score))) if (0.0..=1.0).contains(&score) => {
            log::debug!("'{}' scored {:.4} in {:?}", tag, score, started.elapsed());
            ModelOutcome::Score(score)
        }
        Ok(Ok(Some(score))) if score.is_finite() => {
            log::warn!("'{}' produced a score outside [0, 1] ({})", tag, score);
            ModelOutcome::Failed(format!("score out of range: {}", score))
        }
        Ok(Ok(Some(score))) => {
            log::warn!("'{}' produced a non-finite score ({})", tag, score);
            ModelOutcome::Failed(format!("non-finite score {}", score))
        }
        Ok(Ok(None)) => {
            log::warn!("'{}' produced no output", tag);
            ModelOutcome::NoResult
        }
        Ok(Err(e)) => {
            log::warn!("'{}' failed: {:#}", tag, e);
            ModelOutcome::Failed(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("'{}' panicked: {}", tag, message);
            ModelOutcome::Failed(format!("model panicked: {}", message))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
