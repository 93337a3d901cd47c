//! Detection loop: acquire → detect → score → publish, one frame at a time
//!
//! `tick()` is single-flight. The engine, detector and sink live behind one
//! async mutex; an overlapping tick fails `try_lock` and returns `Busy`
//! without touching the score. `run()` repeats ticks while the running flag
//! is set, sleeping a fixed retry delay after each failure. When the camera
//! stops streaming, `run()` waits the same delay, asks the detector to
//! restart it and applies the configured reset policy to the engine.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::SmileConfig;
use crate::core::{DetectorOptions, ResetPolicy, SmileEngine};
use crate::error::{Result, SmileError};
use crate::types::{CelebrationEvent, Detection, FrameOutcome, ScoreUpdate};

/// Source of per-frame detections (the face model)
#[async_trait]
pub trait FaceDetector: Send {
    /// Detect the single best face. `Ok(None)` means no face this frame.
    async fn detect(&mut self, options: &DetectorOptions) -> Result<Option<Detection>>;

    /// Whether the camera currently has frames to read
    fn frame_available(&self) -> bool {
        true
    }

    /// Camera retry: release and reacquire the stream
    async fn restart(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Receiver of display and celebration side effects
pub trait FeedbackSink: Send {
    /// A frame was scored
    fn on_score(&mut self, update: &ScoreUpdate);

    /// No face this frame; score unchanged
    fn on_no_face(&mut self, _score: f64) {}

    /// Top tier entered
    fn on_celebration(&mut self, _event: &CelebrationEvent) {}

    /// Frame skipped after a detection failure
    fn on_detection_error(&mut self, _error: &SmileError) {}
}

/// What a single tick did
#[derive(Debug, Clone)]
pub enum TickOutcome {
    Scored(ScoreUpdate),
    NoFace,
    /// Camera not streaming; nothing detected
    NoFrame,
    /// Detection failed; state untouched
    Failed(String),
    /// Another tick is in flight
    Busy,
    /// Running flag cleared
    Stopped,
    /// Frame source has ended
    Exhausted,
}

/// Totals reported when `run()` returns
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSummary {
    pub frames: u64,
    pub failures: u64,
    pub camera_restarts: u64,
    pub final_score: f64,
}

/// Cloneable stop switch for a running loop
#[derive(Debug, Clone)]
pub struct LoopHandle {
    running: Arc<AtomicBool>,
}

impl LoopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

struct LoopInner<D, S> {
    detector: D,
    sink: S,
    engine: SmileEngine,
}

pub struct DetectionLoop<D, S> {
    inner: Mutex<LoopInner<D, S>>,
    running: Arc<AtomicBool>,
    options: DetectorOptions,
    retry_delay: Duration,
    frame_interval: Duration,
    reset_policy: ResetPolicy,
    frames: AtomicU64,
    failures: AtomicU64,
    camera_restarts: AtomicU64,
}

impl<D: FaceDetector, S: FeedbackSink> DetectionLoop<D, S> {
    /// Create a loop; it starts armed (running flag set)
    pub fn new(detector: D, sink: S, engine: SmileEngine, config: &SmileConfig) -> Self {
        Self {
            inner: Mutex::new(LoopInner { detector, sink, engine }),
            running: Arc::new(AtomicBool::new(true)),
            options: DetectorOptions::for_display_width(config.display_width),
            retry_delay: config.retry_delay,
            frame_interval: config.frame_interval,
            reset_policy: config.reset_policy,
            frames: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            camera_restarts: AtomicU64::new(0),
        }
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> DetectorOptions {
        self.options
    }

    /// Frames that reached the engine (scored or no face)
    pub fn frames_seen(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn camera_restarts(&self) -> u64 {
        self.camera_restarts.load(Ordering::SeqCst)
    }

    /// Run one frame through the pipeline
    pub async fn tick(&self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Stopped;
        }
        let Ok(mut guard) = self.inner.try_lock() else {
            debug!("tick skipped: previous frame still in flight");
            return TickOutcome::Busy;
        };
        let LoopInner { detector, sink, engine } = &mut *guard;

        if !detector.frame_available() {
            return TickOutcome::NoFrame;
        }

        let detection = match detector.detect(&self.options).await {
            Ok(detection) => detection,
            Err(SmileError::SourceExhausted) => return TickOutcome::Exhausted,
            Err(e) => return self.record_failure(sink, e),
        };

        match engine.process(detection.as_ref()) {
            Ok(FrameOutcome::Scored(update)) => {
                self.frames.fetch_add(1, Ordering::SeqCst);
                sink.on_score(&update);
                if let Some(event) = engine.take_celebration() {
                    sink.on_celebration(&event);
                }
                TickOutcome::Scored(update)
            }
            Ok(FrameOutcome::NoFace { score, .. }) => {
                self.frames.fetch_add(1, Ordering::SeqCst);
                sink.on_no_face(score);
                TickOutcome::NoFace
            }
            Err(e) => self.record_failure(sink, e),
        }
    }

    fn record_failure(&self, sink: &mut S, error: SmileError) -> TickOutcome {
        self.failures.fetch_add(1, Ordering::SeqCst);
        let retry_ms = self.retry_delay.as_millis() as u64;
        if error.is_frame_failure() {
            warn!(error = %error, retry_ms, "frame skipped");
        } else {
            error!(error = %error, retry_ms, "frame source error");
        }
        sink.on_detection_error(&error);
        TickOutcome::Failed(error.to_string())
    }

    /// Loop until stopped or the source is exhausted
    pub async fn run(&self) -> LoopSummary {
        info!(input_size = self.options.input_size, "detection loop started");

        while self.is_running() {
            match self.tick().await {
                TickOutcome::Failed(_) => tokio::time::sleep(self.retry_delay).await,
                TickOutcome::Exhausted => {
                    info!("frame source exhausted");
                    self.handle().stop();
                }
                TickOutcome::Stopped => break,
                TickOutcome::Busy => tokio::task::yield_now().await,
                TickOutcome::NoFrame => {
                    tokio::time::sleep(self.retry_delay).await;
                    if self.is_running() {
                        self.retry_camera().await;
                    }
                }
                TickOutcome::Scored(_) | TickOutcome::NoFace => {
                    if self.frame_interval.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(self.frame_interval).await;
                    }
                }
            }
        }

        let summary = LoopSummary {
            frames: self.frames_seen(),
            failures: self.failures(),
            camera_restarts: self.camera_restarts(),
            final_score: self.score().await,
        };
        info!(
            frames = summary.frames,
            failures = summary.failures,
            score = summary.final_score,
            "detection loop stopped"
        );
        summary
    }

    /// Current running score
    pub async fn score(&self) -> f64 {
        self.inner.lock().await.engine.score()
    }

    /// Restart the camera through the detector, then reset the engine with
    /// the configured policy. Returns whether the camera came back.
    pub async fn retry_camera(&self) -> bool {
        let mut guard = self.inner.lock().await;
        let LoopInner { detector, engine, .. } = &mut *guard;

        match detector.restart().await {
            Ok(()) => {
                engine.reinitialize(self.reset_policy);
                let restarts = self.camera_restarts.fetch_add(1, Ordering::SeqCst) + 1;
                info!(restarts, policy = ?self.reset_policy, score = engine.score(), "camera restarted");
                true
            }
            Err(e) => {
                warn!(error = %e, retry_ms = self.retry_delay.as_millis() as u64, "camera restart failed");
                false
            }
        }
    }

    /// Re-arm the loop and apply a reset policy
    pub async fn reinitialize(&self, policy: ResetPolicy) {
        self.inner.lock().await.engine.reinitialize(policy);
        self.running.store(true, Ordering::SeqCst);
    }

    /// Tear down, returning detector, sink and engine
    pub fn into_parts(self) -> (D, S, SmileEngine) {
        let inner = self.inner.into_inner();
        (inner.detector, inner.sink, inner.engine)
    }
}
