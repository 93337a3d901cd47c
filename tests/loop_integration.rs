//! Integration tests for the detection loop
//!
//! Tests scheduling, failure handling and single-flight ticks with scripted detectors

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use smile_meter::core::{
    CameraLifecycle, DetectionLoop, DetectorOptions, FaceDetector, FeedbackSink, ResetPolicy, SmileEngine,
    TickOutcome,
};
use smile_meter::types::{CelebrationEvent, Detection, ExpressionSample, LandmarkPoint, MouthLandmarks, ScoreUpdate};
use smile_meter::{Result, SmileConfig, SmileError};

fn test_config() -> SmileConfig {
    SmileConfig {
        retry_delay: Duration::from_millis(20),
        frame_interval: Duration::ZERO,
        ..SmileConfig::default()
    }
}

fn happy(h: f64) -> Detection {
    Detection::expressions_only(ExpressionSample::new(h, 0.0, 0.0))
}

fn beaming() -> Detection {
    Detection::new(
        ExpressionSample::new(1.0, 0.0, 0.0),
        MouthLandmarks::from_anchors(
            LandmarkPoint::new(100.0, 200.0),
            LandmarkPoint::new(160.0, 200.0),
            LandmarkPoint::new(130.0, 205.0),
            LandmarkPoint::new(130.0, 215.0),
        ),
    )
}

/// Plays back a fixed list of results, then reports the source exhausted
struct ScriptedDetector {
    script: VecDeque<Result<Option<Detection>>>,
    streaming: bool,
}

impl ScriptedDetector {
    fn new(script: Vec<Result<Option<Detection>>>) -> Self {
        Self {
            script: script.into(),
            streaming: true,
        }
    }
}

#[async_trait]
impl FaceDetector for ScriptedDetector {
    async fn detect(&mut self, _options: &DetectorOptions) -> Result<Option<Detection>> {
        self.script.pop_front().unwrap_or(Err(SmileError::SourceExhausted))
    }

    fn frame_available(&self) -> bool {
        self.streaming
    }
}

/// Always sees the same face
struct SteadyDetector;

#[async_trait]
impl FaceDetector for SteadyDetector {
    async fn detect(&mut self, _options: &DetectorOptions) -> Result<Option<Detection>> {
        Ok(Some(happy(0.8)))
    }
}

/// Blocks inside detect until released
struct GatedDetector {
    entered: Arc<Notify>,
    gate: Arc<Notify>,
}

#[async_trait]
impl FaceDetector for GatedDetector {
    async fn detect(&mut self, _options: &DetectorOptions) -> Result<Option<Detection>> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(Some(happy(1.0)))
    }
}

/// Serves frames until the stream drops once, then needs a restart
struct FlakyCamera {
    camera: CameraLifecycle,
    frames: VecDeque<Detection>,
    drop_after: usize,
    served: usize,
}

#[async_trait]
impl FaceDetector for FlakyCamera {
    async fn detect(&mut self, _options: &DetectorOptions) -> Result<Option<Detection>> {
        if self.served == self.drop_after && self.camera.retries() == 0 {
            self.camera.fail("usb reset")?;
            return Err(SmileError::detection("stream lost"));
        }
        self.served += 1;
        self.frames.pop_front().map(Some).ok_or(SmileError::SourceExhausted)
    }

    fn frame_available(&self) -> bool {
        self.camera.frame_available()
    }

    async fn restart(&mut self) -> Result<()> {
        self.camera.reacquire()
    }
}

#[derive(Default)]
struct RecordingSink {
    scores: Vec<ScoreUpdate>,
    no_faces: Vec<f64>,
    celebrations: Vec<CelebrationEvent>,
    errors: Vec<String>,
    error_times: Vec<Instant>,
    score_times: Vec<Instant>,
}

impl FeedbackSink for RecordingSink {
    fn on_score(&mut self, update: &ScoreUpdate) {
        self.scores.push(update.clone());
        self.score_times.push(Instant::now());
    }

    fn on_no_face(&mut self, score: f64) {
        self.no_faces.push(score);
    }

    fn on_celebration(&mut self, event: &CelebrationEvent) {
        self.celebrations.push(event.clone());
    }

    fn on_detection_error(&mut self, error: &SmileError) {
        self.errors.push(error.to_string());
        self.error_times.push(Instant::now());
    }
}

#[tokio::test]
async fn test_failure_waits_then_continues() {
    let detector = ScriptedDetector::new(vec![
        Err(SmileError::detection("model not ready")),
        Ok(Some(happy(1.0))),
        Ok(None),
    ]);
    let detection_loop = DetectionLoop::new(detector, RecordingSink::default(), SmileEngine::default(), &test_config());

    let started = tokio::time::Instant::now();
    let summary = detection_loop.run().await;

    assert!(started.elapsed() >= Duration::from_millis(20));
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.failures, 1);
    assert!((summary.final_score - 85.95).abs() < 1e-9);

    let (_, sink, _) = detection_loop.into_parts();
    assert_eq!(sink.errors.len(), 1);
    assert!(sink.errors[0].contains("model not ready"));
    assert_eq!(sink.scores.len(), 1);
    assert_eq!(sink.no_faces, vec![summary.final_score]);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_failures_wait_the_same_fixed_delay() {
    let delay = Duration::from_millis(2000);
    let config = SmileConfig {
        retry_delay: delay,
        ..test_config()
    };
    let detector = ScriptedDetector::new(vec![
        Err(SmileError::detection("model not ready")),
        Err(SmileError::detection("model not ready")),
        Err(SmileError::detection("model not ready")),
        Err(SmileError::detection("model not ready")),
        Ok(Some(happy(1.0))),
    ]);
    let detection_loop = DetectionLoop::new(detector, RecordingSink::default(), SmileEngine::default(), &config);

    let summary = detection_loop.run().await;
    assert_eq!(summary.failures, 4);
    assert_eq!(summary.frames, 1);

    let (_, sink, _) = detection_loop.into_parts();
    let mut instants = sink.error_times.clone();
    instants.extend(&sink.score_times);
    let gaps: Vec<Duration> = instants.windows(2).map(|w| w[1] - w[0]).collect();

    assert_eq!(gaps.len(), 4);
    for gap in gaps {
        assert!(gap >= delay, "gap {:?} shorter than retry delay", gap);
        assert!(gap < delay + Duration::from_millis(5), "gap {:?} grew past the fixed delay", gap);
    }
}

#[tokio::test(start_paused = true)]
async fn test_camera_restart_keeps_score_by_default() {
    let camera = FlakyCamera {
        camera: CameraLifecycle::streaming(),
        frames: vec![happy(1.0), happy(1.0)].into(),
        drop_after: 1,
        served: 0,
    };
    let detection_loop = DetectionLoop::new(camera, RecordingSink::default(), SmileEngine::default(), &test_config());

    let summary = detection_loop.run().await;
    assert_eq!(summary.camera_restarts, 1);
    assert_eq!(summary.failures, 1);
    assert_eq!(summary.frames, 2);

    let (camera, sink, _) = detection_loop.into_parts();
    assert_eq!(camera.camera.retries(), 1);
    // second frame smoothed from 85.95, not from 80
    assert!(sink.scores[1].score > 85.95 + 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_camera_restart_applies_reset_policy() {
    let config = SmileConfig {
        reset_policy: ResetPolicy::Reset,
        ..test_config()
    };
    let camera = FlakyCamera {
        camera: CameraLifecycle::streaming(),
        frames: vec![happy(1.0), happy(1.0)].into(),
        drop_after: 1,
        served: 0,
    };
    let detection_loop = DetectionLoop::new(camera, RecordingSink::default(), SmileEngine::default(), &config);

    let summary = detection_loop.run().await;
    assert_eq!(summary.camera_restarts, 1);

    let (_, sink, engine) = detection_loop.into_parts();
    assert_eq!(sink.scores.len(), 2);
    assert!((sink.scores[1].score - 85.95).abs() < 1e-9);
    assert_eq!(engine.state().update_count(), 1);
}

#[tokio::test]
async fn test_malformed_detection_is_a_skipped_frame() {
    let bad = Detection::expressions_only(ExpressionSample::new(f64::NAN, 0.0, 0.0));
    let detector = ScriptedDetector::new(vec![Ok(Some(bad))]);
    let detection_loop = DetectionLoop::new(detector, RecordingSink::default(), SmileEngine::default(), &test_config());

    assert!(matches!(detection_loop.tick().await, TickOutcome::Failed(_)));
    assert_eq!(detection_loop.score().await, 80.0);
    assert_eq!(detection_loop.failures(), 1);
    assert_eq!(detection_loop.frames_seen(), 0);
}

#[tokio::test]
async fn test_no_face_frames_leave_score() {
    let detector = ScriptedDetector::new(vec![Ok(Some(happy(0.5))), Ok(None), Ok(None), Ok(None), Ok(None), Ok(None)]);
    let detection_loop = DetectionLoop::new(detector, RecordingSink::default(), SmileEngine::default(), &test_config());

    let summary = detection_loop.run().await;
    let (_, sink, engine) = detection_loop.into_parts();

    assert_eq!(sink.scores.len(), 1);
    assert_eq!(sink.no_faces.len(), 5);
    assert!(sink.no_faces.iter().all(|s| *s == sink.scores[0].score));
    assert_eq!(engine.state().update_count(), 1);
    assert_eq!(summary.final_score, sink.scores[0].score);
}

#[tokio::test]
async fn test_celebration_reaches_sink_once() {
    let script = (0..120).map(|_| Ok(Some(beaming()))).collect();
    let detection_loop = DetectionLoop::new(
        ScriptedDetector::new(script),
        RecordingSink::default(),
        SmileEngine::default(),
        &test_config(),
    );

    detection_loop.run().await;
    let (_, sink, _) = detection_loop.into_parts();

    assert_eq!(sink.scores.len(), 120);
    assert_eq!(sink.celebrations.len(), 1);
    assert_eq!(sink.celebrations[0].score, 100);
    assert_eq!(sink.celebrations[0].effect_ms, 5000);
    assert_eq!(sink.scores.iter().filter(|u| u.celebrate).count(), 1);
}

#[tokio::test]
async fn test_overlapping_tick_is_busy() {
    let entered = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    let detector = GatedDetector {
        entered: Arc::clone(&entered),
        gate: Arc::clone(&gate),
    };
    let detection_loop = Arc::new(DetectionLoop::new(
        detector,
        RecordingSink::default(),
        SmileEngine::default(),
        &test_config(),
    ));

    let first = {
        let detection_loop = Arc::clone(&detection_loop);
        tokio::spawn(async move { detection_loop.tick().await })
    };
    entered.notified().await;

    assert!(matches!(detection_loop.tick().await, TickOutcome::Busy));

    gate.notify_one();
    let outcome = first.await.unwrap();
    assert!(matches!(outcome, TickOutcome::Scored(_)));
    assert_eq!(detection_loop.frames_seen(), 1);
    assert!((detection_loop.score().await - 85.95).abs() < 1e-9);
}

#[tokio::test]
async fn test_stop_handle_ends_run() {
    let config = SmileConfig {
        frame_interval: Duration::from_millis(1),
        ..test_config()
    };
    let detection_loop = Arc::new(DetectionLoop::new(
        SteadyDetector,
        RecordingSink::default(),
        SmileEngine::default(),
        &config,
    ));
    let handle = detection_loop.handle();

    let runner = {
        let detection_loop = Arc::clone(&detection_loop);
        tokio::spawn(async move { detection_loop.run().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    handle.stop();

    let summary = tokio::time::timeout(Duration::from_secs(2), runner)
        .await
        .expect("run did not stop")
        .unwrap();
    assert!(summary.frames > 0);
    assert!(!handle.is_running());
    assert!(matches!(detection_loop.tick().await, TickOutcome::Stopped));
}

#[tokio::test]
async fn test_reinitialize_rearms_loop() {
    let detector = ScriptedDetector::new(vec![Ok(Some(happy(1.0))), Ok(Some(happy(1.0)))]);
    let detection_loop = DetectionLoop::new(detector, RecordingSink::default(), SmileEngine::default(), &test_config());

    assert!(matches!(detection_loop.tick().await, TickOutcome::Scored(_)));
    let kept = detection_loop.score().await;
    detection_loop.handle().stop();
    assert!(matches!(detection_loop.tick().await, TickOutcome::Stopped));

    detection_loop.reinitialize(ResetPolicy::Keep).await;
    assert!(detection_loop.is_running());
    assert_eq!(detection_loop.score().await, kept);

    detection_loop.reinitialize(ResetPolicy::Reset).await;
    assert_eq!(detection_loop.score().await, 80.0);
    assert!(matches!(detection_loop.tick().await, TickOutcome::Scored(_)));
}

#[tokio::test]
async fn test_no_frame_when_camera_not_streaming() {
    let mut detector = ScriptedDetector::new(vec![Ok(Some(happy(1.0)))]);
    detector.streaming = false;
    let detection_loop = DetectionLoop::new(detector, RecordingSink::default(), SmileEngine::default(), &test_config());

    assert!(matches!(detection_loop.tick().await, TickOutcome::NoFrame));
    assert_eq!(detection_loop.score().await, 80.0);
}

#[test]
fn test_detector_options_follow_display_width() {
    let mobile = SmileConfig {
        display_width: 390,
        ..SmileConfig::default()
    };
    let detection_loop = DetectionLoop::new(SteadyDetector, RecordingSink::default(), SmileEngine::default(), &mobile);
    assert_eq!(detection_loop.options().input_size, 224);
    assert_eq!(detection_loop.options().score_threshold, 0.5);
}
