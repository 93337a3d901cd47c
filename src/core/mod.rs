//! Core modules for Smile Meter

pub mod api;
pub mod camera;
pub mod curvature;
pub mod detection_loop;
pub mod display;
pub mod engine;
pub mod fusion;
pub mod replay;
pub mod smoother;
pub mod tiers;

pub use api::{create_router, router, run_server, AppState, LiveUpdate};
pub use camera::CameraLifecycle;
pub use curvature::CurvatureAdjuster;
pub use detection_loop::{DetectionLoop, FaceDetector, FeedbackSink, LoopHandle, LoopSummary, TickOutcome};
pub use display::{DetectorOptions, DisplayFit};
pub use engine::{ResetPolicy, SmileEngine};
pub use fusion::ExpressionFusion;
pub use replay::{parse_frame_line, LineDetector};
pub use smoother::AdaptiveSmoother;
pub use tiers::{CelebrationMode, CelebrationTrigger, TierClassifier};
