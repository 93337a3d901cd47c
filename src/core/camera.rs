//! Camera lifecycle: Idle → Initializing → Streaming, with Error and retry
//!
//! Transitions:
//! - IDLE → INITIALIZING: begin_init
//! - INITIALIZING → STREAMING: stream_started
//! - INITIALIZING | STREAMING → ERROR: fail
//! - ERROR | STREAMING → IDLE: retry (stream released)
//!
//! A second begin_init while INITIALIZING or STREAMING is refused, which is
//! what keeps a double init from opening two streams.

use std::time::Instant;

use tracing::{info, warn};

use crate::error::{Result, SmileError};
use crate::types::CameraState;

#[derive(Debug)]
pub struct CameraLifecycle {
    state: CameraState,
    state_since: Instant,
    last_error: Option<String>,
    retries: u32,
}

impl Default for CameraLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraLifecycle {
    pub fn new() -> Self {
        Self {
            state: CameraState::Idle,
            state_since: Instant::now(),
            last_error: None,
            retries: 0,
        }
    }

    /// A lifecycle for a source that is already open and delivering frames
    pub fn streaming() -> Self {
        Self {
            state: CameraState::Streaming,
            ..Self::new()
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// The only signal the scoring loop needs
    pub fn frame_available(&self) -> bool {
        self.state == CameraState::Streaming
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Milliseconds spent in the current state
    pub fn state_ms(&self) -> u64 {
        self.state_since.elapsed().as_millis() as u64
    }

    /// Start loading models / requesting the camera
    pub fn begin_init(&mut self) -> Result<()> {
        self.transition(CameraState::Initializing, &[CameraState::Idle])
    }

    /// Stream is live and frames can be read
    pub fn stream_started(&mut self) -> Result<()> {
        self.transition(CameraState::Streaming, &[CameraState::Initializing])?;
        self.last_error = None;
        Ok(())
    }

    /// Initialization or the stream failed
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(CameraState::Error, &[CameraState::Initializing, CameraState::Streaming])?;
        let reason = reason.into();
        warn!(%reason, "camera failed");
        self.last_error = Some(reason);
        Ok(())
    }

    /// Release the stream and go back to IDLE, ready for begin_init
    pub fn retry(&mut self) -> Result<()> {
        self.transition(CameraState::Idle, &[CameraState::Error, CameraState::Streaming])?;
        self.retries += 1;
        Ok(())
    }

    /// Full retry path: release, init again, stream again
    pub fn reacquire(&mut self) -> Result<()> {
        if self.state != CameraState::Idle {
            self.retry()?;
        }
        self.begin_init()?;
        self.stream_started()
    }

    fn transition(&mut self, to: CameraState, allowed_from: &[CameraState]) -> Result<()> {
        if !allowed_from.contains(&self.state) {
            return Err(SmileError::InvalidCameraTransition { from: self.state, to });
        }
        info!(from = %self.state, to = %to, "camera state");
        self.state = to;
        self.state_since = Instant::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reacquire_after_failure() {
        let mut cam = CameraLifecycle::streaming();
        assert!(cam.frame_available());
        cam.fail("usb reset").unwrap();
        assert!(!cam.frame_available());

        cam.reacquire().unwrap();
        assert!(cam.frame_available());
        assert_eq!(cam.retries(), 1);

        let mut idle = CameraLifecycle::new();
        idle.reacquire().unwrap();
        assert_eq!(idle.state(), CameraState::Streaming);
        assert_eq!(idle.retries(), 0);
    }

    #[test]
    fn test_happy_path() {
        let mut cam = CameraLifecycle::new();
        assert!(!cam.frame_available());
        cam.begin_init().unwrap();
        assert_eq!(cam.state(), CameraState::Initializing);
        assert!(!cam.frame_available());
        cam.stream_started().unwrap();
        assert!(cam.frame_available());
    }

    #[test]
    fn test_duplicate_init_refused() {
        let mut cam = CameraLifecycle::new();
        cam.begin_init().unwrap();
        assert!(cam.begin_init().is_err());
        cam.stream_started().unwrap();
        let err = cam.begin_init().unwrap_err();
        assert!(matches!(
            err,
            SmileError::InvalidCameraTransition { from: CameraState::Streaming, to: CameraState::Initializing }
        ));
    }

    #[test]
    fn test_failure_and_retry() {
        let mut cam = CameraLifecycle::new();
        cam.begin_init().unwrap();
        cam.fail("permission denied").unwrap();
        assert_eq!(cam.state(), CameraState::Error);
        assert_eq!(cam.last_error(), Some("permission denied"));

        cam.retry().unwrap();
        assert_eq!(cam.state(), CameraState::Idle);
        assert_eq!(cam.retries(), 1);

        cam.begin_init().unwrap();
        cam.stream_started().unwrap();
        assert!(cam.last_error().is_none());
    }

    #[test]
    fn test_cannot_fail_from_idle() {
        let mut cam = CameraLifecycle::new();
        assert!(cam.fail("nope").is_err());
        assert!(cam.retry().is_err());
    }
}
