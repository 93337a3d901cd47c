//! Line-fed detector: replays recorded detections from a file or stdin
//!
//! One frame per line:
//! - a JSON `Detection` object
//! - `null` / `none` for a frame with no face
//! - `happy=0.9 sad=0.05 ...` shorthand (expressions only, no landmarks)
//! - `quit` / `exit` ends the source
//!
//! Blank lines and `#` comments are skipped. A line that fails to parse is a
//! detection failure for that frame. A read error takes the source's camera
//! lifecycle to ERROR until the loop restarts it.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::core::{CameraLifecycle, DetectorOptions, FaceDetector};
use crate::error::{Result, SmileError};
use crate::types::{Detection, ExpressionSample};

pub struct LineDetector<R> {
    lines: Lines<R>,
    line_no: u64,
    camera: CameraLifecycle,
}

impl<R: AsyncBufRead + Unpin + Send> LineDetector<R> {
    /// Detector over an already-open reader
    pub fn new(reader: R) -> Self {
        Self::with_camera(reader, CameraLifecycle::streaming())
    }

    /// Detector whose stream lifecycle was driven by the caller
    pub fn with_camera(reader: R, camera: CameraLifecycle) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            camera,
        }
    }

    pub fn camera(&self) -> &CameraLifecycle {
        &self.camera
    }

    /// Lines consumed so far
    pub fn line_no(&self) -> u64 {
        self.line_no
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FaceDetector for LineDetector<R> {
    async fn detect(&mut self, _options: &DetectorOptions) -> Result<Option<Detection>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Err(SmileError::SourceExhausted),
                Err(e) => {
                    self.camera.fail(e.to_string())?;
                    return Err(e.into());
                }
            };
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return match parse_frame_line(line) {
                Err(SmileError::SourceExhausted) => Err(SmileError::SourceExhausted),
                Err(e) => Err(SmileError::detection(format!("line {}: {}", self.line_no, e))),
                ok => ok,
            };
        }
    }

    fn frame_available(&self) -> bool {
        self.camera.frame_available()
    }

    async fn restart(&mut self) -> Result<()> {
        self.camera.reacquire()
    }
}

/// Parse one recorded frame
pub fn parse_frame_line(line: &str) -> Result<Option<Detection>> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        return Err(SmileError::SourceExhausted);
    }
    if line.eq_ignore_ascii_case("null") || line.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if line.starts_with('{') {
        let detection: Detection = serde_json::from_str(line)?;
        return Ok(Some(detection));
    }

    let mut pairs = Vec::new();
    for token in line.split_whitespace() {
        let (name, value) = token
            .split_once('=')
            .ok_or_else(|| SmileError::malformed(format!("expected name=value, got '{}'", token)))?;
        let p: f64 = value
            .parse()
            .map_err(|_| SmileError::malformed(format!("'{}' is not a number", value)))?;
        pairs.push((name, p));
    }
    let sample = ExpressionSample::from_pairs(pairs);
    Ok(Some(Detection::expressions_only(sample)))
}
