//! Display fitting: size the overlay to cover its wrapper and map detector
//! coordinates into display coordinates.

use serde::{Deserialize, Serialize};

use crate::types::{Detection, MouthLandmarks};
use crate::{DETECTOR_INPUT_DESKTOP, DETECTOR_INPUT_MOBILE, DETECTOR_SCORE_THRESHOLD, MOBILE_MAX_WIDTH};

/// Overlay geometry for a video shown in a wrapper box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayFit {
    pub video_width: f64,
    pub video_height: f64,
    pub width: f64,
    pub height: f64,
    /// Horizontal offset centering the overlay in the wrapper
    pub left: f64,
    /// Vertical offset centering the overlay in the wrapper
    pub top: f64,
}

impl DisplayFit {
    /// Scale the video to fill the wrapper, keeping aspect, centered.
    ///
    /// Returns None for zero-sized inputs.
    pub fn cover(video_width: f64, video_height: f64, wrapper_width: f64, wrapper_height: f64) -> Option<Self> {
        if video_width <= 0.0 || video_height <= 0.0 || wrapper_width <= 0.0 || wrapper_height <= 0.0 {
            return None;
        }
        let video_ratio = video_width / video_height;
        let wrapper_ratio = wrapper_width / wrapper_height;

        let (width, height) = if video_ratio > wrapper_ratio {
            // wider video: match heights
            (wrapper_height * video_ratio, wrapper_height)
        } else {
            (wrapper_width, wrapper_width / video_ratio)
        };

        Some(Self {
            video_width,
            video_height,
            width,
            height,
            left: (wrapper_width - width) / 2.0,
            top: (wrapper_height - height) / 2.0,
        })
    }

    /// (sx, sy) from video pixels to overlay pixels
    pub fn scale_factors(&self) -> (f64, f64) {
        (self.width / self.video_width, self.height / self.video_height)
    }

    /// Rescale a mouth contour into overlay coordinates
    pub fn rescale_mouth(&self, mouth: &MouthLandmarks) -> MouthLandmarks {
        let (sx, sy) = self.scale_factors();
        mouth.rescaled(sx, sy)
    }

    /// Rescale a whole detection (expressions are unit-free)
    pub fn rescale_detection(&self, detection: &Detection) -> Detection {
        Detection::new(detection.expressions.clone(), self.rescale_mouth(&detection.mouth))
    }
}

/// Options handed to the face detector each frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorOptions {
    /// Square input size the detector resizes frames to
    pub input_size: u32,
    /// Minimum face confidence
    pub score_threshold: f64,
}

impl DetectorOptions {
    /// Smaller input on mobile-class displays
    pub fn for_display_width(width: u32) -> Self {
        Self {
            input_size: if width <= MOBILE_MAX_WIDTH {
                DETECTOR_INPUT_MOBILE
            } else {
                DETECTOR_INPUT_DESKTOP
            },
            score_threshold: DETECTOR_SCORE_THRESHOLD,
        }
    }
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            input_size: DETECTOR_INPUT_DESKTOP,
            score_threshold: DETECTOR_SCORE_THRESHOLD,
        }
    }
}
