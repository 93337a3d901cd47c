//! Runtime configuration.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::warn;

use crate::core::{CelebrationMode, ResetPolicy};
use crate::error::{Result, SmileError};
use crate::{FRAME_INTERVAL_MS, RETRY_DELAY_MS, SESSION_TTL_SECS};

/// Settings for the detection loop and its hosts.
#[derive(Debug, Clone)]
pub struct SmileConfig {
    /// Fixed delay after a failed frame
    pub retry_delay: Duration,
    /// Pause between successful frames
    pub frame_interval: Duration,
    /// Edge (once per entry) or level (every frame) celebration
    pub celebration: CelebrationMode,
    /// Whether the camera-retry path resets the running score
    pub reset_policy: ResetPolicy,
    /// HTTP server address
    pub addr: String,
    /// Display width used to pick detector options
    pub display_width: u32,
    /// API sessions idle this long are dropped
    pub session_ttl: Duration,
}

impl Default for SmileConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
            celebration: CelebrationMode::Edge,
            reset_policy: ResetPolicy::Keep,
            addr: "127.0.0.1:3000".to_string(),
            display_width: 1280,
            session_ttl: Duration::from_secs(SESSION_TTL_SECS),
        }
    }
}

impl SmileConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            retry_delay: env_u64("SMILE_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            frame_interval: env_u64("SMILE_FRAME_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.frame_interval),
            celebration: std::env::var("SMILE_CELEBRATION")
                .ok()
                .and_then(|v| match v.parse() {
                    Ok(mode) => Some(mode),
                    Err(e) => {
                        warn!("Ignoring SMILE_CELEBRATION: {}", e);
                        None
                    }
                })
                .unwrap_or(defaults.celebration),
            reset_policy: std::env::var("SMILE_RESET_ON_RETRY")
                .map(|v| {
                    if v == "true" || v == "1" {
                        ResetPolicy::Reset
                    } else {
                        ResetPolicy::Keep
                    }
                })
                .unwrap_or(defaults.reset_policy),
            addr: std::env::var("SMILE_ADDR").unwrap_or(defaults.addr),
            display_width: std::env::var("SMILE_DISPLAY_WIDTH")
                .ok()
                .and_then(|v| match v.parse() {
                    Ok(width) => Some(width),
                    Err(_) => {
                        warn!("Ignoring SMILE_DISPLAY_WIDTH={:?}: not a pixel width", v);
                        None
                    }
                })
                .unwrap_or(defaults.display_width),
            session_ttl: env_u64("SMILE_SESSION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
        }
    }

    /// Check values the env/CLI layers cannot catch on their own.
    pub fn validate(&self) -> Result<()> {
        if self.addr.parse::<SocketAddr>().is_err() {
            return Err(SmileError::Config(format!("invalid server address '{}'", self.addr)));
        }
        if self.display_width == 0 {
            return Err(SmileError::Config("display width must be positive".to_string()));
        }
        Ok(())
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a whole number", key, raw);
            None
        }
    }
}
