//! Rate-gated pose publishing
//!
//! The publisher decides *when* a periodic pose report is due; the host
//! owns the clock and the transport. Keeping it a pure gate makes the
//! cadence testable with synthetic timestamps.

use tracing::warn;

/// Publish rate used when configuration does not specify one
pub const DEFAULT_PUBLISH_RATE_HZ: f64 = 2.0;

/// Outbound side of the broker connection
pub trait Transport: Send + Sync {
    fn publish(&self, topic: &str, payload: &str);
}

pub struct PosePublisher {
    rate_hz: f64,
    enabled: bool,
    last_publish_ms: Option<f64>,
}

impl PosePublisher {
    pub fn new(rate_hz: f64, enabled: bool) -> Self {
        let mut publisher = Self {
            rate_hz: DEFAULT_PUBLISH_RATE_HZ,
            enabled,
            last_publish_ms: None,
        };
        publisher.set_rate_hz(rate_hz);
        publisher
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle auto-publishing. Re-enabling publishes on the next poll.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.last_publish_ms = None;
        }
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    /// Change the publish rate. Non-positive or non-finite rates are
    /// rejected and the previous rate kept.
    pub fn set_rate_hz(&mut self, rate_hz: f64) {
        if rate_hz.is_finite() && rate_hz > 0.0 {
            self.rate_hz = rate_hz;
        } else {
            warn!(rate_hz, "Ignoring invalid publish rate");
        }
    }

    pub fn interval_ms(&self) -> f64 {
        1_000.0 / self.rate_hz
    }

    /// Whether a periodic publish is due at `now_ms`. Records the publish
    /// time when it is, so the next one lands a full interval later.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        if !self.enabled {
            return false;
        }
        match self.last_publish_ms {
            Some(last) if now_ms - last < self.interval_ms() => false,
            _ => {
                self.last_publish_ms = Some(now_ms);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_cadence() {
        let mut publisher = PosePublisher::new(10.0, true); // 100ms interval
        assert!(publisher.poll(0.0));
        assert!(!publisher.poll(50.0));
        assert!(!publisher.poll(99.0));
        assert!(publisher.poll(100.0));
        assert!(!publisher.poll(150.0));
        assert!(publisher.poll(260.0));
    }

    #[test]
    fn test_disabled_never_due() {
        let mut publisher = PosePublisher::new(10.0, false);
        assert!(!publisher.poll(0.0));
        assert!(!publisher.poll(10_000.0));

        publisher.set_enabled(true);
        assert!(publisher.poll(10_001.0));
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let mut publisher = PosePublisher::new(0.0, true);
        assert_eq!(publisher.rate_hz(), DEFAULT_PUBLISH_RATE_HZ);
        publisher.set_rate_hz(5.0);
        assert_eq!(publisher.rate_hz(), 5.0);
        publisher.set_rate_hz(-1.0);
        assert_eq!(publisher.rate_hz(), 5.0);
        publisher.set_rate_hz(f64::NAN);
        assert_eq!(publisher.rate_hz(), 5.0);
    }
}
