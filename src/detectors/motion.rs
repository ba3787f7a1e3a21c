use chrono::Utc;

use crate::enums::SamplingRate;

/// Minimum spacing between processed samples.
const DEBOUNCE_MS: i64 = 100;
/// While armed, further threshold crossings are folded into the same
/// motion interval so closely spaced events do not flap.
const HYSTERESIS_MS: i64 = 3_000;

/// A fired motion trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTrigger {
    pub magnitude: f64,
}

/// Accelerometer-delta motion detection. Sensitivity is a 1-10 scale;
/// the detection threshold is `15 - sensitivity`, so higher sensitivity
/// means a lower bar.
#[derive(Debug)]
pub struct MotionDetector {
    sensitivity: u8,
    last_sample: Option<(f64, f64, f64)>,
    last_update_ms: i64,
    armed_until_ms: i64,
}

impl MotionDetector {
    pub fn new(sensitivity: u8) -> Self {
        Self {
            sensitivity: sensitivity.clamp(1, 10),
            last_sample: None,
            last_update_ms: 0,
            armed_until_ms: 0,
        }
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    /// Updates the sensitivity, clamped to [1,10]. Motion state carries
    /// over; only the threshold and sampling rate change.
    pub fn set_sensitivity(&mut self, sensitivity: u8) {
        self.sensitivity = sensitivity.clamp(1, 10);
    }

    pub fn threshold(&self) -> f64 {
        (15 - self.sensitivity as i32) as f64
    }

    pub fn sampling_rate(&self) -> SamplingRate {
        SamplingRate::from_sensitivity(self.sensitivity)
    }

    /// Feeds a raw accelerometer sample.
    pub fn process_sample(&mut self, x: f64, y: f64, z: f64) -> Option<MotionTrigger> {
        self.process_sample_at(x, y, z, Utc::now().timestamp_millis())
    }

    pub fn process_sample_at(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        now_ms: i64,
    ) -> Option<MotionTrigger> {
        if now_ms - self.last_update_ms < DEBOUNCE_MS {
            return None;
        }
        self.last_update_ms = now_ms;

        let previous = match self.last_sample.replace((x, y, z)) {
            Some(previous) => previous,
            // First sample seeds the reference frame
            None => return None,
        };

        let (dx, dy, dz) = (x - previous.0, y - previous.1, z - previous.2);
        let magnitude = (dx * dx + dy * dy + dz * dz).sqrt();
        if magnitude <= self.threshold() {
            return None;
        }

        if now_ms < self.armed_until_ms {
            // Still inside the current motion interval; extend it
            self.armed_until_ms = now_ms + HYSTERESIS_MS;
            return None;
        }
        self.armed_until_ms = now_ms + HYSTERESIS_MS;
        Some(MotionTrigger { magnitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_follows_sensitivity() {
        let mut last = f64::MAX;
        for sensitivity in 1..=10u8 {
            let detector = MotionDetector::new(sensitivity);
            let threshold = detector.threshold();
            assert_eq!(threshold, (15 - sensitivity as i32) as f64);
            assert!(threshold <= last, "threshold rose at sensitivity {}", sensitivity);
            last = threshold;
        }
        assert_eq!(MotionDetector::new(1).threshold(), 14.0);
        assert_eq!(MotionDetector::new(10).threshold(), 5.0);
    }

    #[test]
    fn test_sensitivity_clamped() {
        assert_eq!(MotionDetector::new(0).sensitivity(), 1);
        assert_eq!(MotionDetector::new(99).sensitivity(), 10);
        let mut detector = MotionDetector::new(5);
        detector.set_sensitivity(0);
        assert_eq!(detector.sensitivity(), 1);
    }

    #[test]
    fn test_first_sample_never_fires() {
        let mut detector = MotionDetector::new(10);
        assert_eq!(detector.process_sample_at(100.0, 100.0, 100.0, 1_000), None);
    }

    #[test]
    fn test_fires_above_threshold_only() {
        let mut detector = MotionDetector::new(10); // threshold 5
        detector.process_sample_at(0.0, 0.0, 9.8, 1_000);

        // Delta magnitude 3 along x: below threshold
        assert_eq!(detector.process_sample_at(3.0, 0.0, 9.8, 1_200), None);
        // Jump back by 10: above threshold
        let trigger = detector.process_sample_at(-7.0, 0.0, 9.8, 1_400).unwrap();
        assert!(trigger.magnitude > 5.0);
    }

    #[test]
    fn test_hysteresis_suppresses_flapping() {
        let mut detector = MotionDetector::new(10);
        detector.process_sample_at(0.0, 0.0, 0.0, 1_000);
        assert!(detector.process_sample_at(10.0, 0.0, 0.0, 1_200).is_some());
        // Another big delta inside the 3 s window: same interval
        assert!(detector.process_sample_at(0.0, 0.0, 0.0, 2_000).is_none());
        // The window extended from the last spike; past it, fires again
        assert!(detector.process_sample_at(10.0, 0.0, 0.0, 5_500).is_some());
    }

    #[test]
    fn test_debounce_drops_rapid_samples() {
        let mut detector = MotionDetector::new(10);
        detector.process_sample_at(0.0, 0.0, 0.0, 1_000);
        // 50 ms later: ignored entirely, even though the delta is large
        assert!(detector.process_sample_at(20.0, 0.0, 0.0, 1_050).is_none());
        // And it did not consume the reference sample
        assert!(detector.process_sample_at(20.0, 0.0, 0.0, 1_150).is_some());
    }

    #[test]
    fn test_sampling_rate_mapping() {
        assert_eq!(MotionDetector::new(2).sampling_rate(), SamplingRate::Low);
        assert_eq!(MotionDetector::new(5).sampling_rate(), SamplingRate::Medium);
        assert_eq!(MotionDetector::new(9).sampling_rate(), SamplingRate::High);
    }
}
