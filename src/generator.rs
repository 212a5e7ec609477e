//! Synthetic session generator
//!
//! Produces labeled recordings that follow the acquisition protocol: a random
//! sequence of activity segments, each with periodic acceleration on top of
//! gravity, heart rate inside the activity's range, and slowly drifting skin
//! temperature. All randomness comes from one seeded [`StdRng`], so a seed
//! always reproduces the same session.

use crate::error::ComputeError;
use crate::types::{Activity, Sample};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::f64::consts::PI;

/// Standard gravity on the z axis (m/s²)
pub const GRAVITY: f64 = 9.81;

const ACCEL_NOISE_STD: f64 = 0.08;
const GRAVITY_NOISE_STD: f64 = 0.05;
const HR_SMOOTHING_POINTS: usize = 25;
const TEMP_BASE: f64 = 33.2;
const TEMP_EXERTION_OFFSET: f64 = 0.6;
const TEMP_DRIFT_STD: f64 = 0.002;

/// Segment duration bounds in seconds, `[min, max)`
const SEGMENT_SECONDS: (u32, u32) = (90, 180);

/// Duration given to activities missing from the drawn protocol
const FILL_SECONDS: u32 = 100;

/// Highest rate whose sample spacing survives millisecond timestamps
pub const MAX_SAMPLE_RATE: u32 = 1000;

/// Selection probability of each activity, in [`Activity::ALL`] order
const ACTIVITY_WEIGHTS: [f64; 4] = [0.25, 0.35, 0.25, 0.15];

/// Heart rate range (bpm) for an activity
pub fn heart_rate_range(activity: Activity) -> (f64, f64) {
    match activity {
        Activity::Sitting => (60.0, 80.0),
        Activity::Walking => (85.0, 110.0),
        Activity::Running => (120.0, 165.0),
        Activity::Stairs => (100.0, 140.0),
    }
}

/// One protocol step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub activity: Activity,
    pub seconds: u32,
}

/// Channels of one simulated segment, all the same length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentSignals {
    pub ax: Vec<f64>,
    pub ay: Vec<f64>,
    pub az: Vec<f64>,
    pub heart_rate: Vec<i32>,
    pub skin_temp: Vec<f64>,
}

impl SegmentSignals {
    pub fn len(&self) -> usize {
        self.ax.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ax.is_empty()
    }
}

/// Seeded generator of synthetic sessions
pub struct SessionGenerator {
    rng: StdRng,
}

impl SessionGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw the activity protocol for a session of `total_minutes`.
    ///
    /// Segments are drawn until the time is used up, the last one cut to fit.
    /// Every activity that was never drawn is then appended for 100 s, so the
    /// protocol can run longer than requested.
    pub fn generate_protocol(&mut self, total_minutes: u32) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut remaining = total_minutes * 60;

        while remaining > 0 {
            let activity = self.choose_activity();
            let drawn = self.rng.gen_range(SEGMENT_SECONDS.0..SEGMENT_SECONDS.1);
            let seconds = drawn.min(remaining);
            segments.push(Segment { activity, seconds });
            remaining -= seconds;
        }

        for activity in Activity::ALL {
            if !segments.iter().any(|s| s.activity == activity) {
                segments.push(Segment {
                    activity,
                    seconds: FILL_SECONDS,
                });
            }
        }

        segments
    }

    /// Simulate `seconds` of `activity` sampled at `fs` Hz
    pub fn simulate_segment(&mut self, activity: Activity, seconds: u32, fs: u32) -> SegmentSignals {
        let n = (seconds * fs) as usize;
        let gravity = GRAVITY + self.gaussian(GRAVITY_NOISE_STD);

        let (freq, amp) = match activity {
            Activity::Sitting => (0.2, 0.02),
            Activity::Walking => (1.8 + self.gaussian(0.1), 0.6),
            Activity::Running => (2.8 + self.gaussian(0.2), 1.4),
            Activity::Stairs => (2.2 + self.gaussian(0.15), 1.0),
        };
        let phases: [f64; 3] = [
            self.rng.gen_range(0.0..2.0 * PI),
            self.rng.gen_range(0.0..2.0 * PI),
            self.rng.gen_range(0.0..2.0 * PI),
        ];

        let mut signals = SegmentSignals::default();
        for i in 0..n {
            let t = i as f64 / fs as f64;
            let w = 2.0 * PI * freq * t;
            signals
                .ax
                .push(amp * (w + phases[0]).sin() + self.gaussian(ACCEL_NOISE_STD));
            signals
                .ay
                .push(0.7 * amp * (w + phases[1]).sin() + self.gaussian(ACCEL_NOISE_STD));
            signals.az.push(
                0.3 * amp * (2.0 * w + phases[2]).sin() + self.gaussian(ACCEL_NOISE_STD) + gravity,
            );
        }

        let (hr_min, hr_max) = heart_rate_range(activity);
        let hr_base = self.rng.gen_range(hr_min..hr_max);
        let hr_noise: Vec<f64> = (0..n).map(|_| self.gaussian(1.0)).collect();
        signals.heart_rate = centered_moving_average(&hr_noise, HR_SMOOTHING_POINTS)
            .into_iter()
            .map(|v| (hr_base + v).clamp(hr_min, hr_max).trunc() as i32)
            .collect();

        let temp_base = match activity {
            Activity::Running | Activity::Stairs => TEMP_BASE + TEMP_EXERTION_OFFSET,
            Activity::Sitting | Activity::Walking => TEMP_BASE,
        };
        let mut drift = 0.0;
        for _ in 0..n {
            drift += self.gaussian(TEMP_DRIFT_STD);
            signals.skin_temp.push(((temp_base + drift) * 1000.0).round() / 1000.0);
        }

        signals
    }

    /// Generate a full labeled session starting at `start`
    pub fn generate_session(
        &mut self,
        minutes: u32,
        fs: u32,
        start: DateTime<Utc>,
    ) -> Result<Vec<Sample>, ComputeError> {
        if fs == 0 {
            return Err(ComputeError::InvalidConfig(
                "fs must be at least 1 Hz".to_string(),
            ));
        }
        if fs > MAX_SAMPLE_RATE {
            return Err(ComputeError::InvalidConfig(format!(
                "fs must be at most {MAX_SAMPLE_RATE} Hz, got {fs}"
            )));
        }

        let protocol = self.generate_protocol(minutes);
        let total: usize = protocol.iter().map(|s| (s.seconds * fs) as usize).sum();
        let mut samples = Vec::with_capacity(total);

        for segment in &protocol {
            let signals = self.simulate_segment(segment.activity, segment.seconds, fs);
            for i in 0..signals.len() {
                let k = samples.len() as i64;
                samples.push(Sample {
                    timestamp: start + Duration::nanoseconds(k * 1_000_000_000 / fs as i64),
                    ax: signals.ax[i],
                    ay: signals.ay[i],
                    az: signals.az[i],
                    heart_rate: signals.heart_rate[i],
                    skin_temp: signals.skin_temp[i],
                    activity: segment.activity,
                });
            }
        }

        tracing::debug!(
            segments = protocol.len(),
            samples = samples.len(),
            "generated synthetic session"
        );

        Ok(samples)
    }

    fn choose_activity(&mut self) -> Activity {
        let u: f64 = self.rng.gen();
        let mut cumulative = 0.0;
        for (activity, weight) in Activity::ALL.iter().zip(ACTIVITY_WEIGHTS) {
            cumulative += weight;
            if u < cumulative {
                return *activity;
            }
        }
        Activity::Stairs
    }

    fn gaussian(&mut self, std: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        z * std
    }
}

/// Centered moving average of `points` samples, zero beyond the edges
fn centered_moving_average(values: &[f64], points: usize) -> Vec<f64> {
    let half = points / 2;
    let n = values.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + points - half).min(n);
            values[lo..hi].iter().sum::<f64>() / points as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_same_seed_same_session() {
        let a = SessionGenerator::new(42).generate_session(2, 10, start()).unwrap();
        let b = SessionGenerator::new(42).generate_session(2, 10, start()).unwrap();
        assert_eq!(a, b);

        let c = SessionGenerator::new(7).generate_session(2, 10, start()).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_protocol_covers_time_and_all_activities() {
        for seed in 0..20 {
            let protocol = SessionGenerator::new(seed).generate_protocol(10);

            for activity in Activity::ALL {
                assert!(protocol.iter().any(|s| s.activity == activity));
            }

            // drawn part sums to exactly 10 minutes, fillers are 100 s each
            let mut drawn = 0;
            let mut idx = 0;
            while drawn < 600 {
                let s = protocol[idx];
                assert!(s.seconds < 180);
                drawn += s.seconds;
                idx += 1;
            }
            assert_eq!(drawn, 600);
            assert!(protocol[idx..].iter().all(|s| s.seconds == 100));
        }
    }

    #[test]
    fn test_zero_minutes_gives_fill_segments_only() {
        let protocol = SessionGenerator::new(1).generate_protocol(0);
        let activities: Vec<Activity> = protocol.iter().map(|s| s.activity).collect();
        assert_eq!(activities, Activity::ALL.to_vec());
    }

    #[test]
    fn test_segment_ranges() {
        let mut generator = SessionGenerator::new(3);
        for activity in Activity::ALL {
            let signals = generator.simulate_segment(activity, 20, 50);
            assert_eq!(signals.len(), 1000);
            assert_eq!(signals.heart_rate.len(), 1000);

            let (lo, hi) = heart_rate_range(activity);
            assert!(signals
                .heart_rate
                .iter()
                .all(|&hr| hr as f64 >= lo && hr as f64 <= hi));

            let az_mean = signals.az.iter().sum::<f64>() / 1000.0;
            assert!((az_mean - GRAVITY).abs() < 0.5);

            let temp_base = match activity {
                Activity::Running | Activity::Stairs => 33.8,
                _ => 33.2,
            };
            assert!((signals.skin_temp[0] - temp_base).abs() < 0.05);
        }
    }

    #[test]
    fn test_running_moves_more_than_sitting() {
        let mut generator = SessionGenerator::new(9);
        let spread = |v: &[f64]| {
            let m = v.iter().sum::<f64>() / v.len() as f64;
            (v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / v.len() as f64).sqrt()
        };
        let sitting = generator.simulate_segment(Activity::Sitting, 10, 50);
        let running = generator.simulate_segment(Activity::Running, 10, 50);
        assert!(spread(&running.ax) > 5.0 * spread(&sitting.ax));
    }

    #[test]
    fn test_session_timestamps_strictly_increase() {
        let samples = SessionGenerator::new(5).generate_session(1, 50, start()).unwrap();
        assert_eq!(samples[0].timestamp, start());
        assert_eq!(samples[1].timestamp - samples[0].timestamp, Duration::milliseconds(20));
        assert!(samples.windows(2).all(|w| w[1].timestamp > w[0].timestamp));
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        assert!(SessionGenerator::new(1).generate_session(1, 0, start()).is_err());
    }

    #[test]
    fn test_sample_rate_above_millisecond_resolution_rejected() {
        let err = SessionGenerator::new(1)
            .generate_session(0, MAX_SAMPLE_RATE + 1, start())
            .unwrap_err();
        assert!(matches!(err, ComputeError::InvalidConfig(_)));

        // 1000 Hz still gives one sample per millisecond
        let samples = SessionGenerator::new(1)
            .generate_session(0, MAX_SAMPLE_RATE, start())
            .unwrap();
        assert_eq!(samples[1].timestamp - samples[0].timestamp, Duration::milliseconds(1));
    }

    #[test]
    fn test_moving_average_edges() {
        let avg = centered_moving_average(&[5.0; 10], 5);
        // two of five points fall outside at each edge
        assert!((avg[0] - 3.0).abs() < 1e-12);
        assert!((avg[5] - 5.0).abs() < 1e-12);
        assert!((avg[9] - 3.0).abs() < 1e-12);
    }
}
