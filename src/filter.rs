//! Zero-phase high-pass filtering
//!
//! Removes low-frequency drift (gravity orientation changes, sensor offset) from
//! the acceleration channels. The filter is a digital Butterworth high-pass,
//! designed through the analog prototype + bilinear transform, and applied
//! forward then backward so the net phase shift is zero at every frequency.
//!
//! Edge handling uses an odd (point-reflected) extension of `3 * (order + 1)`
//! samples at both ends, and starts each pass from the steady-state filter
//! state for the first sample, so start-up transients settle before the true
//! sample range.

use crate::error::ComputeError;
use crate::types::SampleColumns;
use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

/// Butterworth high-pass filter in transfer-function form
#[derive(Debug, Clone, PartialEq)]
pub struct HighPassFilter {
    /// Numerator coefficients
    b: Vec<f64>,
    /// Denominator coefficients, `a[0] == 1`
    a: Vec<f64>,
}

impl HighPassFilter {
    /// Design an order-`order` Butterworth high-pass with the given cutoff.
    ///
    /// Fails with [`ComputeError::FilterInstability`] when the cutoff is not
    /// strictly between 0 and Nyquist, or the resulting poles are not inside
    /// the unit circle.
    pub fn butterworth(order: usize, cutoff_hz: f64, fs: f64) -> Result<Self, ComputeError> {
        if order == 0 {
            return Err(ComputeError::FilterInstability(
                "filter order must be at least 1".to_string(),
            ));
        }
        if !fs.is_finite() || fs <= 0.0 {
            return Err(ComputeError::FilterInstability(format!(
                "sample rate must be positive, got {fs}"
            )));
        }

        let nyquist = fs / 2.0;
        let wn = cutoff_hz / nyquist;
        if !wn.is_finite() || wn <= 0.0 || wn >= 1.0 {
            return Err(ComputeError::FilterInstability(format!(
                "cutoff {cutoff_hz} Hz must lie strictly between 0 and Nyquist ({nyquist} Hz)"
            )));
        }

        // Pre-warp for the bilinear transform at an internal rate of 2
        let warped = 4.0 * (PI * wn / 2.0).tan();

        // Analog low-pass prototype poles on the unit circle, left half plane
        let n = order as f64;
        let prototype: Vec<Complex64> = (0..order)
            .map(|k| {
                let m = -(n - 1.0) + 2.0 * k as f64;
                -Complex64::from_polar(1.0, PI * m / (2.0 * n))
            })
            .collect();

        // Low-pass → high-pass: poles p → ω/p, `order` zeros at the origin
        let hp_poles: Vec<Complex64> = prototype.iter().map(|&p| warped / p).collect();
        let prototype_gain = prototype.iter().fold(Complex64::new(1.0, 0.0), |acc, &p| acc * -p);
        let hp_gain = 1.0 / prototype_gain.re;

        // Bilinear transform: z = (4 + s) / (4 - s); zeros at s = 0 map to z = 1
        let z_poles: Vec<Complex64> = hp_poles.iter().map(|&p| (4.0 + p) / (4.0 - p)).collect();
        let denom = hp_poles
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, &p| acc * (4.0 - p));
        let digital_gain = hp_gain * (Complex64::new(4.0f64.powi(order as i32), 0.0) / denom).re;

        if let Some(p) = z_poles.iter().find(|p| !(p.norm() < 1.0)) {
            return Err(ComputeError::FilterInstability(format!(
                "pole at |z| = {} is not inside the unit circle (cutoff {cutoff_hz} Hz, fs {fs} Hz)",
                p.norm()
            )));
        }

        let zeros = vec![Complex64::new(1.0, 0.0); order];
        let b: Vec<f64> = poly(&zeros).iter().map(|c| digital_gain * c.re).collect();
        let a: Vec<f64> = poly(&z_poles).iter().map(|c| c.re).collect();

        if b.iter().chain(a.iter()).any(|c| !c.is_finite()) {
            return Err(ComputeError::FilterInstability(format!(
                "non-finite coefficients for order {order}, cutoff {cutoff_hz} Hz, fs {fs} Hz"
            )));
        }

        Ok(Self { b, a })
    }

    pub fn numerator(&self) -> &[f64] {
        &self.b
    }

    pub fn denominator(&self) -> &[f64] {
        &self.a
    }

    pub fn order(&self) -> usize {
        self.a.len() - 1
    }

    /// Samples of odd extension added at each end before filtering
    pub fn pad_len(&self) -> usize {
        3 * self.a.len().max(self.b.len())
    }

    /// Apply the filter forward and backward with zero net phase.
    ///
    /// The output has the same length as `signal`. Signals not longer than
    /// [`pad_len`](Self::pad_len) cannot be extended and are rejected.
    pub fn filtfilt(&self, signal: &[f64]) -> Result<Vec<f64>, ComputeError> {
        let pad = self.pad_len();
        if signal.len() <= pad {
            return Err(ComputeError::FilterInstability(format!(
                "signal of {} samples is too short for an order-{} filter (needs more than {pad})",
                signal.len(),
                self.order()
            )));
        }

        let zi = self.steady_state()?;
        let extended = odd_extension(signal, pad);

        let scaled: Vec<f64> = zi.iter().map(|z| z * extended[0]).collect();
        let mut forward = self.lfilter(&extended, scaled);
        forward.reverse();

        let scaled: Vec<f64> = zi.iter().map(|z| z * forward[0]).collect();
        let mut backward = self.lfilter(&forward, scaled);
        backward.reverse();

        let output = backward[pad..backward.len() - pad].to_vec();
        if output.iter().any(|v| !v.is_finite()) {
            return Err(ComputeError::FilterInstability(
                "filter produced non-finite output".to_string(),
            ));
        }

        Ok(output)
    }

    /// Direct form II transposed recursion starting from state `z`
    fn lfilter(&self, input: &[f64], mut z: Vec<f64>) -> Vec<f64> {
        let n = z.len();
        let (b, a) = (&self.b, &self.a);

        input
            .iter()
            .map(|&x| {
                let y = b[0] * x + z[0];
                for i in 0..n - 1 {
                    z[i] = b[i + 1] * x + z[i + 1] - a[i + 1] * y;
                }
                z[n - 1] = b[n] * x - a[n] * y;
                y
            })
            .collect()
    }

    /// Filter state after an infinitely long unit step.
    ///
    /// Solves `(I - Aᵀ) zi = b[1..] - a[1..] * b[0]` where `A` is the companion
    /// matrix of `a`.
    fn steady_state(&self) -> Result<Vec<f64>, ComputeError> {
        let n = self.order();
        let mut m = vec![vec![0.0; n]; n];
        let mut rhs = vec![0.0; n];

        for i in 0..n {
            m[i][i] += 1.0;
            m[i][0] += self.a[i + 1];
            if i + 1 < n {
                m[i][i + 1] -= 1.0;
            }
            rhs[i] = self.b[i + 1] - self.a[i + 1] * self.b[0];
        }

        solve_linear(m, rhs).ok_or_else(|| {
            ComputeError::FilterInstability("singular steady-state system".to_string())
        })
    }
}

/// Configured high-pass stage applied to the acceleration channels
#[derive(Debug, Clone)]
pub struct FilterStage {
    filter: HighPassFilter,
}

impl FilterStage {
    pub fn new(order: usize, cutoff_hz: f64, fs: f64) -> Result<Self, ComputeError> {
        let filter = HighPassFilter::butterworth(order, cutoff_hz, fs)?;
        debug!(
            order,
            cutoff_hz,
            fs,
            b = ?filter.numerator(),
            a = ?filter.denominator(),
            "designed high-pass filter"
        );
        Ok(Self { filter })
    }

    pub fn filter(&self) -> &HighPassFilter {
        &self.filter
    }

    /// Filter a single channel
    pub fn apply(&self, channel: &[f64]) -> Result<Vec<f64>, ComputeError> {
        self.filter.filtfilt(channel)
    }

    /// Filter `ax`, `ay`, `az` concurrently; heart rate and temperature pass through
    pub fn apply_to_columns(&self, columns: SampleColumns) -> Result<SampleColumns, ComputeError> {
        let (ax, ay, az) = std::thread::scope(|scope| {
            let ax = scope.spawn(|| self.apply(&columns.ax));
            let ay = scope.spawn(|| self.apply(&columns.ay));
            let az = scope.spawn(|| self.apply(&columns.az));
            (join_channel(ax), join_channel(ay), join_channel(az))
        });

        Ok(SampleColumns {
            ax: ax?,
            ay: ay?,
            az: az?,
            ..columns
        })
    }
}

fn join_channel(
    handle: std::thread::ScopedJoinHandle<'_, Result<Vec<f64>, ComputeError>>,
) -> Result<Vec<f64>, ComputeError> {
    handle.join().unwrap_or_else(|_| {
        Err(ComputeError::FilterInstability(
            "filter worker panicked".to_string(),
        ))
    })
}

/// Point-reflect `pad` samples about each endpoint
fn odd_extension(signal: &[f64], pad: usize) -> Vec<f64> {
    let first = signal[0];
    let last = signal[signal.len() - 1];
    let n = signal.len();

    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    out.extend_from_slice(signal);
    out.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));
    out
}

/// Coefficients of the monic polynomial with the given roots, highest power first
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &r in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * r;
        }
        coeffs = next;
    }
    coeffs
}

/// Gaussian elimination with partial pivoting
fn solve_linear(mut m: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))?;
        if m[pivot][col].abs() < f64::EPSILON {
            return None;
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = m[row][col] / m[col][col];
            for k in col..n {
                let delta = factor * m[col][k];
                m[row][k] -= delta;
            }
            let delta = factor * rhs[col];
            rhs[row] -= delta;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| m[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tol, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_first_order_design() {
        // Closed form: b = k[1, -1], a = [1, -(4-ω)/(4+ω)]
        let filter = HighPassFilter::butterworth(1, 0.25, 50.0).unwrap();
        assert_close(filter.numerator(), &[0.984533708597, -0.984533708597], 1e-9);
        assert_close(filter.denominator(), &[1.0, -0.969067417194], 1e-9);
    }

    #[test]
    fn test_second_order_design() {
        let filter = HighPassFilter::butterworth(2, 5.0, 50.0).unwrap();
        assert_close(
            filter.numerator(),
            &[0.638945525159, -1.277891050318, 0.638945525159],
            1e-9,
        );
        assert_close(
            filter.denominator(),
            &[1.0, -1.142980502540, 0.412801598096],
            1e-9,
        );
    }

    #[test]
    fn test_default_third_order_design() {
        let filter = HighPassFilter::butterworth(3, 0.25, 50.0).unwrap();
        assert_eq!(filter.order(), 3);
        assert_eq!(filter.pad_len(), 12);
        assert_close(
            filter.numerator(),
            &[0.969071174032, -2.907213522095, 2.907213522095, -0.969071174032],
            1e-9,
        );
        assert_close(
            filter.denominator(),
            &[1.0, -2.937170728450, 2.876299723479, -0.939098940325],
            1e-9,
        );
    }

    #[test]
    fn test_steady_state_matches_reference() {
        let filter = HighPassFilter::butterworth(3, 0.25, 50.0).unwrap();
        let zi = filter.steady_state().unwrap();
        assert_close(&zi, &[-0.969071174039, 1.938142348079, -0.969071174039], 1e-8);
    }

    #[test]
    fn test_invalid_cutoff_is_rejected() {
        for (cutoff, fs) in [(0.0, 50.0), (25.0, 50.0), (30.0, 50.0), (-1.0, 50.0), (1.0, 0.0)] {
            assert!(matches!(
                HighPassFilter::butterworth(3, cutoff, fs),
                Err(ComputeError::FilterInstability(_))
            ));
        }
        assert!(HighPassFilter::butterworth(0, 0.25, 50.0).is_err());
    }

    #[test]
    fn test_short_signal_is_rejected() {
        let filter = HighPassFilter::butterworth(3, 0.25, 50.0).unwrap();
        assert!(matches!(
            filter.filtfilt(&[1.0; 12]),
            Err(ComputeError::FilterInstability(_))
        ));
        assert_eq!(filter.filtfilt(&[1.0; 13]).unwrap().len(), 13);
    }

    #[test]
    fn test_constant_offset_is_removed() {
        let filter = HighPassFilter::butterworth(3, 0.25, 50.0).unwrap();
        let output = filter.filtfilt(&[9.81; 200]).unwrap();

        assert_eq!(output.len(), 200);
        assert!(output.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_zero_phase_on_sinusoid() {
        // 5 Hz tone at 50 Hz, well above the 0.25 Hz cutoff
        let input: Vec<f64> = (0..1000)
            .map(|i| (2.0 * PI * i as f64 / 10.0 + 0.3).sin())
            .collect();
        let filter = HighPassFilter::butterworth(3, 0.25, 50.0).unwrap();
        let output = filter.filtfilt(&input).unwrap();

        let peak = |signal: &[f64]| {
            (300..310)
                .max_by(|&i, &j| signal[i].total_cmp(&signal[j]))
                .unwrap()
        };
        assert!((peak(&input) as i64 - peak(&output) as i64).abs() <= 1);

        let interior_error = (300..700)
            .map(|i| (input[i] - output[i]).abs())
            .fold(0.0, f64::max);
        assert!(interior_error < 0.05, "interior error {interior_error}");
    }

    #[test]
    fn test_linear_drift_is_removed() {
        let input: Vec<f64> = (0..1000)
            .map(|i| 0.01 * i as f64 + (2.0 * PI * i as f64 / 10.0).sin())
            .collect();
        let filter = HighPassFilter::butterworth(3, 0.25, 50.0).unwrap();
        let output = filter.filtfilt(&input).unwrap();

        let mean: f64 = output[200..800].iter().sum::<f64>() / 600.0;
        assert!(mean.abs() < 0.01, "residual drift {mean}");
    }

    #[test]
    fn test_stage_filters_only_acceleration() {
        let n = 100;
        let columns = SampleColumns {
            ax: vec![1.0; n],
            ay: vec![2.0; n],
            az: vec![9.81; n],
            heart_rate: vec![72.0; n],
            skin_temp: vec![33.2; n],
            activity: vec![crate::types::Activity::Sitting; n],
        };

        let stage = FilterStage::new(3, 0.25, 50.0).unwrap();
        let filtered = stage.apply_to_columns(columns.clone()).unwrap();

        assert!(filtered.az.iter().all(|v| v.abs() < 1e-6));
        assert_eq!(filtered.heart_rate, columns.heart_rate);
        assert_eq!(filtered.skin_temp, columns.skin_temp);
        assert_eq!(filtered.activity, columns.activity);
    }
}
