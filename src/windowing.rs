//! Fixed-length overlapping windows over a sample sequence.
//!
//! Windows are half-open index ranges; the trailing partial window is dropped,
//! never padded.

use crate::config::PipelineConfig;
use crate::error::ComputeError;
use std::iter::FusedIterator;
use std::ops::Range;

/// Window layout for a sequence of known length.
///
/// `Windower` is `Copy`; each call to [`iter`](Windower::iter) starts a fresh
/// enumeration from the first window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windower {
    total: usize,
    win: usize,
    step: usize,
}

impl Windower {
    /// Create a windower over `total` samples.
    pub fn new(total: usize, win: usize, step: usize) -> Result<Self, ComputeError> {
        if win == 0 {
            return Err(ComputeError::InvalidConfig(
                "window length must be at least 1 sample".to_string(),
            ));
        }
        if step == 0 {
            return Err(ComputeError::InvalidConfig(
                "window step must be at least 1 sample".to_string(),
            ));
        }
        Ok(Self { total, win, step })
    }

    /// Windower using the lengths derived from `config`
    pub fn from_config(total: usize, config: &PipelineConfig) -> Result<Self, ComputeError> {
        Self::new(total, config.window_len(), config.step_len())
    }

    pub fn window_len(&self) -> usize {
        self.win
    }

    pub fn step_len(&self) -> usize {
        self.step
    }

    /// Number of complete windows: `floor((N - win) / step) + 1`, or 0 when `N < win`
    pub fn count(&self) -> usize {
        if self.total < self.win {
            0
        } else {
            (self.total - self.win) / self.step + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn iter(&self) -> Windows {
        Windows {
            next_start: 0,
            remaining: self.count(),
            win: self.win,
            step: self.step,
        }
    }
}

impl IntoIterator for Windower {
    type Item = Range<usize>;
    type IntoIter = Windows;

    fn into_iter(self) -> Windows {
        self.iter()
    }
}

impl IntoIterator for &Windower {
    type Item = Range<usize>;
    type IntoIter = Windows;

    fn into_iter(self) -> Windows {
        self.iter()
    }
}

/// Lazy iterator over window ranges
#[derive(Debug, Clone)]
pub struct Windows {
    next_start: usize,
    remaining: usize,
    win: usize,
    step: usize,
}

impl Iterator for Windows {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.remaining == 0 {
            return None;
        }
        let start = self.next_start;
        self.remaining -= 1;
        self.next_start += self.step;
        Some(start..start + self.win)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Windows {}

impl FusedIterator for Windows {}
