//! Bounded people-count time series with on-demand moving averages.

use chrono::{DateTime, Utc};
use common::analytics::TrendPoint;
use std::collections::VecDeque;

/// Append-only series of per-tick counts, oldest-first, evicting past a
/// retention limit so memory stays bounded over continuous operation.
#[derive(Debug)]
pub struct TrendSeries {
    max_points: usize,
    samples: VecDeque<(DateTime<Utc>, u32)>,
}

impl TrendSeries {
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points: max_points.max(1),
            samples: VecDeque::new(),
        }
    }

    pub fn record(&mut self, timestamp: DateTime<Utc>, count: u32) {
        self.samples.push_back((timestamp, count));
        while self.samples.len() > self.max_points {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The retained series with each point's moving average over the most
    /// recent `min(window, available)` observations. Partial windows at the
    /// start average what exists; they are not padded with zeros.
    pub fn series(&self, window: usize) -> Vec<TrendPoint> {
        let window = window.max(1);
        let mut sums = Vec::with_capacity(self.samples.len() + 1);
        sums.push(0.0f64);
        for (_, count) in &self.samples {
            let last = sums[sums.len() - 1];
            sums.push(last + f64::from(*count));
        }

        self.samples
            .iter()
            .enumerate()
            .map(|(i, (timestamp, count))| {
                let span = window.min(i + 1);
                let moving_avg = (sums[i + 1] - sums[i + 1 - span]) / span as f64;
                TrendPoint {
                    timestamp: *timestamp,
                    count: *count,
                    moving_avg,
                }
            })
            .collect()
    }
}
