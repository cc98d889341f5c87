use pimon_common::types::MetricSample;
use serde::{Deserialize, Serialize};

/// Bounded sample history for one metric key, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    #[serde(default)]
    pub values: Vec<MetricSample>,
    /// Mean of every sample currently in `values`.
    #[serde(rename = "mavg", default)]
    pub moving_average: f64,
    /// Timestamp (unix seconds) of the most recent append.
    #[serde(rename = "lupd", default)]
    pub last_updated: i64,
}

impl MetricSeries {
    /// Appends `sample`, evicts from the front until at most `max_retained`
    /// samples remain, then recomputes the average.
    pub fn push(&mut self, sample: MetricSample, max_retained: usize) {
        self.values.push(sample);

        let cap = max_retained.max(1);
        if self.values.len() > cap {
            let excess = self.values.len() - cap;
            self.values.drain(..excess);
        }

        self.moving_average = mean(&self.values);
        self.last_updated = sample.ts;
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.values.last()
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn mean(samples: &[MetricSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| s.value.as_f64()).sum();
    sum / samples.len() as f64
}
