use serde::{Deserialize, Serialize};

/// Online mean and standard deviation (Welford's recurrence).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: self.mean,
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// A recorded series of values with summary statistics over the whole run.
pub struct TimeSeries {
    vals: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimeSeriesReport {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub last: f64,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self { vals: Vec::new() }
    }

    pub fn push(&mut self, val: f64) {
        self.vals.push(val);
    }

    pub fn report(&self) -> TimeSeriesReport {
        let mut acc = Accumulator::new();
        for &val in &self.vals {
            acc.add(val);
        }
        let acc_report = acc.report();

        TimeSeriesReport {
            mean: acc_report.mean,
            std_dev: acc_report.std_dev,
            min: self.vals.iter().copied().fold(f64::INFINITY, f64::min),
            max: self.vals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            last: self.vals.last().copied().unwrap_or(f64::NAN),
        }
    }
}

impl Default for TimeSeries {
    fn default() -> Self {
        Self::new()
    }
}
