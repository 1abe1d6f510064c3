pub const DEGREE_BUCKETS: usize = 7;
pub const CALIBRATION_SAMPLES: usize = 10;
pub const BUCKET_FLOOR: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct SubsamplePlan {
    pub step: f64,
    pub probability: f64,
    pub bucket: [f64; DEGREE_BUCKETS],
}

impl SubsamplePlan {
    pub fn new(step: f64, budget: f64, totals: &[usize; DEGREE_BUCKETS]) -> Self {
        let count: usize = totals.iter().sum();
        let mut probability = 1.0;
        if budget > 0.0 && step > 0.0 && budget / step < count as f64 {
            probability = (budget / step) / count as f64;
        }
        // every degree bucket gets a floor of checks even under a tight budget
        let mut bucket = [0.0; DEGREE_BUCKETS];
        for (n, &total) in totals.iter().enumerate() {
            if total == 0 {
                continue;
            }
            let floor = total.min(BUCKET_FLOOR);
            if (total as f64) * probability < floor as f64 {
                bucket[n] = floor as f64 / total as f64;
            }
        }
        Self {
            step,
            probability,
            bucket,
        }
    }
}

// per-check cost estimate; the first half of the probe is warm-up
pub fn step_time(durations: &[f64]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    let tail = &durations[durations.len() / 2..];
    tail.iter().sum::<f64>() / tail.len() as f64
}
