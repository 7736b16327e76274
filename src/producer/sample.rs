//! Sample Sources
//!
//! Where metrics values come from. The server only ever sees the trait.

use rand::Rng;

use crate::websocket::MetricsSample;

/// Produces one metrics sample per call
pub trait SampleSource: Send + Sync {
    fn sample(&self) -> MetricsSample;
}

/// Uniformly random CPU and memory readings stamped with the wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedMetrics;

impl SampleSource for SimulatedMetrics {
    fn sample(&self) -> MetricsSample {
        let mut rng = rand::thread_rng();
        MetricsSample {
            cpu: rng.gen_range(0.0..100.0),
            memory: rng.gen_range(1.0..16.0),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
