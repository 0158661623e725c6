use std::time::Duration;

/// Per-image elapsed times of an evaluation run.
#[derive(Debug, Default, Clone)]
pub struct TimeCalc {
    duration: Vec<Duration>,
}

impl TimeCalc {
    pub fn push(&mut self, x: Duration) {
        self.duration.push(x);
    }

    pub fn n(&self) -> usize {
        self.duration.len()
    }

    pub fn total(&self) -> Duration {
        self.duration.iter().sum::<Duration>()
    }

    pub fn avg(&self) -> Duration {
        match self.n() {
            0 => Duration::ZERO,
            n => self.total() / n as u32,
        }
    }
}
