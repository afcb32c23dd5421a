//! Cover loading performance counters.

use std::time::Duration;

/// Running totals for cover loads in this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverMetrics {
    total_loaded: u64,
    total_errors: u64,
    total_load_time: Duration,
}

impl CoverMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a cover that reached the loaded state after `elapsed`.
    pub fn record_load(&mut self, elapsed: Duration) {
        self.total_loaded += 1;
        self.total_load_time += elapsed;
    }

    /// Records a cover that fell back to its placeholder.
    pub fn record_error(&mut self) {
        self.total_errors += 1;
    }

    #[must_use]
    pub const fn total_loaded(&self) -> u64 {
        self.total_loaded
    }

    #[must_use]
    pub const fn total_errors(&self) -> u64 {
        self.total_errors
    }

    /// Mean time from first request to loaded, or zero before any load.
    #[must_use]
    pub fn average_load_time(&self) -> Duration {
        match u32::try_from(self.total_loaded) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.total_load_time / n,
        }
    }
}

impl std::fmt::Display for CoverMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Covers: {} loaded, {} failed, avg {}ms",
            self.total_loaded,
            self.total_errors,
            self.average_load_time().as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_load_time() {
        let mut metrics = CoverMetrics::new();
        assert_eq!(metrics.average_load_time(), Duration::ZERO);

        metrics.record_load(Duration::from_millis(100));
        metrics.record_load(Duration::from_millis(300));
        metrics.record_error();

        assert_eq!(metrics.total_loaded(), 2);
        assert_eq!(metrics.total_errors(), 1);
        assert_eq!(metrics.average_load_time(), Duration::from_millis(200));
        assert_eq!(metrics.to_string(), "Covers: 2 loaded, 1 failed, avg 200ms");
    }
}
