use serde::{Deserialize, Serialize};
use tracing::info;

/// Tick-count statistics over a batch of simulations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub runs: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    /// Tick count of every run, in simulation order
    pub ticks: Vec<u64>,
}

impl BatchStats {
    /// `None` for an empty batch.
    pub fn from_ticks(ticks: &[u64]) -> Option<Self> {
        let min = *ticks.iter().min()?;
        let max = *ticks.iter().max()?;
        let total: u64 = ticks.iter().sum();
        Some(BatchStats {
            runs: ticks.len(),
            min,
            max,
            mean: total as f64 / ticks.len() as f64,
            ticks: ticks.to_vec(),
        })
    }

    pub fn log(&self) {
        info!(
            "📈 [Batch] {} runs: min {} / max {} / mean {:.2} ticks",
            self.runs, self.min, self.max, self.mean
        );
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_over_runs() {
        let stats = BatchStats::from_ticks(&[12, 30, 18]).unwrap();
        assert_eq!(stats.runs, 3);
        assert_eq!(stats.min, 12);
        assert_eq!(stats.max, 30);
        assert!((stats.mean - 20.0).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_has_no_stats() {
        assert!(BatchStats::from_ticks(&[]).is_none());
    }

    #[test]
    fn serializes_to_json() {
        let json = BatchStats::from_ticks(&[5]).unwrap().to_json().unwrap();
        let back: BatchStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mean, 5.0);
        assert_eq!(back.ticks, vec![5]);
    }
}
