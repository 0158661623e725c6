pub mod aggregator;
pub mod curves;
pub mod matching;

pub use aggregator::{ClassReport, EvaluationSummary, MetricsAggregator};
pub use curves::*;
pub use matching::*;
