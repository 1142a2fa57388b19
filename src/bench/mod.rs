pub mod harness;
pub mod report;
pub mod stats;
pub mod types;

pub use harness::Benchmark;
pub use report::{
    Comparison, SIGNIFICANCE_LEVEL, aggregate, aggregate_all, compare_pair, load_records,
    save_records, verdict,
};
pub use stats::{PairedTest, mean, paired_t_test, sample_std, sem};
pub use types::{AggregateResult, BenchError, BenchResult, RunRecords, TrialResult};
