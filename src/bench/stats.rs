//! Summary statistics and the paired Student's t-test.
//!
//! All functions return `None` rather than computing with degenerate inputs:
//! an empty sample has no mean, a single sample has no standard error, and a
//! paired test needs at least two matched differences with nonzero variance.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Arithmetic mean. None for an empty slice.
pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). None below 2 samples.
pub fn sample_std(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    Some(var.sqrt())
}

/// Standard error of the mean. None below 2 samples.
pub fn sem(xs: &[f64]) -> Option<f64> {
    Some(sample_std(xs)? / (xs.len() as f64).sqrt())
}

/// Outcome of a two-sided paired t-test.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PairedTest {
    /// Number of matched pairs consumed
    pub n: usize,
    /// t statistic of the mean difference
    pub t_stat: f64,
    /// Two-sided p-value
    pub p_value: f64,
}

/// Paired Student's t-test over two equal-length series.
///
/// Pairs are matched by index; callers are responsible for aligning the
/// series (the harness matches by trial index). Returns `None`, meaning
/// "test skipped", for mismatched lengths, fewer than two pairs, or zero variance
/// in the differences.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> Option<PairedTest> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }

    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let n = diffs.len();
    let mean_d = mean(&diffs)?;
    let std_d = sample_std(&diffs)?;
    if std_d == 0.0 {
        return None;
    }

    let t_stat = mean_d / (std_d / (n as f64).sqrt());
    let dist = StudentsT::new(0.0, 1.0, (n - 1) as f64).ok()?;
    let p_value = 2.0 * (1.0 - dist.cdf(t_stat.abs()));

    Some(PairedTest { n, t_stat, p_value })
}
