//! Numerical procedures behind the hypothesis tests.
//!
//! Both procedures take already-cleaned inputs: [`f_oneway`] one slice per
//! independent group, [`friedman`] one row per subject with one value per
//! condition. The F-test itself comes from `u_analytics`; when it cannot
//! produce a result for degenerate groups that failure is reported as
//! [`StatsError::Undefined`].

use statrs::distribution::{ChiSquared, ContinuousCDF};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("at least {required} groups are required, got {found}")]
    TooFewGroups { required: usize, found: usize },
    #[error("no observations supplied")]
    NoObservations,
    #[error("row {row} has {found} value(s), expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("{test} is undefined for these groups (too few values or no variance)")]
    Undefined { test: &'static str },
    #[error("distribution error: {0}")]
    Distribution(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestStatistic {
    pub statistic: f64,
    pub p_value: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N-1 denominator); `NaN` below two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean(values);
    let sum_squares = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    (sum_squares / (values.len() as f64 - 1.0)).sqrt()
}

/// One-way analysis of variance across all groups at once.
pub fn f_oneway<G: AsRef<[f64]>>(groups: &[G]) -> Result<TestStatistic, StatsError> {
    if groups.len() < 2 {
        return Err(StatsError::TooFewGroups {
            required: 2,
            found: groups.len(),
        });
    }
    let group_refs = groups.iter().map(AsRef::as_ref).collect::<Vec<&[f64]>>();
    let anova = u_analytics::testing::one_way_anova(&group_refs)
        .ok_or(StatsError::Undefined { test: "one-way ANOVA" })?;
    Ok(TestStatistic {
        statistic: anova.f_statistic,
        p_value: anova.p_value,
    })
}

/// Friedman rank-sum test; each row is one subject, each column a condition.
pub fn friedman<R: AsRef<[f64]>>(rows: &[R]) -> Result<TestStatistic, StatsError> {
    let n = rows.len();
    if n == 0 {
        return Err(StatsError::NoObservations);
    }
    let k = rows[0].as_ref().len();
    if k < 2 {
        return Err(StatsError::TooFewGroups {
            required: 2,
            found: k,
        });
    }

    let mut rank_sums = vec![0.0; k];
    let mut ties = 0.0;
    for (row_idx, row) in rows.iter().enumerate() {
        let values = row.as_ref();
        if values.len() != k {
            return Err(StatsError::RaggedRow {
                row: row_idx,
                found: values.len(),
                expected: k,
            });
        }
        let (ranks, tie_term) = average_ranks(values);
        ties += tie_term;
        for (sum, rank) in rank_sums.iter_mut().zip(ranks) {
            *sum += rank;
        }
    }

    let (n, k) = (n as f64, k as f64);
    let squares = rank_sums.iter().map(|r| r * r).sum::<f64>();
    let uncorrected = 12.0 / (n * k * (k + 1.0)) * squares - 3.0 * n * (k + 1.0);
    let correction = 1.0 - ties / (n * k * (k * k - 1.0));
    let statistic = uncorrected / correction;

    let distribution =
        ChiSquared::new(k - 1.0).map_err(|err| StatsError::Distribution(err.to_string()))?;
    Ok(TestStatistic {
        statistic,
        p_value: survival(statistic, |x| distribution.sf(x)),
    })
}

/// Ranks within one row (1-based, ties share their mean rank) plus the
/// row's tie term `sum(t^3 - t)`.
fn average_ranks(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let shared = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = shared;
        }
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }
    (ranks, tie_term)
}

fn survival(statistic: f64, sf: impl Fn(f64) -> f64) -> f64 {
    if statistic.is_nan() {
        f64::NAN
    } else if statistic == f64::INFINITY {
        0.0
    } else {
        sf(statistic.max(0.0))
    }
}
