//! Two-sample distance statistics.
//!
//! - [`tvd`]: total variation distance, for nominal values
//! - [`ks`]: Kolmogorov–Smirnov statistic, for ordered values
//! - [`mean_difference`]: absolute difference of group means, a coarse
//!   alternative for quantitative values
//!
//! All of them are symmetric in the two groups and return 0 when both groups
//! have the same empirical distribution. TVD and KS are bounded by 1.
//!
//! Each statistic is also available as a [`TwoSampleStatistic`] so it can be
//! recomputed by the permutation test on relabelled rows.

use crate::{
    distribution::{self, CategoricalDistribution, EmpiricalCdf, OrderedF64},
    sample::{self, Group, Membership, SampleError},
};

/// Total variation distance between two categorical distributions.
///
/// Half the sum, over the union of both supports, of the absolute difference
/// in mass. Values missing from one distribution count as mass 0 there.
///
/// The sum is taken over integer counts and divided once, so groupings that
/// are equally far apart get bitwise equal distances. An empty distribution
/// has no mass anywhere.
#[must_use]
pub fn total_variation<K>(a: &CategoricalDistribution<K>, b: &CategoricalDistribution<K>) -> f64
where
    K: Ord,
{
    let (na, nb) = (a.total(), b.total());
    if na == 0 || nb == 0 {
        return if na == nb { 0.0 } else { 0.5 };
    }
    let (wa, wb) = (widen(na), widen(nb));
    let only_in_b = b
        .counts()
        .filter(|(key, _)| !a.contains(key))
        .map(|(_, count)| widen(count) * wa);
    let numerator = a
        .counts()
        .map(|(key, count)| (widen(count) * wb).abs_diff(widen(b.count(key)) * wa))
        .chain(only_in_b)
        .sum::<u128>();
    exact_ratio(numerator, 2 * wa * wb)
}

/// Kolmogorov–Smirnov statistic: largest vertical gap between two empirical CDFs.
///
/// The CDFs are compared on the union of their supports, see
/// [`distribution::align_cdfs`]. Gaps are compared as integer counts and
/// divided once. An empty CDF is 0 everywhere.
#[must_use]
pub fn kolmogorov_smirnov(a: &EmpiricalCdf, b: &EmpiricalCdf) -> f64 {
    let (na, nb) = (a.len(), b.len());
    if na == 0 || nb == 0 {
        return if na == nb { 0.0 } else { 1.0 };
    }
    let (wa, wb) = (widen(na), widen(nb));
    let gap = distribution::align_cdfs(a, b)
        .iter()
        .map(|p| (widen(p.count_a) * wb).abs_diff(widen(p.count_b) * wa))
        .max()
        .unwrap_or(0);
    exact_ratio(gap, wa * wb)
}

fn widen(n: usize) -> u128 {
    n as u128
}

#[expect(clippy::cast_precision_loss)]
fn exact_ratio(numerator: u128, denominator: u128) -> f64 {
    numerator as f64 / denominator as f64
}

/// Total variation distance between the value distributions of the two label groups.
///
/// # Examples
///
/// ```
/// use permute_stats::distance::tvd;
///
/// let values = ["x", "x", "y", "y", "y"];
/// let labels = ["A", "A", "B", "B", "B"];
/// assert_eq!(tvd(&values, &labels).unwrap(), 1.0);
///
/// let values = ["x", "y", "x", "y"];
/// let labels = ["A", "B", "A", "B"];
/// assert_eq!(tvd(&values, &labels).unwrap(), 0.0);
/// ```
pub fn tvd<T, L>(values: &[T], labels: &[L]) -> Result<f64, SampleError>
where
    T: Ord,
    L: Ord,
{
    let membership = Membership::for_sample(values, labels)?;
    Ok(TotalVariation.evaluate(values, &membership))
}

/// Kolmogorov–Smirnov statistic between the value distributions of the two label groups.
///
/// # Examples
///
/// ```
/// use permute_stats::distance::ks;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let labels = ['A', 'A', 'A', 'B', 'B', 'B'];
/// assert_eq!(ks(&values, &labels).unwrap(), 1.0);
/// ```
pub fn ks<L>(values: &[f64], labels: &[L]) -> Result<f64, SampleError>
where
    L: Ord,
{
    let membership = Membership::for_sample(values, labels)?;
    KolmogorovSmirnov.validate(values)?;
    Ok(KolmogorovSmirnov.evaluate(values, &membership))
}

/// Absolute difference between the means of the two label groups.
pub fn mean_difference<L>(values: &[f64], labels: &[L]) -> Result<f64, SampleError>
where
    L: Ord,
{
    let membership = Membership::for_sample(values, labels)?;
    MeanDifference.validate(values)?;
    Ok(MeanDifference.evaluate(values, &membership))
}

/// A statistic measuring how differently values are distributed in groups A and B.
///
/// Implemented by the statistics of this module and by any closure
/// `Fn(&[T], &Membership) -> f64`.
pub trait TwoSampleStatistic<T> {
    /// Computes the statistic for an already validated partition.
    ///
    /// `values` has exactly one entry per row of `membership`.
    fn evaluate(&self, values: &[T], membership: &Membership) -> f64;

    /// Checks value-level preconditions, once, before any evaluation.
    fn validate(&self, _values: &[T]) -> Result<(), SampleError> {
        Ok(())
    }
}

impl<T, F> TwoSampleStatistic<T> for F
where
    F: Fn(&[T], &Membership) -> f64,
{
    fn evaluate(&self, values: &[T], membership: &Membership) -> f64 {
        self(values, membership)
    }
}

/// Total variation distance, see [`tvd`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalVariation;

impl<T> TwoSampleStatistic<T> for TotalVariation
where
    T: Ord,
{
    fn evaluate(&self, values: &[T], membership: &Membership) -> f64 {
        let (a, b) = distribution::categorical_pair(values, membership);
        total_variation(&a, &b)
    }
}

/// Kolmogorov–Smirnov statistic, see [`ks`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KolmogorovSmirnov;

impl TwoSampleStatistic<f64> for KolmogorovSmirnov {
    fn evaluate(&self, values: &[f64], membership: &Membership) -> f64 {
        let (a, b) = distribution::cumulative_pair(values, membership);
        kolmogorov_smirnov(&a, &b)
    }

    fn validate(&self, values: &[f64]) -> Result<(), SampleError> {
        sample::ensure_no_nan(values)
    }
}

/// Absolute difference of group means, see [`mean_difference`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanDifference;

impl TwoSampleStatistic<f64> for MeanDifference {
    #[expect(clippy::cast_precision_loss)]
    fn evaluate(&self, values: &[f64], membership: &Membership) -> f64 {
        let mean = |group| {
            let sum = membership.values_of(values, group).sum::<f64>();
            sum / membership.group_len(group) as f64
        };
        (mean(Group::A) - mean(Group::B)).abs()
    }

    fn validate(&self, values: &[f64]) -> Result<(), SampleError> {
        sample::ensure_no_nan(values)
    }
}

/// Statistic selected at runtime for a numeric sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum Statistic {
    /// Values treated as categories.
    #[display("tvd")]
    TotalVariation,
    #[display("ks")]
    KolmogorovSmirnov,
    #[display("mean_difference")]
    MeanDifference,
}

impl TwoSampleStatistic<f64> for Statistic {
    fn evaluate(&self, values: &[f64], membership: &Membership) -> f64 {
        match self {
            Statistic::TotalVariation => {
                let keys = values.iter().copied().map(OrderedF64).collect::<Vec<_>>();
                TotalVariation.evaluate(&keys, membership)
            }
            Statistic::KolmogorovSmirnov => KolmogorovSmirnov.evaluate(values, membership),
            Statistic::MeanDifference => MeanDifference.evaluate(values, membership),
        }
    }

    fn validate(&self, values: &[f64]) -> Result<(), SampleError> {
        sample::ensure_no_nan(values)
    }
}
