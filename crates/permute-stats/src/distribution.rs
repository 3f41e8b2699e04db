//! Empirical distributions of two groups on a shared support.
//!
//! Two modes are supported:
//!
//! - **Categorical**: a probability mass per distinct value
//!   ([`CategoricalDistribution`]). Both groups are defined on the union of
//!   values seen in either group; a value absent from a group has mass 0.
//! - **Quantitative**: an empirical CDF per group ([`EmpiricalCdf`]). The two
//!   CDFs are compared on the union of their supports with [`align_cdfs`],
//!   which forward-fills each CDF across points it does not define itself.

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use crate::sample::{self, Group, Membership, SampleError};

/// How a sample should be summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum DistributionMode {
    /// Nominal values: probability mass per distinct value.
    Categorical,
    /// Ordered values: cumulative probability per distinct value.
    Quantitative,
}

/// An `f64` with a total order, usable as a categorical key.
///
/// Ordering and equality follow [`f64::total_cmp`], except that `-0.0` and
/// `0.0` are the same key.
#[derive(Debug, Clone, Copy, derive_more::Display, derive_more::From)]
pub struct OrderedF64(pub f64);

impl PartialEq for OrderedF64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedF64 {}

impl PartialOrd for OrderedF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical(self.0).total_cmp(&canonical(other.0))
    }
}

/// Maps `-0.0` to `0.0` and leaves every other value unchanged.
#[must_use]
pub fn canonical(value: f64) -> f64 {
    value + 0.0
}

/// Probability mass of one group over a categorical support.
///
/// Masses are kept as integer counts over the group size, so two
/// distributions can be compared without rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalDistribution<K> {
    counts: BTreeMap<K, usize>,
    total: usize,
}

impl<K> CategoricalDistribution<K>
where
    K: Ord,
{
    /// Mass at `key`; zero for values outside the support.
    #[must_use]
    pub fn mass(&self, key: &K) -> f64 {
        ratio(self.count(key), self.total)
    }

    /// Number of observations equal to `key`.
    #[must_use]
    pub fn count(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of observations in the group.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether `key` belongs to the support.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.counts.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.counts.iter().map(|(k, c)| (k, ratio(*c, self.total)))
    }

    pub fn counts(&self) -> impl Iterator<Item = (&K, usize)> {
        self.counts.iter().map(|(k, c)| (k, *c))
    }

    pub fn support(&self) -> impl Iterator<Item = &K> {
        self.counts.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<K> CategoricalDistribution<&K>
where
    K: Ord + Clone,
{
    /// Converts a borrowed-key distribution into an owned one.
    #[must_use]
    pub fn cloned(self) -> CategoricalDistribution<K> {
        CategoricalDistribution {
            counts: self
                .counts
                .into_iter()
                .map(|(k, c)| (k.clone(), c))
                .collect(),
            total: self.total,
        }
    }
}

/// Builds the categorical distributions of groups A and B on their union support.
///
/// # Panics
///
/// Panics if `values` does not have one entry per row of `membership`.
#[must_use]
pub fn categorical_pair<'a, T>(
    values: &'a [T],
    membership: &Membership,
) -> (CategoricalDistribution<&'a T>, CategoricalDistribution<&'a T>)
where
    T: Ord,
{
    assert_eq!(values.len(), membership.len(), "one value per row required");

    let mut counts = BTreeMap::<&T, [usize; 2]>::new();
    for (value, group) in values.iter().zip(membership.groups()) {
        let entry = counts.entry(value).or_default();
        match group {
            Group::A => entry[0] += 1,
            Group::B => entry[1] += 1,
        }
    }

    let mut counts_a = BTreeMap::new();
    let mut counts_b = BTreeMap::new();
    for (value, [count_a, count_b]) in counts {
        counts_a.insert(value, count_a);
        counts_b.insert(value, count_b);
    }
    (
        CategoricalDistribution {
            counts: counts_a,
            total: membership.group_len(Group::A),
        },
        CategoricalDistribution {
            counts: counts_b,
            total: membership.group_len(Group::B),
        },
    )
}

/// Validates `values`/`labels` and builds the categorical distributions of both groups.
///
/// # Examples
///
/// ```
/// use permute_stats::distribution::build_categorical;
///
/// let (a, b) = build_categorical(&["x", "x", "y", "y", "y"], &['A', 'A', 'B', 'B', 'B']).unwrap();
/// assert_eq!(a.mass(&&"x"), 1.0);
/// assert_eq!(a.mass(&&"y"), 0.0);
/// assert_eq!(b.mass(&&"y"), 1.0);
/// ```
pub fn build_categorical<'a, T, L>(
    values: &'a [T],
    labels: &[L],
) -> Result<(CategoricalDistribution<&'a T>, CategoricalDistribution<&'a T>), SampleError>
where
    T: Ord,
    L: Ord,
{
    let membership = Membership::for_sample(values, labels)?;
    Ok(categorical_pair(values, &membership))
}

/// A point of an empirical CDF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CdfPoint {
    pub value: f64,
    /// Number of observations less than or equal to `value`.
    pub count: usize,
    /// Proportion of observations less than or equal to `value`.
    pub cumulative: f64,
}

impl CdfPoint {
    /// Cumulative state before the first observation.
    const ORIGIN: Self = Self {
        value: f64::NEG_INFINITY,
        count: 0,
        cumulative: 0.0,
    };
}

/// Empirical cumulative distribution function of one group.
///
/// Stored sparsely: one point per distinct observed value, in ascending
/// order. The last point always has cumulative probability exactly 1.0.
/// `-0.0` is stored as `0.0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmpiricalCdf {
    points: Vec<CdfPoint>,
    len: usize,
}

impl EmpiricalCdf {
    /// Computes the empirical CDF of the given observations.
    ///
    /// NaN values must be rejected beforehand (see [`sample::ensure_no_nan`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use permute_stats::distribution::EmpiricalCdf;
    ///
    /// let cdf = EmpiricalCdf::new([3.0, 1.0, 3.0, 2.0]);
    /// assert_eq!(cdf.at(0.5), 0.0);
    /// assert_eq!(cdf.at(1.0), 0.25);
    /// assert_eq!(cdf.at(2.5), 0.5);
    /// assert_eq!(cdf.at(3.0), 1.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().map(canonical).collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    /// Like [`Self::new`], but for values already sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Self {
        debug_assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let len = sorted_values.len();
        let mut points = Vec::<CdfPoint>::new();
        for (i, &value) in sorted_values.iter().enumerate() {
            let value = canonical(value);
            let count = i + 1;
            let cumulative = ratio(count, len);
            match points.last_mut() {
                Some(last) if last.value.total_cmp(&value).is_eq() => {
                    last.count = count;
                    last.cumulative = cumulative;
                }
                _ => points.push(CdfPoint {
                    value,
                    count,
                    cumulative,
                }),
            }
        }
        Self { points, len }
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn points(&self) -> &[CdfPoint] {
        &self.points
    }

    pub fn support(&self) -> impl Iterator<Item = f64> {
        self.points.iter().map(|p| p.value)
    }

    /// Evaluates the CDF at `x`.
    ///
    /// Between observed values the last defined cumulative probability is
    /// carried forward; below the minimum the result is 0.
    #[must_use]
    pub fn at(&self, x: f64) -> f64 {
        let idx = self.points.partition_point(|p| p.value <= x);
        idx.checked_sub(1)
            .map_or(0.0, |i| self.points[i].cumulative)
    }
}

/// Builds the empirical CDFs of groups A and B.
///
/// # Panics
///
/// Panics if `values` does not have one entry per row of `membership`.
#[must_use]
pub fn cumulative_pair(values: &[f64], membership: &Membership) -> (EmpiricalCdf, EmpiricalCdf) {
    let a = EmpiricalCdf::new(membership.values_of(values, Group::A).copied());
    let b = EmpiricalCdf::new(membership.values_of(values, Group::B).copied());
    (a, b)
}

/// Validates `values`/`labels` and builds the empirical CDFs of both groups.
pub fn build_cumulative<L>(
    values: &[f64],
    labels: &[L],
) -> Result<(EmpiricalCdf, EmpiricalCdf), SampleError>
where
    L: Ord,
{
    let membership = Membership::for_sample(values, labels)?;
    sample::ensure_no_nan(values)?;
    Ok(cumulative_pair(values, &membership))
}

/// Both groups' cumulative probabilities at one point of the merged support.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPoint {
    pub value: f64,
    pub a: f64,
    pub b: f64,
    /// Observations of A less than or equal to `value`.
    pub count_a: usize,
    /// Observations of B less than or equal to `value`.
    pub count_b: usize,
}

/// Aligns two CDFs on the union of their supports.
///
/// This is a sorted merge of the two sparse point lists. At a point that only
/// one CDF defines, the other contributes the last cumulative value it
/// defined below that point, or 0 if it has none yet.
///
/// # Examples
///
/// ```
/// use permute_stats::distribution::{EmpiricalCdf, align_cdfs};
///
/// let a = EmpiricalCdf::new([1.0, 3.0]);
/// let b = EmpiricalCdf::new([2.0, 4.0]);
/// let aligned = align_cdfs(&a, &b);
/// let rows = aligned.iter().map(|p| (p.value, p.a, p.b)).collect::<Vec<_>>();
/// assert_eq!(
///     rows,
///     [(1.0, 0.5, 0.0), (2.0, 0.5, 0.5), (3.0, 1.0, 0.5), (4.0, 1.0, 1.0)]
/// );
/// ```
#[must_use]
pub fn align_cdfs(a: &EmpiricalCdf, b: &EmpiricalCdf) -> Vec<AlignedPoint> {
    let (pa, pb) = (a.points(), b.points());
    let mut aligned = Vec::with_capacity(pa.len() + pb.len());
    let (mut i, mut j) = (0, 0);
    let (mut last_a, mut last_b) = (CdfPoint::ORIGIN, CdfPoint::ORIGIN);

    while i < pa.len() || j < pb.len() {
        let order = match (pa.get(i), pb.get(j)) {
            (Some(x), Some(y)) => x.value.total_cmp(&y.value),
            (Some(_), None) => Ordering::Less,
            (None, _) => Ordering::Greater,
        };
        let value = match order {
            Ordering::Less => {
                last_a = pa[i];
                i += 1;
                last_a.value
            }
            Ordering::Greater => {
                last_b = pb[j];
                j += 1;
                last_b.value
            }
            Ordering::Equal => {
                last_a = pa[i];
                last_b = pb[j];
                i += 1;
                j += 1;
                last_a.value
            }
        };
        aligned.push(AlignedPoint {
            value,
            a: last_a.cumulative,
            b: last_b.cumulative,
            count_a: last_a.count,
            count_b: last_b.count,
        });
    }
    aligned
}

/// `numerator / denominator`, or 0 for an empty denominator.
#[expect(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Distribution of one group, in either mode.
#[derive(Debug, Clone, PartialEq, derive_more::IsVariant)]
pub enum EmpiricalDistribution {
    Categorical(CategoricalDistribution<OrderedF64>),
    Cumulative(EmpiricalCdf),
}

impl fmt::Display for EmpiricalDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmpiricalDistribution::Categorical(dist) => {
                f.write_str("{")?;
                for (i, (key, mass)) in dist.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {mass}")?;
                }
                f.write_str("}")
            }
            EmpiricalDistribution::Cumulative(cdf) => {
                f.write_str("[")?;
                for (i, p) in cdf.points().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} <= {}", p.cumulative, p.value)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Builds the distributions of groups A and B of a numeric sample in the given mode.
///
/// # Examples
///
/// ```
/// use permute_stats::distribution::{DistributionMode, EmpiricalDistribution, build_distribution};
///
/// let (a, _b) = build_distribution(
///     &[1.0, 2.0, 3.0, 4.0],
///     &["a", "a", "b", "b"],
///     DistributionMode::Quantitative,
/// )
/// .unwrap();
/// let EmpiricalDistribution::Cumulative(cdf) = a else { unreachable!() };
/// assert_eq!(cdf.at(1.5), 0.5);
/// ```
pub fn build_distribution<L>(
    values: &[f64],
    labels: &[L],
    mode: DistributionMode,
) -> Result<(EmpiricalDistribution, EmpiricalDistribution), SampleError>
where
    L: Ord,
{
    let membership = Membership::for_sample(values, labels)?;
    sample::ensure_no_nan(values)?;
    match mode {
        DistributionMode::Categorical => {
            let keys = values.iter().copied().map(OrderedF64).collect::<Vec<_>>();
            let (a, b) = categorical_pair(&keys, &membership);
            Ok((
                EmpiricalDistribution::Categorical(a.cloned()),
                EmpiricalDistribution::Categorical(b.cloned()),
            ))
        }
        DistributionMode::Quantitative => {
            let (a, b) = cumulative_pair(values, &membership);
            Ok((
                EmpiricalDistribution::Cumulative(a),
                EmpiricalDistribution::Cumulative(b),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_union_support() {
        let values = ["x", "x", "y", "y", "y"];
        let (a, b) = build_categorical(&values, &['A', 'A', 'B', 'B', 'B']).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 2);
        assert_eq!(a.mass(&&"x"), 1.0);
        assert_eq!(a.mass(&&"y"), 0.0);
        assert_eq!(b.mass(&&"x"), 0.0);
        assert_eq!(b.mass(&&"y"), 1.0);
    }

    #[test]
    fn test_categorical_masses_sum_to_one() {
        let values = ["a", "b", "c", "a", "b", "a", "c"];
        let labels = [0, 1, 0, 0, 1, 1, 1];
        let (a, b) = build_categorical(&values, &labels).unwrap();
        for dist in [a, b] {
            let total = dist.iter().map(|(_, m)| m).sum::<f64>();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_categorical_outside_support_is_zero() {
        let (a, _) = build_categorical(&[1, 2], &["a", "b"]).unwrap();
        assert_eq!(a.mass(&&7), 0.0);
    }

    #[test]
    fn test_cdf_reaches_one_and_is_monotone() {
        let cdf = EmpiricalCdf::new([0.3, 0.1, 0.7, 0.1, 0.2, 0.9, 0.3]);
        let points = cdf.points();
        assert_eq!(points.len(), 5);
        assert_eq!(points.last().unwrap().cumulative, 1.0);
        assert!(points.windows(2).all(|w| w[0].value < w[1].value));
        assert!(points.windows(2).all(|w| w[0].cumulative <= w[1].cumulative));
        assert!(points.iter().all(|p| (0.0..=1.0).contains(&p.cumulative)));
    }

    #[test]
    fn test_cdf_forward_fill() {
        let cdf = EmpiricalCdf::new([2.0, 4.0]);
        assert_eq!(cdf.at(1.0), 0.0);
        assert_eq!(cdf.at(2.0), 0.5);
        assert_eq!(cdf.at(3.0), 0.5);
        assert_eq!(cdf.at(100.0), 1.0);
    }

    #[test]
    fn test_empty_cdf() {
        let cdf = EmpiricalCdf::new([]);
        assert!(cdf.points().is_empty());
        assert_eq!(cdf.at(0.0), 0.0);
    }

    #[test]
    fn test_align_shared_points() {
        let a = EmpiricalCdf::new([1.0, 2.0]);
        let b = EmpiricalCdf::new([2.0, 2.0, 3.0]);
        let aligned = align_cdfs(&a, &b);
        let values = aligned.iter().map(|p| p.value).collect::<Vec<_>>();
        assert_eq!(values, [1.0, 2.0, 3.0]);
        assert_eq!(aligned[0].b, 0.0);
        assert_eq!(aligned[1].a, 1.0);
        assert!((aligned[1].b - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(aligned[2].a, 1.0);
        assert_eq!(aligned[2].b, 1.0);
        let counts = aligned
            .iter()
            .map(|p| (p.count_a, p.count_b))
            .collect::<Vec<_>>();
        assert_eq!(counts, [(1, 0), (2, 2), (2, 3)]);
    }

    #[test]
    fn test_align_matches_pointwise_evaluation() {
        let a = EmpiricalCdf::new([5.0, -1.0, 3.5, 3.5, 8.0]);
        let b = EmpiricalCdf::new([0.0, 3.5, 9.0]);
        for p in align_cdfs(&a, &b) {
            assert_eq!(p.a, a.at(p.value));
            assert_eq!(p.b, b.at(p.value));
        }
    }

    #[test]
    fn test_build_distribution_categorical() {
        let (a, b) = build_distribution(
            &[1.0, 1.0, 2.0, 2.0],
            &[true, false, true, false],
            DistributionMode::Categorical,
        )
        .unwrap();
        let EmpiricalDistribution::Categorical(a) = a else {
            panic!("expected categorical distribution");
        };
        let EmpiricalDistribution::Categorical(b) = b else {
            panic!("expected categorical distribution");
        };
        assert_eq!(a.mass(&OrderedF64(1.0)), 0.5);
        assert_eq!(b.mass(&OrderedF64(2.0)), 0.5);
    }

    #[test]
    fn test_build_distribution_rejects_nan() {
        let err = build_distribution(
            &[1.0, f64::NAN],
            &["a", "b"],
            DistributionMode::Quantitative,
        )
        .unwrap_err();
        assert_eq!(err, SampleError::NanValue { index: 1 });
    }

    #[test]
    fn test_display() {
        let (a, _) = build_distribution(
            &[1.0, 2.0, 3.0, 4.0],
            &["a", "a", "b", "b"],
            DistributionMode::Quantitative,
        )
        .unwrap();
        assert_eq!(a.to_string(), "[0.5 <= 1, 1 <= 2]");
    }

    #[test]
    fn test_signed_zero_is_normalized() {
        let cdf = EmpiricalCdf::new([0.0, -0.0, 1.0]);
        assert_eq!(cdf.points().len(), 2);
        assert_eq!(cdf.points()[0].count, 2);
        assert!(cdf.points()[0].value.is_sign_positive());
        assert_eq!(cdf.at(-0.0), 2.0 / 3.0);

        assert_eq!(OrderedF64(-0.0), OrderedF64(0.0));
        let keys = [OrderedF64(-0.0), OrderedF64(0.0)];
        let (a, b) = build_categorical(&keys, &[1, 2]).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.mass(&&OrderedF64(0.0)), 1.0);
    }

    #[test]
    fn test_categorical_counts() {
        let (a, b) = build_categorical(&["p", "q", "p"], &[0, 0, 1]).unwrap();
        assert_eq!((a.count(&&"p"), a.count(&&"q"), a.total()), (1, 1, 2));
        assert_eq!((b.count(&&"p"), b.count(&&"q"), b.total()), (1, 0, 1));
        assert_eq!(b.counts().collect::<Vec<_>>(), [(&&"p", 1), (&&"q", 0)]);
    }
}
