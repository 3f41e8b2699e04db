//! Permutation tests for "both groups share one value distribution".
//!
//! The observed statistic is compared against its distribution under random
//! relabelings of the rows. Each trial shuffles the group assignment, so the
//! size of each group stays fixed; values are never resampled.
//!
//! # Interpreting the p-value
//!
//! The p-value is the fraction of trials whose statistic is at least as large
//! as the observed one. A small p-value (conventionally below 0.05) means the
//! observed grouping separates the values more than random groupings of the
//! same pool usually do, so the grouping is associated with the values. A
//! large p-value means the observed grouping looks like a random partition.
//!
//! # Reproducibility
//!
//! Trials draw from a single [`Pcg32`] stream seeded from a `u64`. When no
//! seed is given one is drawn from the thread RNG and returned in
//! [`PermutationOutcome::seed`], so any run can be repeated exactly.

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::{
    distance::TwoSampleStatistic,
    sample::{self, Membership, SampleError},
};

/// Trial count used when none is specified.
pub const DEFAULT_TRIALS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PermutationError {
    #[display("trial count must be at least 1")]
    InvalidTrialCount,
    #[display("{_0}")]
    Sample(SampleError),
}

/// Result of a permutation test.
#[derive(Debug, Clone, PartialEq)]
pub struct PermutationOutcome {
    /// Statistic computed on the original grouping.
    pub observed: f64,
    /// Fraction of `null_distribution` greater than or equal to `observed`.
    pub p_value: f64,
    /// Statistic computed on each shuffled grouping, in trial order.
    pub null_distribution: Vec<f64>,
    /// Seed of the random stream that produced `null_distribution`.
    pub seed: u64,
}

impl PermutationOutcome {
    /// Whether the p-value falls below the significance level `alpha`.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Configuration of a permutation test.
///
/// # Examples
///
/// ```
/// use permute_stats::{distance::KolmogorovSmirnov, permutation::PermutationTest};
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let labels = ["a", "a", "a", "b", "b", "b"];
/// let outcome = PermutationTest::new(KolmogorovSmirnov)
///     .trials(200)
///     .seed(42)
///     .run(&values, &labels)
///     .unwrap();
/// assert_eq!(outcome.observed, 1.0);
/// assert_eq!(outcome.null_distribution.len(), 200);
/// assert!(outcome.p_value < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct PermutationTest<S> {
    statistic: S,
    trials: usize,
    seed: Option<u64>,
}

impl<S> PermutationTest<S> {
    /// Creates a test using `statistic`, [`DEFAULT_TRIALS`] trials and a random seed.
    #[must_use]
    pub fn new(statistic: S) -> Self {
        Self {
            statistic,
            trials: DEFAULT_TRIALS,
            seed: None,
        }
    }

    #[must_use]
    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Fixes the seed of the random stream.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Like [`Self::seed`]; `None` draws a fresh seed on every run.
    #[must_use]
    pub fn maybe_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn statistic(&self) -> &S {
        &self.statistic
    }

    /// Runs the test on `values` grouped by `labels`.
    ///
    /// All inputs are validated before the first statistic is computed.
    pub fn run<T, L>(&self, values: &[T], labels: &[L]) -> Result<PermutationOutcome, PermutationError>
    where
        S: TwoSampleStatistic<T>,
        L: Ord,
    {
        self.ensure_trials()?;
        let membership = Membership::for_sample(values, labels)?;
        self.run_with_membership(values, &membership)
    }

    /// Like [`Self::run`], but with a grouping that has already been validated.
    pub fn run_with_membership<T>(
        &self,
        values: &[T],
        membership: &Membership,
    ) -> Result<PermutationOutcome, PermutationError>
    where
        S: TwoSampleStatistic<T>,
    {
        self.ensure_trials()?;
        if values.is_empty() {
            return Err(SampleError::EmptyInput.into());
        }
        sample::ensure_same_len(values.len(), membership.len())?;
        self.statistic.validate(values)?;

        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = Pcg32::seed_from_u64(seed);

        let observed = self.statistic.evaluate(values, membership);
        let mut shuffled = membership.clone();
        let null_distribution = (0..self.trials)
            .map(|_| {
                shuffled.shuffle(&mut rng);
                self.statistic.evaluate(values, &shuffled)
            })
            .collect::<Vec<_>>();
        let p_value = p_value(observed, &null_distribution);

        Ok(PermutationOutcome {
            observed,
            p_value,
            null_distribution,
            seed,
        })
    }

    fn ensure_trials(&self) -> Result<(), PermutationError> {
        if self.trials == 0 {
            return Err(PermutationError::InvalidTrialCount);
        }
        Ok(())
    }
}

/// Runs a permutation test with the given statistic, trial count and optional seed.
///
/// # Examples
///
/// ```
/// use permute_stats::{distance::TotalVariation, permutation::permutation_test};
///
/// let values = ["x"; 8];
/// let labels = [0, 0, 1, 1, 1, 0, 1, 1];
/// let outcome = permutation_test(&values, &labels, TotalVariation, 100, Some(1)).unwrap();
/// assert_eq!(outcome.observed, 0.0);
/// assert_eq!(outcome.p_value, 1.0);
/// ```
pub fn permutation_test<T, L, S>(
    values: &[T],
    labels: &[L],
    statistic: S,
    trials: usize,
    seed: Option<u64>,
) -> Result<PermutationOutcome, PermutationError>
where
    S: TwoSampleStatistic<T>,
    L: Ord,
{
    PermutationTest::new(statistic)
        .trials(trials)
        .maybe_seed(seed)
        .run(values, labels)
}

/// Fraction of `null_distribution` at least as large as `observed`.
///
/// # Panics
///
/// Panics if `null_distribution` is empty.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn p_value(observed: f64, null_distribution: &[f64]) -> f64 {
    assert!(!null_distribution.is_empty(), "null distribution is empty");
    let extreme = null_distribution.iter().filter(|&&s| s >= observed).count();
    extreme as f64 / null_distribution.len() as f64
}
