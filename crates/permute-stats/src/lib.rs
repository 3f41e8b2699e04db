//! Two-sample distance statistics and permutation tests.
//!
//! This crate answers one question: do the values of a sample look differently
//! distributed in two groups of rows? It provides:
//!
//! - **Sample validation**: turn a two-valued label column into a [`sample::Membership`]
//! - **Empirical distributions**: categorical masses and empirical CDFs aligned on a shared support
//! - **Distance statistics**: total variation distance (TVD), Kolmogorov–Smirnov (KS),
//!   and the absolute difference of means
//! - **Permutation tests**: an empirical p-value for the observed statistic under random
//!   relabelings of the rows
//!
//! # Modules
//!
//! - [`sample`]: Group membership and input validation
//! - [`distribution`]: Categorical distributions, empirical CDFs and CDF alignment
//! - [`distance`]: TVD, KS and mean difference, plus the [`distance::TwoSampleStatistic`] trait
//! - [`permutation`]: The permutation test harness
//!
//! # Examples
//!
//! ## Computing a distance
//!
//! ```
//! use permute_stats::distance::{ks, tvd};
//!
//! let days = ["mon", "tue", "mon", "wed", "tue", "mon"];
//! let missing = [true, false, true, false, false, false];
//! let d = tvd(&days, &missing).unwrap();
//! assert!((0.0..=1.0).contains(&d));
//!
//! let temps = [3.0, 18.5, 1.5, 21.0, 17.0, 19.5];
//! assert_eq!(ks(&temps, &missing).unwrap(), 1.0);
//! ```
//!
//! ## Running a permutation test
//!
//! ```
//! use permute_stats::{distance::KolmogorovSmirnov, permutation::PermutationTest};
//!
//! let temps = [3.0, 18.5, 1.5, 21.0, 17.0, 19.5, 2.0, 20.5];
//! let missing = [true, false, true, false, false, false, true, false];
//! let outcome = PermutationTest::new(KolmogorovSmirnov)
//!     .trials(1000)
//!     .seed(7)
//!     .run(&temps, &missing)
//!     .unwrap();
//! println!("KS = {:.3}, p = {:.3}", outcome.observed, outcome.p_value);
//! ```

pub mod distance;
pub mod distribution;
pub mod permutation;
pub mod sample;
