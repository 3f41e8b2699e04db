//! Missingness mechanism analysis
//!
//! Decides, for each column with missing values, which other columns its
//! missingness depends on.
//!
//! # Procedure
//!
//! For a target column `c` and every other column `c'`:
//!
//! 1. Split the rows into "`c` missing" and "`c` present".
//! 2. Drop rows where `c'` itself is missing.
//! 3. Compare the distribution of `c'` between the two groups with a
//!    permutation test: total variation distance for categorical `c'`,
//!    Kolmogorov–Smirnov for quantitative `c'`.
//! 4. If the p-value is below the significance level, the missingness of `c`
//!    depends on `c'`.
//!
//! A target whose list of dependencies ends up empty is consistent with
//! values missing completely at random, as far as the observed columns can
//! tell. This procedure assumes the missingness is ignorable: it cannot detect
//! missingness that depends on the missing values themselves.
//!
//! # Examples
//!
//! ```
//! use permute_analysis::{
//!     missingness::{MissingnessConfig, MissingnessReport},
//!     table::{Cell, Column, Table},
//! };
//!
//! let temp = (0..40).map(|i| Some(Cell::Number(f64::from(i)))).collect();
//! // Wind readings are missing on the coldest days.
//! let wind = (0..40)
//!     .map(|i| (i >= 10).then_some(Cell::Number(5.0)))
//!     .collect();
//! let table = Table::from_columns(vec![Column::new("temp", temp), Column::new("wind", wind)]).unwrap();
//!
//! let config = MissingnessConfig {
//!     seed: Some(1),
//!     ..MissingnessConfig::default()
//! };
//! let report = MissingnessReport::analyze(&table, &config).unwrap();
//! assert_eq!(report.targets[0].dependent_columns, ["temp"]);
//! ```

use std::collections::BTreeSet;

use permute_stats::{
    distance::{KolmogorovSmirnov, Statistic, TotalVariation},
    permutation::{DEFAULT_TRIALS, PermutationError, PermutationOutcome, PermutationTest},
    sample::SampleError,
};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::table::{Column, ColumnKind, Table};

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum AnalysisError {
    #[display("unknown column '{name}'")]
    UnknownColumn { name: String },
    #[display("column '{name}' cannot be compared with itself")]
    SelfComparison { name: String },
    #[display("column '{name}' is not numeric and cannot be treated as quantitative")]
    NotQuantitative { name: String },
    #[display("{_0}")]
    #[from]
    Permutation(PermutationError),
}

/// Settings of the missingness analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingnessConfig {
    /// Permutation trials per column pair.
    pub trials: usize,
    /// Base seed; `None` draws one at random.
    pub seed: Option<u64>,
    /// Significance level below which a dependency is reported.
    pub alpha: f64,
    /// Columns to analyze; `None` means all columns. Repeated names are analyzed once.
    pub columns: Option<Vec<String>>,
    /// Columns compared as categorical even if every value is numeric.
    pub categorical: BTreeSet<String>,
}

impl Default for MissingnessConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: None,
            alpha: DEFAULT_ALPHA,
            columns: None,
            categorical: BTreeSet::new(),
        }
    }
}

impl MissingnessConfig {
    /// How `column` is compared under this configuration.
    #[must_use]
    pub fn kind_of(&self, column: &Column) -> ColumnKind {
        if self.categorical.contains(&column.name) {
            ColumnKind::Categorical
        } else {
            column.infer_kind()
        }
    }
}

/// Result of testing whether the missingness of `target` depends on `other`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyTest {
    pub target: String,
    pub other: String,
    pub kind: ColumnKind,
    #[serde(serialize_with = "serialize_display")]
    pub statistic: Statistic,
    pub observed: f64,
    pub p_value: f64,
    pub seed: u64,
    /// Rows where `other` is present.
    pub rows_compared: usize,
    /// Rows among `rows_compared` where `target` is missing.
    pub target_missing: usize,
    pub dependent: bool,
    #[serde(skip)]
    pub null_distribution: Vec<f64>,
}

/// Tests whether the missingness of column `target` depends on column `other`.
///
/// Rows where `other` is missing are left out. The test uses
/// `config.seed` (or a random seed) and `config.trials`.
pub fn missingness_test(
    table: &Table,
    target: &str,
    other: &str,
    config: &MissingnessConfig,
) -> Result<DependencyTest, AnalysisError> {
    let target_column = lookup(table, target)?;
    let other_column = lookup(table, other)?;
    if target == other {
        return Err(AnalysisError::SelfComparison {
            name: target.to_owned(),
        });
    }

    let kind = config.kind_of(other_column);
    let (labels, present): (Vec<bool>, Vec<_>) = target_column
        .cells
        .iter()
        .zip(&other_column.cells)
        .filter_map(|(t, o)| o.as_ref().map(|o| (t.is_none(), o)))
        .unzip();

    let (statistic, outcome) = match kind {
        ColumnKind::Categorical => {
            let values = present.iter().map(|c| c.category()).collect::<Vec<_>>();
            let outcome = PermutationTest::new(TotalVariation)
                .trials(config.trials)
                .maybe_seed(config.seed)
                .run(&values, &labels)?;
            (Statistic::TotalVariation, outcome)
        }
        ColumnKind::Quantitative => {
            let values = present
                .iter()
                .map(|c| c.as_number())
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| AnalysisError::NotQuantitative {
                    name: other.to_owned(),
                })?;
            let outcome = PermutationTest::new(KolmogorovSmirnov)
                .trials(config.trials)
                .maybe_seed(config.seed)
                .run(&values, &labels)?;
            (Statistic::KolmogorovSmirnov, outcome)
        }
    };

    let PermutationOutcome {
        observed,
        p_value,
        null_distribution,
        seed,
    } = outcome;
    Ok(DependencyTest {
        target: target.to_owned(),
        other: other.to_owned(),
        kind,
        statistic,
        observed,
        p_value,
        seed,
        rows_compared: labels.len(),
        target_missing: labels.iter().filter(|&&m| m).count(),
        dependent: p_value < config.alpha,
        null_distribution,
    })
}

fn lookup<'a>(table: &'a Table, name: &str) -> Result<&'a Column, AnalysisError> {
    table
        .column(name)
        .ok_or_else(|| AnalysisError::UnknownColumn {
            name: name.to_owned(),
        })
}

/// A column pair that could not be tested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPair {
    pub other: String,
    pub reason: String,
}

/// Overall conclusion for one target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    /// No tested column explains the missingness.
    #[display("MCAR")]
    CompletelyAtRandom,
    /// At least one tested column explains the missingness.
    #[display("MAR")]
    DependsOnObserved,
}

/// Dependency results for one column with missing values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetReport {
    pub column: String,
    pub missing_count: usize,
    pub missing_rate: f64,
    pub mechanism: Mechanism,
    pub dependent_columns: Vec<String>,
    pub tests: Vec<DependencyTest>,
    pub skipped: Vec<SkippedPair>,
}

/// Missingness dependencies of every analyzed column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingnessReport {
    pub rows: usize,
    pub alpha: f64,
    pub trials: usize,
    /// Base seed from which every pair's seed was derived.
    pub seed: u64,
    pub targets: Vec<TargetReport>,
    /// Analyzed columns without any missing value.
    pub complete_columns: Vec<String>,
}

impl MissingnessReport {
    /// Runs the procedure on every analyzed column that has missing values.
    pub fn analyze(table: &Table, config: &MissingnessConfig) -> Result<Self, AnalysisError> {
        Self::analyze_with_progress(table, config, |_, _| {})
    }

    /// Like [`Self::analyze`], calling `progress(target, other)` before each pair is tested.
    pub fn analyze_with_progress<F>(
        table: &Table,
        config: &MissingnessConfig,
        mut progress: F,
    ) -> Result<Self, AnalysisError>
    where
        F: FnMut(&str, &str),
    {
        if config.trials == 0 {
            return Err(PermutationError::InvalidTrialCount.into());
        }
        let columns = match &config.columns {
            Some(names) => {
                let mut seen = BTreeSet::new();
                names
                    .iter()
                    .filter(|name| seen.insert(name.as_str()))
                    .map(|name| lookup(table, name))
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => table.columns().iter().collect(),
        };

        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut seeds = Pcg32::seed_from_u64(seed);

        let mut targets = vec![];
        let mut complete_columns = vec![];
        for target in &columns {
            let missing_count = target.missing_count();
            if missing_count == 0 {
                complete_columns.push(target.name.clone());
                continue;
            }

            let mut tests = vec![];
            let mut skipped = vec![];
            for other in columns.iter().filter(|c| c.name != target.name) {
                progress(&target.name, &other.name);
                let pair_config = MissingnessConfig {
                    seed: Some(seeds.random()),
                    ..config.clone()
                };
                match missingness_test(table, &target.name, &other.name, &pair_config) {
                    Ok(test) => tests.push(test),
                    Err(AnalysisError::Permutation(PermutationError::Sample(
                        e @ (SampleError::EmptyInput | SampleError::InvalidGroupCount { .. }),
                    ))) => skipped.push(SkippedPair {
                        other: other.name.clone(),
                        reason: e.to_string(),
                    }),
                    Err(e) => return Err(e),
                }
            }

            let dependent_columns = tests
                .iter()
                .filter(|t| t.dependent)
                .map(|t| t.other.clone())
                .collect::<Vec<_>>();
            let mechanism = if dependent_columns.is_empty() {
                Mechanism::CompletelyAtRandom
            } else {
                Mechanism::DependsOnObserved
            };
            targets.push(TargetReport {
                column: target.name.clone(),
                missing_count,
                missing_rate: target.missing_rate(),
                mechanism,
                dependent_columns,
                tests,
                skipped,
            });
        }

        Ok(Self {
            rows: table.rows(),
            alpha: config.alpha,
            trials: config.trials,
            seed,
            targets,
            complete_columns,
        })
    }
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::Display,
    S: serde::Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use crate::table::Cell;

    use super::*;

    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

    /// 70 days: wind is missing below 10 degrees; the weekday is unrelated.
    fn weather() -> Table {
        let temp = (0..70)
            .map(|i| Some(Cell::Number(f64::from((i * 37) % 70) / 2.0)))
            .collect::<Vec<_>>();
        let day = (0..70)
            .map(|i| Some(Cell::Text(DAYS[i % 7].to_owned())))
            .collect::<Vec<_>>();
        let wind = temp
            .iter()
            .map(|t| match t {
                Some(Cell::Number(t)) if *t < 10.0 => None,
                _ => Some(Cell::Number(12.0)),
            })
            .collect::<Vec<_>>();
        Table::from_columns(vec![
            Column::new("day", day),
            Column::new("temp", temp),
            Column::new("wind", wind),
        ])
        .unwrap()
    }

    fn config(seed: u64) -> MissingnessConfig {
        MissingnessConfig {
            trials: 500,
            seed: Some(seed),
            ..MissingnessConfig::default()
        }
    }

    #[test]
    fn test_dependent_on_temperature() {
        let test = missingness_test(&weather(), "wind", "temp", &config(1)).unwrap();
        assert_eq!(test.kind, ColumnKind::Quantitative);
        assert_eq!(test.statistic, Statistic::KolmogorovSmirnov);
        assert_eq!(test.observed, 1.0);
        assert_eq!(test.rows_compared, 70);
        assert_eq!(test.target_missing, 20);
        assert!(test.dependent);
        assert_eq!(test.null_distribution.len(), 500);
    }

    #[test]
    fn test_not_dependent_on_weekday() {
        let table = weather();
        let test = missingness_test(&table, "wind", "day", &config(2)).unwrap();
        assert_eq!(test.kind, ColumnKind::Categorical);
        assert_eq!(test.statistic, Statistic::TotalVariation);
        assert!((0.0..=1.0).contains(&test.observed));
        assert!(test.p_value > 0.05, "p = {}", test.p_value);
        assert!(!test.dependent);
    }

    #[test]
    fn test_rows_with_missing_comparison_value_are_dropped() {
        let target = vec![None, Some(Cell::Bool(true)), None, Some(Cell::Bool(false))];
        let other = vec![
            Some(Cell::Number(1.0)),
            Some(Cell::Number(2.0)),
            None,
            Some(Cell::Number(4.0)),
        ];
        let table =
            Table::from_columns(vec![Column::new("t", target), Column::new("o", other)]).unwrap();
        let test = missingness_test(&table, "t", "o", &config(3)).unwrap();
        assert_eq!(test.rows_compared, 3);
        assert_eq!(test.target_missing, 1);
    }

    #[test]
    fn test_categorical_override() {
        let table = weather();
        let mut config = config(4);
        config.categorical.insert("temp".to_owned());
        let test = missingness_test(&table, "wind", "temp", &config).unwrap();
        assert_eq!(test.kind, ColumnKind::Categorical);
        assert_eq!(test.observed, 1.0);
    }

    #[test]
    fn test_errors() {
        let table = weather();
        assert_eq!(
            missingness_test(&table, "wind", "pressure", &config(5)).unwrap_err(),
            AnalysisError::UnknownColumn {
                name: "pressure".to_owned()
            }
        );
        assert_eq!(
            missingness_test(&table, "wind", "wind", &config(5))
                .unwrap_err()
                .to_string(),
            "column 'wind' cannot be compared with itself"
        );
        let err = missingness_test(&table, "temp", "day", &config(5)).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::Permutation(PermutationError::Sample(
                SampleError::InvalidGroupCount { found: 1 }
            ))
        );
        let mut zero = config(5);
        zero.trials = 0;
        assert_eq!(
            MissingnessReport::analyze(&table, &zero).unwrap_err(),
            AnalysisError::Permutation(PermutationError::InvalidTrialCount)
        );
    }

    #[test]
    fn test_report() {
        let report = MissingnessReport::analyze(&weather(), &config(6)).unwrap();
        assert_eq!(report.rows, 70);
        assert_eq!(report.seed, 6);
        assert_eq!(report.complete_columns, ["day", "temp"]);
        assert_eq!(report.targets.len(), 1);

        let wind = &report.targets[0];
        assert_eq!(wind.column, "wind");
        assert_eq!(wind.missing_count, 20);
        assert_eq!(wind.tests.len(), 2);
        assert!(wind.skipped.is_empty());
        assert_eq!(wind.dependent_columns, ["temp"]);
        assert_eq!(wind.mechanism, Mechanism::DependsOnObserved);
    }

    #[test]
    fn test_report_is_reproducible() {
        let table = weather();
        let first = MissingnessReport::analyze(&table, &config(7)).unwrap();
        let second = MissingnessReport::analyze(&table, &config(7)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_skips_untestable_pairs() {
        // `b` is only present where `a` is missing, so no row compares both groups.
        let a = vec![None, None, Some(Cell::Number(1.0)), Some(Cell::Number(2.0))];
        let b = vec![Some(Cell::Number(1.0)), Some(Cell::Number(3.0)), None, None];
        let table = Table::from_columns(vec![Column::new("a", a), Column::new("b", b)]).unwrap();
        let report = MissingnessReport::analyze(&table, &config(8)).unwrap();
        assert_eq!(report.targets.len(), 2);
        for target in &report.targets {
            assert!(target.tests.is_empty());
            assert_eq!(target.skipped.len(), 1);
            assert_eq!(target.mechanism, Mechanism::CompletelyAtRandom);
        }
    }

    #[test]
    fn test_progress_and_column_selection() {
        let table = weather();
        let config = MissingnessConfig {
            columns: Some(vec!["wind".to_owned(), "day".to_owned()]),
            ..config(9)
        };
        let mut pairs = vec![];
        let report = MissingnessReport::analyze_with_progress(&table, &config, |t, o| {
            pairs.push((t.to_owned(), o.to_owned()));
        })
        .unwrap();
        assert_eq!(pairs, [("wind".to_owned(), "day".to_owned())]);
        assert_eq!(report.complete_columns, ["day"]);
        assert!(report.targets[0].dependent_columns.is_empty());
        assert_eq!(report.targets[0].mechanism, Mechanism::CompletelyAtRandom);
    }

    #[test]
    fn test_serialized_report() {
        let report = MissingnessReport::analyze(&weather(), &config(10)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let test = &json["targets"][0]["tests"][1];
        assert_eq!(test["other"], "temp");
        assert_eq!(test["statistic"], "ks");
        assert_eq!(test["kind"], "quantitative");
        assert!(test.get("null_distribution").is_none());
        assert_eq!(json["targets"][0]["mechanism"], "depends_on_observed");
    }

    #[test]
    fn test_repeated_columns_are_analyzed_once() {
        let table = weather();
        let config = MissingnessConfig {
            columns: Some(vec![
                "wind".to_owned(),
                "day".to_owned(),
                "wind".to_owned(),
                "day".to_owned(),
            ]),
            ..config(11)
        };
        let mut pairs = vec![];
        let report = MissingnessReport::analyze_with_progress(&table, &config, |t, o| {
            pairs.push((t.to_owned(), o.to_owned()));
        })
        .unwrap();
        assert_eq!(pairs, [("wind".to_owned(), "day".to_owned())]);
        assert_eq!(report.targets.len(), 1);
        assert_eq!(report.complete_columns, ["day"]);
    }

    #[test]
    fn test_permutation_error_converts() {
        let err = AnalysisError::from(PermutationError::InvalidTrialCount);
        assert_eq!(
            err,
            AnalysisError::Permutation(PermutationError::InvalidTrialCount)
        );
        assert_eq!(err.to_string(), "trial count must be at least 1");
    }
}
