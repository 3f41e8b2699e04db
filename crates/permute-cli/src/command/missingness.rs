use std::{collections::BTreeSet, io::Write, path::PathBuf};

use anyhow::Context as _;
use permute_analysis::missingness::{
    DEFAULT_ALPHA, MissingnessConfig, MissingnessReport, TargetReport,
};
use permute_stats::permutation::DEFAULT_TRIALS;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct MissingnessArg {
    /// Input table (JSON array of records)
    input: PathBuf,
    /// Columns to analyze, comma separated (all columns if omitted)
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,
    /// Numeric columns to compare as categorical, comma separated
    #[arg(long, value_delimiter = ',')]
    categorical: Vec<String>,
    /// Number of shuffles per column pair
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,
    /// Base seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Significance level
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &MissingnessArg) -> anyhow::Result<()> {
    let table = util::read_table_file(&arg.input)?;
    let config = MissingnessConfig {
        trials: arg.trials,
        seed: arg.seed,
        alpha: arg.alpha,
        columns: arg.columns.clone(),
        categorical: arg.categorical.iter().cloned().collect::<BTreeSet<_>>(),
    };

    let report = MissingnessReport::analyze_with_progress(&table, &config, |target, other| {
        eprintln!("  Testing: missingness of {target} against {other}");
    })
    .context("Failed to analyze missingness")?;

    let mut summary = util::summary_writer(arg.output.as_deref());
    print_report(&mut summary, &report).context("Failed to write summary")?;
    drop(summary);

    util::save_report(&report, arg.output.as_deref())?;
    Ok(())
}

fn print_report(out: &mut dyn Write, report: &MissingnessReport) -> std::io::Result<()> {
    writeln!(
        out,
        "Missingness Report (rows={}, alpha={}, trials={}, seed={})",
        report.rows, report.alpha, report.trials, report.seed
    )?;
    writeln!(out, "==========================================\n")?;

    if report.targets.is_empty() {
        writeln!(out, "No analyzed column has missing values.")?;
    }
    for target in &report.targets {
        print_target(out, target)?;
        writeln!(out)?;
    }
    if !report.complete_columns.is_empty() {
        writeln!(
            out,
            "Complete columns: {}",
            report.complete_columns.join(", ")
        )?;
    }
    Ok(())
}

fn print_target(out: &mut dyn Write, target: &TargetReport) -> std::io::Result<()> {
    writeln!(
        out,
        "{}: {} missing ({:.1}%), {}",
        target.column,
        target.missing_count,
        target.missing_rate * 100.0,
        target.mechanism
    )?;
    if !target.dependent_columns.is_empty() {
        writeln!(out, "  Depends on: {}", target.dependent_columns.join(", "))?;
    }

    writeln!(
        out,
        "  {:<16} {:>16} {:>10} {:>10} {:>8}",
        "Column", "Statistic", "Observed", "p-value", "Rows"
    )?;
    for test in &target.tests {
        writeln!(
            out,
            "  {:<16} {:>16} {:>10.4} {:>10.4} {:>8}{}",
            test.other,
            test.statistic.to_string(),
            test.observed,
            test.p_value,
            test.rows_compared,
            if test.dependent { " *" } else { "" }
        )?;
    }
    for skipped in &target.skipped {
        writeln!(out, "  {:<16} skipped: {}", skipped.other, skipped.reason)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use permute_analysis::table::{Cell, Column, Table};

    use super::*;

    #[test]
    fn test_print_report() {
        let temp = (0..40)
            .map(|i| Some(Cell::Number(f64::from(i))))
            .collect::<Vec<_>>();
        let wind = (0..40)
            .map(|i| (i >= 10).then_some(Cell::Number(3.0)))
            .collect::<Vec<_>>();
        let table =
            Table::from_columns(vec![Column::new("temp", temp), Column::new("wind", wind)])
                .unwrap();
        let config = MissingnessConfig {
            trials: 200,
            seed: Some(3),
            ..MissingnessConfig::default()
        };
        let report = MissingnessReport::analyze(&table, &config).unwrap();

        let mut buf = vec![];
        print_report(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("wind: 10 missing (25.0%), MAR"));
        assert!(text.contains("Depends on: temp"));
        assert!(text.contains("Complete columns: temp"));
    }
}
