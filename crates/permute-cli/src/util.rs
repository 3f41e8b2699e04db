use std::{
    fs::File,
    io::{self, BufReader, BufWriter, StdoutLock, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use permute_analysis::table::Table;

/// Destination of a JSON report.
#[derive(Debug)]
pub enum ReportOutput {
    Stdout(StdoutLock<'static>),
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl ReportOutput {
    /// Opens `path` for writing, or stdout when no path is given.
    pub fn create(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(ReportOutput::Stdout(io::stdout().lock()));
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        Ok(ReportOutput::File {
            writer: BufWriter::new(file),
            path: path.to_owned(),
        })
    }

    fn describe(&self) -> String {
        match self {
            ReportOutput::Stdout(_) => "stdout".to_owned(),
            ReportOutput::File { path, .. } => path.display().to_string(),
        }
    }

    /// Writes `report` as pretty JSON followed by a newline, then flushes.
    pub fn write_report<T>(mut self, report: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut self, report)
            .and_then(|()| writeln!(self).map_err(serde_json::Error::io))
            .with_context(|| format!("Failed to write report to {}", self.describe()))?;
        self.flush()
            .with_context(|| format!("Failed to flush report to {}", self.describe()))?;
        if let ReportOutput::File { path, .. } = &self {
            eprintln!("Report saved to {}", path.display());
        }
        Ok(())
    }
}

impl Write for ReportOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ReportOutput::Stdout(writer) => writer.write(buf),
            ReportOutput::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ReportOutput::Stdout(writer) => writer.flush(),
            ReportOutput::File { writer, .. } => writer.flush(),
        }
    }
}

/// Writes `report` to `path`, or to stdout when no path is given.
pub fn save_report<T>(report: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    ReportOutput::create(path)?.write_report(report)
}

/// Reads a table from a JSON file holding an array of records.
pub fn read_table_file(path: &Path) -> anyhow::Result<Table> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open table file: {}", path.display()))?;
    let table: Table = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse table file: {}", path.display()))?;
    eprintln!(
        "Loaded table with {} rows and {} columns",
        table.rows(),
        table.columns().len()
    );
    Ok(table)
}

/// Stream for the human-readable summary: stdout when the JSON report goes to
/// a file, stderr when the JSON report takes stdout.
pub fn summary_writer(output_path: Option<&Path>) -> Box<dyn Write> {
    match output_path {
        Some(_) => Box::new(io::stdout().lock()),
        None => Box::new(io::stderr().lock()),
    }
}
