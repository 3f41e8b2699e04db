use clap::{Parser, Subcommand};

use self::{missingness::MissingnessArg, permutation_test::PermutationTestArg};

mod missingness;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Test whether a value column is distributed the same way in two groups
    #[command(name = "test")]
    PermutationTest(#[clap(flatten)] PermutationTestArg),
    /// Find which columns the missingness of each column depends on
    Missingness(#[clap(flatten)] MissingnessArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::PermutationTest(arg) => permutation_test::run(&arg)?,
        Mode::Missingness(arg) => missingness::run(&arg)?,
    }
    Ok(())
}
