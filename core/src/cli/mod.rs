pub mod report;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::types::Criteria;

/// Command-line arguments for lesionmatch
#[derive(Parser, Debug)]
#[command(name = "lesionmatch")]
#[command(about = "FROC evaluation of reader responses against reference lesions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create reference and rater directories for every series in a DICOM tree
    Prepare(PrepareArgs),
    /// Match rater responses to reference lesions and write the result tables
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Root directory of the DICOM files used in the experiment
    #[arg(long, value_name = "DIR")]
    pub dicom_dir: PathBuf,

    /// Directory where the experiment tree is created
    #[arg(long, value_name = "DIR")]
    pub target_dir: PathBuf,

    /// Number of raters in the experiment
    #[arg(long, default_value_t = 3)]
    pub num_of_raters: usize,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Experiment root, typically the target directory of `prepare`
    #[arg(long, value_name = "DIR")]
    pub eval_dir: PathBuf,

    /// Output path (directory for rjafroc, file for json and text)
    #[arg(long, value_name = "PATH")]
    pub out_path: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "rjafroc")]
    pub format: OutputFormat,

    /// Criteria for positive responses
    #[arg(long, default_value = "within-lesion")]
    pub criteria: CriteriaArg,

    /// Minimum lesion radius in millimeters
    #[arg(long, default_value_t = 0.0)]
    pub min_radius: f64,

    /// Write results even if some raters did not report on every case
    #[arg(long)]
    pub allow_incomplete: bool,

    /// Classify cases on a single thread
    #[arg(long)]
    pub sequential: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// RJafroc TP/FP/TRUTH tables as CSV files
    Rjafroc,
    /// Flat record table as JSON
    Json,
    /// Human-readable summary
    Text,
}

impl OutputFormat {
    /// Output location used when `--out-path` is not given
    ///
    /// Text goes to stdout by default.
    pub fn default_path(&self) -> Option<PathBuf> {
        match self {
            OutputFormat::Rjafroc => Some(PathBuf::from("rjafroc_froc")),
            OutputFormat::Json => Some(PathBuf::from("lesionmatch.json")),
            OutputFormat::Text => None,
        }
    }
}

/// Matching criteria
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CriteriaArg {
    /// Response must lie inside the lesion sphere
    WithinLesion,
}

impl From<CriteriaArg> for Criteria {
    fn from(arg: CriteriaArg) -> Self {
        match arg {
            CriteriaArg::WithinLesion => Criteria::WithinLesion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_evaluate() {
        let cli = Cli::parse_from([
            "lesionmatch",
            "evaluate",
            "--eval-dir",
            "exp",
            "--format",
            "json",
            "--min-radius",
            "1.5",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Command::Evaluate(args) => {
                assert_eq!(args.eval_dir, PathBuf::from("exp"));
                assert!(matches!(args.format, OutputFormat::Json));
                assert_eq!(args.min_radius, 1.5);
                assert!(!args.allow_incomplete);
                assert_eq!(Criteria::from(args.criteria), Criteria::WithinLesion);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_prepare_defaults() {
        let cli = Cli::parse_from([
            "lesionmatch",
            "prepare",
            "--dicom-dir",
            "dicom",
            "--target-dir",
            "exp",
        ]);
        match cli.command {
            Command::Prepare(args) => assert_eq!(args.num_of_raters, 3),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
