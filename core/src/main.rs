use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::fs;
use std::process;

use lesionmatch_core::cli::{Cli, Command, EvaluateArgs, OutputFormat, PrepareArgs};
use lesionmatch_core::{
    evaluate_with_progress, prepare, EvaluationConfig, ExperimentLayout, JsonLoader, JsonWriter,
    LesionMatchError, Result, RjafrocWriter, TextReport, Writer,
};

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    let outcome = match cli.command {
        Command::Prepare(args) => run_prepare(args),
        Command::Evaluate(args) => run_evaluate(args),
    };

    if let Err(e) = outcome {
        error!("{}", e);
        eprintln!("Error: {}", e);
        if let LesionMatchError::Completeness(issues) = &e {
            for issue in issues {
                eprintln!("  {}", issue);
            }
            eprintln!("Use --allow-incomplete to write the partial results");
        }
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    if !args.dicom_dir.is_dir() {
        return Err(LesionMatchError::Layout(format!(
            "{} is not a directory",
            args.dicom_dir.display()
        )));
    }

    info!("Processing directory: {}", args.dicom_dir.display());
    let cases = prepare(&args.dicom_dir, &args.target_dir, args.num_of_raters)?;
    info!(
        "Prepared {} case(s) for {} rater(s) in {}",
        cases.len(),
        args.num_of_raters,
        args.target_dir.display()
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let config = EvaluationConfig::default()
        .criteria(args.criteria.into())
        .min_lesion_radius(args.min_radius)
        .parallel(!args.sequential)
        .allow_incomplete(args.allow_incomplete);
    info!("Using criteria: {}", config.criteria);

    let layout = ExperimentLayout::discover(&args.eval_dir)?;
    info!(
        "Found {} reference case(s) in {}",
        layout.reference_cases().len(),
        args.eval_dir.display()
    );
    let loader = JsonLoader::new(layout.clone()).min_lesion_radius(config.min_lesion_radius);

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let aggregation = evaluate_with_progress(&layout, &loader, &config, &progress)?;

    let out_path = args.out_path.or_else(|| args.format.default_path());
    match args.format {
        OutputFormat::Rjafroc => {
            if let Some(dir) = out_path {
                RjafrocWriter::new(dir).write(&aggregation.table)?;
            }
        }
        OutputFormat::Json => {
            if let Some(path) = out_path {
                JsonWriter::new(path).write(&aggregation.table)?;
            }
        }
        OutputFormat::Text => {
            let report = TextReport::new(&aggregation);
            match out_path {
                Some(path) => {
                    fs::write(&path, report.to_string())?;
                    info!("Wrote report to {}", path.display());
                }
                None => println!("{}", report),
            }
        }
    }

    Ok(())
}
