// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with `clap` and routes each
// subcommand to its use case in Layer 2. Results meant for the
// user are printed here; progress goes through `tracing`.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{
    CombineArgs, CombineCirclesArgs, Commands, RatioExtractArgs, RatioHistArgs, TrainArgs,
};

use crate::application::{
    montage_use_case::MontageUseCase,
    ratio_extract_use_case::RatioExtractUseCase,
    ratio_hist_use_case::RatioHistUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "dsipm",
    version,
    about = "Analysis tools for the dSiPM calorimeter simulation: network training, snapshot montages and ratio-vs-radius extraction and histograms."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)          => run_train(args),
            Commands::Combine(args)        => run_combine(args),
            Commands::CombineCircles(args) => run_combine_circles(args),
            Commands::RatioExtract(args)   => run_ratio_extract(args),
            Commands::RatioHist(args)      => run_ratio_hist(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on shower files in: {}", args.data_dir);

    let report = TrainUseCase::new(args.into()).execute()?;

    println!("Test Loss: {:.4}", report.loss);
    println!("Test Particle Accuracy: {:.4}", report.accuracy);
    println!("Test Energy MAE: {:.4}", report.energy_mae);
    Ok(())
}

fn run_combine(args: CombineArgs) -> Result<()> {
    print_written(&MontageUseCase::new(args.into()).execute()?);
    Ok(())
}

fn run_combine_circles(args: CombineCirclesArgs) -> Result<()> {
    print_written(&MontageUseCase::new(args.into()).execute()?);
    Ok(())
}

fn run_ratio_extract(args: RatioExtractArgs) -> Result<()> {
    let output = args.output.clone();
    let graphs = RatioExtractUseCase::new(args.into()).execute()?;
    println!("Wrote {} graphs to {}", graphs.len(), output);
    Ok(())
}

fn run_ratio_hist(args: RatioHistArgs) -> Result<()> {
    let output = RatioHistUseCase::new(args.into()).execute()?;
    for path in &output.per_deadtime {
        println!("Histogram saved to {}", path.display());
    }
    println!("Combined plot saved to {}", output.combined.display());
    Ok(())
}

fn print_written(paths: &[std::path::PathBuf]) {
    if paths.is_empty() {
        println!("No images were combined.");
    }
    for path in paths {
        println!("Wrote {}", path.display());
    }
}
