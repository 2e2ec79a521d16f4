use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use xrfalign_core::consts::DEFAULT_APODIZE_SIGMA;
use xrfalign_core::pipeline::config::{AlignmentConfig, AlignmentPass, PipelineConfig, SineModel};
use xrfalign_core::pipeline::run_pipeline_reported;

use crate::progress::BarReporter;
use crate::summary::{print_alignment_report, print_pipeline_summary};

#[derive(Clone, Copy, ValueEnum)]
pub enum AlignMethodArg {
    CrossCorrelation,
    PhaseCorrelation,
    TemplateMatch,
    CenterOfMass,
}

#[derive(Args)]
pub struct AlignArgs {
    /// Projection directory (one subdirectory per channel)
    pub dir: PathBuf,

    /// Theta file with one angle per projection
    #[arg(long)]
    pub thetas: PathBuf,

    /// Pipeline config file (TOML); its passes replace --method
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Alignment method
    #[arg(long, value_enum, default_value = "cross-correlation")]
    pub method: AlignMethodArg,

    /// Reference channel driving the alignment
    #[arg(long, default_value = "0")]
    pub channel: usize,

    /// Apodization sigma for correlation methods (0 disables)
    #[arg(long, default_value_t = DEFAULT_APODIZE_SIGMA)]
    pub apodize: f32,

    /// Keep the projection order instead of sorting by angle
    #[arg(long)]
    pub no_sort: bool,

    /// Output alignment file
    #[arg(short, long, default_value = "alignment.csv")]
    pub output: PathBuf,
}

pub fn run(args: &AlignArgs) -> Result<()> {
    let mut config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str::<PipelineConfig>(&contents).context("Invalid pipeline config")?
    } else {
        build_config_from_args(args)
    };
    config.input = args.dir.clone();
    config.thetas = args.thetas.clone();
    config.output = args.output.clone();

    print_pipeline_summary(&config);

    let reporter = BarReporter::default();
    let (session, report) = run_pipeline_reported(&config, &reporter)
        .with_context(|| format!("Alignment of {} failed", config.input.display()))?;

    print_alignment_report(&report, session.stack().projections());
    println!("Alignment saved to {}", config.output.display());

    Ok(())
}

fn build_config_from_args(args: &AlignArgs) -> PipelineConfig {
    let apodize_sigma = (args.apodize > 0.0).then_some(args.apodize);
    let pass = match args.method {
        AlignMethodArg::CrossCorrelation => AlignmentPass::CrossCorrelation { apodize_sigma },
        AlignMethodArg::PhaseCorrelation => AlignmentPass::PhaseCorrelation { apodize_sigma },
        AlignMethodArg::TemplateMatch => AlignmentPass::TemplateMatch,
        AlignMethodArg::CenterOfMass => AlignmentPass::CenterOfMass {
            model: SineModel::WithOffset,
            rows: None,
        },
    };

    PipelineConfig {
        input: args.dir.clone(),
        thetas: args.thetas.clone(),
        output: args.output.clone(),
        alignment: AlignmentConfig {
            reference_channel: args.channel,
            sort_by_angle: !args.no_sort,
            passes: vec![pass],
        },
    }
}
