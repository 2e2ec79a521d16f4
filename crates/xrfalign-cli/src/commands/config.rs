use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use xrfalign_core::pipeline::config::{AlignmentConfig, AlignmentPass, PipelineConfig, SineModel};

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a full default PipelineConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let mut alignment = AlignmentConfig::default();
    alignment.passes.push(AlignmentPass::CenterOfMass {
        model: SineModel::WithOffset,
        rows: None,
    });
    let config = PipelineConfig {
        input: PathBuf::from("projections"),
        thetas: PathBuf::from("thetas.txt"),
        output: PathBuf::from("alignment.csv"),
        alignment,
    };
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
