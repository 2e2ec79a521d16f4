use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use xrfalign_core::align::{center_of_mass, center_of_mass_rows, fit_center_of_mass};
use xrfalign_core::io::image_stack::load_image_stack;
use xrfalign_core::io::theta_file::load_theta_file;
use xrfalign_core::session::AlignmentSession;

#[derive(Args)]
pub struct ComArgs {
    /// Projection directory (one subdirectory per channel)
    pub dir: PathBuf,

    /// Theta file with one angle per projection
    #[arg(long)]
    pub thetas: PathBuf,

    /// Channel to track
    #[arg(long, default_value = "0")]
    pub channel: usize,

    /// Restrict the centroid to rows START:END
    #[arg(long, value_parser = parse_rows)]
    pub rows: Option<(usize, usize)>,
}

pub fn run(args: &ComArgs) -> Result<()> {
    let loaded = load_image_stack(&args.dir)
        .with_context(|| format!("Failed to load projections from {}", args.dir.display()))?;
    let thetas = load_theta_file(&args.thetas)
        .with_context(|| format!("Failed to read theta file {}", args.thetas.display()))?;
    let session = AlignmentSession::from_loaded(loaded, &thetas)?;

    let centroids = match args.rows {
        Some((start, end)) => center_of_mass_rows(session.stack(), args.channel, start..end)?,
        None => center_of_mass(session.stack(), args.channel)?,
    };
    let fit = fit_center_of_mass(session.angles(), &centroids)?;
    let residuals = fit.residuals(session.angles(), &centroids)?;

    println!("{:<28} {:>10} {:>12} {:>10}", "Projection", "Theta", "Centroid", "Residual");
    for (i, name) in session.filenames().iter().enumerate() {
        println!(
            "{:<28} {:>10.2} {:>12.3} {:>10.3}",
            name,
            session.angles()[i],
            centroids[i],
            residuals[i]
        );
    }
    println!();
    println!("Amplitude:        {:.3}", fit.amplitude);
    println!("Phase:            {:.3}", fit.phase);
    println!("Rotation center:  {:.3}", fit.rotation_center());

    Ok(())
}

fn parse_rows(s: &str) -> Result<(usize, usize), String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{s}'"))?;
    let start = start.trim().parse().map_err(|_| format!("invalid start row '{start}'"))?;
    let end = end.trim().parse().map_err(|_| format!("invalid end row '{end}'"))?;
    Ok((start, end))
}
