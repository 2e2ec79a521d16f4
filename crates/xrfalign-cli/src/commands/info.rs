use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use xrfalign_core::io::image_stack::load_image_stack;

#[derive(Args)]
pub struct InfoArgs {
    /// Projection directory (one subdirectory per channel)
    pub dir: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let loaded = load_image_stack(&args.dir)
        .with_context(|| format!("Failed to load projections from {}", args.dir.display()))?;
    let stack = &loaded.stack;

    println!("Directory:    {}", args.dir.display());
    println!("Channels:     {}", stack.channels());
    for name in &loaded.channel_names {
        println!("  - {}", name);
    }
    println!("Projections:  {}", stack.projections());
    println!("Dimensions:   {}x{}", stack.width(), stack.height());
    if let (Some(first), Some(last)) = (loaded.filenames.first(), loaded.filenames.last()) {
        println!("Files:        {} .. {}", first, last);
    }

    let total_mb = (stack.data().len() * std::mem::size_of::<f32>()) as f64 / (1024.0 * 1024.0);
    println!("Data size:    {:.1} MB", total_mb);

    Ok(())
}
