//! Load a multi-channel projection stack from a directory of images.
//!
//! Each subdirectory is one channel (sorted by name) and each image file in
//! it one projection (sorted by filename). A directory without
//! subdirectories is read as a single channel.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use tracing::info;

use crate::error::{Result, XrfAlignError};
use crate::projection::ProjectionStack;

const IMAGE_EXTENSIONS: [&str; 3] = ["tif", "tiff", "png"];

#[derive(Clone, Debug)]
pub struct LoadedStack {
    pub stack: ProjectionStack,
    /// Projection filenames from the first channel, in stack order.
    pub filenames: Vec<String>,
    pub channel_names: Vec<String>,
}

pub fn load_image_stack(dir: &Path) -> Result<LoadedStack> {
    let mut channel_dirs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    channel_dirs.sort();
    if channel_dirs.is_empty() {
        channel_dirs.push(dir.to_path_buf());
    }

    let mut channel_names = Vec::with_capacity(channel_dirs.len());
    let mut channels = Vec::with_capacity(channel_dirs.len());
    let mut filenames = Vec::new();

    for channel_dir in &channel_dirs {
        let files = list_images(channel_dir)?;
        if files.is_empty() {
            return Err(XrfAlignError::EmptyStack);
        }
        if channels.is_empty() {
            filenames = files.iter().map(|p| file_name(p)).collect();
        }

        let projections = files
            .iter()
            .map(|p| load_image(p))
            .collect::<Result<Vec<_>>>()?;
        channel_names.push(file_name(channel_dir));
        channels.push(projections);
    }

    let stack = ProjectionStack::from_projections(&channels)?;
    info!(
        channels = stack.channels(),
        projections = stack.projections(),
        height = stack.height(),
        width = stack.width(),
        "Loaded projection stack"
    );

    Ok(LoadedStack {
        stack,
        filenames,
        channel_names,
    })
}

/// Load one image as `f32` luminance, shape `(height, width)`.
pub fn load_image(path: &Path) -> Result<Array2<f32>> {
    let img = image::open(path)?.to_luma32f();
    let (w, h) = img.dimensions();
    let (w, h) = (w as usize, h as usize);
    Array2::from_shape_vec((h, w), img.into_raw()).map_err(|_| XrfAlignError::DimensionMismatch {
        expected: vec![h, w],
        found: vec![h * w],
    })
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_image_extension(p))
        .collect();
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
