use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_APODIZE_SIGMA;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory of projection images (one subdirectory per channel).
    pub input: PathBuf,
    /// Theta file with one angle per projection.
    pub thetas: PathBuf,
    /// Alignment file written after the passes complete.
    pub output: PathBuf,
    #[serde(default)]
    pub alignment: AlignmentConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Channel whose projections drive registration and centroid tracking.
    #[serde(default)]
    pub reference_channel: usize,
    /// Reorder projections by ascending angle before the first pass.
    #[serde(default = "default_sort_by_angle")]
    pub sort_by_angle: bool,
    #[serde(default)]
    pub passes: Vec<AlignmentPass>,
}

fn default_sort_by_angle() -> bool {
    true
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            reference_channel: 0,
            sort_by_angle: true,
            passes: vec![AlignmentPass::CrossCorrelation {
                apodize_sigma: Some(DEFAULT_APODIZE_SIGMA),
            }],
        }
    }
}

/// One alignment pass. Passes run in order and their corrections compose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AlignmentPass {
    CrossCorrelation {
        #[serde(default)]
        apodize_sigma: Option<f32>,
    },
    PhaseCorrelation {
        #[serde(default)]
        apodize_sigma: Option<f32>,
    },
    TemplateMatch,
    CenterOfMass {
        #[serde(default)]
        model: SineModel,
        /// Restrict centroids to rows `[start, end)`.
        #[serde(default)]
        rows: Option<[usize; 2]>,
    },
}

impl AlignmentPass {
    /// Registration method for the sequential passes, `None` for centroid
    /// alignment.
    pub fn registration(&self) -> Option<(RegistrationMethod, Option<f32>)> {
        match *self {
            Self::CrossCorrelation { apodize_sigma } => {
                Some((RegistrationMethod::CrossCorrelation, apodize_sigma))
            }
            Self::PhaseCorrelation { apodize_sigma } => {
                Some((RegistrationMethod::PhaseCorrelation, apodize_sigma))
            }
            Self::TemplateMatch => Some((RegistrationMethod::TemplateMatch, None)),
            Self::CenterOfMass { .. } => None,
        }
    }
}

impl std::fmt::Display for AlignmentPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CrossCorrelation { apodize_sigma } => {
                write!(f, "Cross-Correlation")?;
                write_apodize(f, *apodize_sigma)
            }
            Self::PhaseCorrelation { apodize_sigma } => {
                write!(f, "Phase Correlation")?;
                write_apodize(f, *apodize_sigma)
            }
            Self::TemplateMatch => write!(f, "Template Match"),
            Self::CenterOfMass { model, rows } => {
                write!(f, "Center of Mass ({model})")?;
                if let Some([start, end]) = rows {
                    write!(f, " rows {start}..{end}")?;
                }
                Ok(())
            }
        }
    }
}

fn write_apodize(f: &mut std::fmt::Formatter<'_>, sigma: Option<f32>) -> std::fmt::Result {
    match sigma {
        Some(sigma) => write!(f, " (apodize σ={sigma})"),
        None => Ok(()),
    }
}

/// Pairwise registration primitive used by sequential alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationMethod {
    CrossCorrelation,
    PhaseCorrelation,
    TemplateMatch,
}

impl std::fmt::Display for RegistrationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CrossCorrelation => write!(f, "Cross-Correlation"),
            Self::PhaseCorrelation => write!(f, "Phase Correlation"),
            Self::TemplateMatch => write!(f, "Template Match"),
        }
    }
}

/// Sine model used to fit centroids against angle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SineModel {
    /// Amplitude, phase and vertical offset.
    #[default]
    WithOffset,
    /// Amplitude and phase only.
    NoOffset,
}

impl std::fmt::Display for SineModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WithOffset => write!(f, "with offset"),
            Self::NoOffset => write!(f, "no offset"),
        }
    }
}
