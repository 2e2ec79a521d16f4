//! Interface to a tomographic reconstruction backend.
//!
//! The aligned stack of one channel is handed over as a sinogram volume
//! together with the projection angles in radians and the rotation-axis
//! column. Solvers live outside this crate.

use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, XrfAlignError};
use crate::session::AlignmentSession;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionMethod {
    #[default]
    Mlem,
    Gridrec,
    Art,
    PmlHybrid,
    PmlQuad,
    Fbp,
    Sirt,
    Tv,
}

impl ReconstructionMethod {
    pub const ALL: [Self; 8] = [
        Self::Mlem,
        Self::Gridrec,
        Self::Art,
        Self::PmlHybrid,
        Self::PmlQuad,
        Self::Fbp,
        Self::Sirt,
        Self::Tv,
    ];

    /// Whether the method refines an estimate over several iterations.
    pub fn is_iterative(&self) -> bool {
        !matches!(self, Self::Gridrec | Self::Fbp)
    }

    /// Whether the method takes the `beta`/`delta` regularization weights.
    pub fn is_regularized(&self) -> bool {
        matches!(self, Self::PmlHybrid | Self::PmlQuad | Self::Tv)
    }
}

/// Legacy integer codes, `0 = mlem` through `7 = tv`.
impl TryFrom<u8> for ReconstructionMethod {
    type Error = XrfAlignError;

    fn try_from(code: u8) -> Result<Self> {
        Self::ALL.get(code as usize).copied().ok_or_else(|| {
            XrfAlignError::DegenerateInput(format!("unknown reconstruction method code {code}"))
        })
    }
}

impl std::fmt::Display for ReconstructionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mlem => write!(f, "MLEM"),
            Self::Gridrec => write!(f, "Gridrec"),
            Self::Art => write!(f, "ART"),
            Self::PmlHybrid => write!(f, "PML Hybrid"),
            Self::PmlQuad => write!(f, "PML Quad"),
            Self::Fbp => write!(f, "FBP"),
            Self::Sirt => write!(f, "SIRT"),
            Self::Tv => write!(f, "TV"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionParams {
    pub method: ReconstructionMethod,
    pub iterations: usize,
    pub beta: f32,
    pub delta: f32,
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self {
            method: ReconstructionMethod::Mlem,
            iterations: 10,
            beta: 1.0,
            delta: 0.01,
        }
    }
}

/// Everything a backend needs to reconstruct one channel.
#[derive(Clone, Debug)]
pub struct ReconstructionRequest {
    /// Indexed `[row, projection, column]`: one sinogram per image row.
    pub sinograms: Array3<f32>,
    pub angles_rad: Vec<f64>,
    /// Rotation-axis column.
    pub center: f64,
    pub params: ReconstructionParams,
}

impl ReconstructionRequest {
    /// Build a request from the session's current (aligned) stack.
    ///
    /// Without an explicit `center`, the rotation center of the last
    /// center-of-mass fit is used, falling back to half the image width.
    pub fn from_session(
        session: &AlignmentSession,
        channel: usize,
        center: Option<f64>,
        params: ReconstructionParams,
    ) -> Result<Self> {
        let stack = session.stack();
        stack.check_channel(channel)?;

        let sinograms = stack
            .data()
            .index_axis(Axis(0), channel)
            .permuted_axes([1, 0, 2])
            .as_standard_layout()
            .into_owned();
        let angles_rad = session.angles().iter().map(|a| a.to_radians()).collect();
        let center = center
            .or_else(|| session.rotation_center())
            .unwrap_or(stack.width() as f64 / 2.0);

        Ok(Self {
            sinograms,
            angles_rad,
            center,
            params,
        })
    }
}

/// A tomographic solver. Returns a volume indexed `[row, y, x]`.
pub trait Reconstructor {
    fn name(&self) -> &str;

    fn reconstruct(&self, request: &ReconstructionRequest) -> Result<Array3<f32>>;
}
