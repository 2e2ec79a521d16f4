use std::ops::{Add, AddAssign, Neg, Sub};

use ndarray::{Array2, Array4, ArrayView2, Axis};
use rayon::prelude::*;

use crate::consts::PARALLEL_ELEMENT_THRESHOLD;
use crate::error::{Result, XrfAlignError};

/// Integer pixel displacement between two projections, as (row, column).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelOffset {
    pub dy: i64,
    pub dx: i64,
}

impl PixelOffset {
    pub const ZERO: PixelOffset = PixelOffset { dy: 0, dx: 0 };

    pub fn new(dy: i64, dx: i64) -> Self {
        Self { dy, dx }
    }

    pub fn is_zero(&self) -> bool {
        self.dy == 0 && self.dx == 0
    }
}

impl Add for PixelOffset {
    type Output = PixelOffset;

    fn add(self, rhs: Self) -> Self::Output {
        PixelOffset::new(self.dy + rhs.dy, self.dx + rhs.dx)
    }
}

impl AddAssign for PixelOffset {
    fn add_assign(&mut self, rhs: Self) {
        self.dy += rhs.dy;
        self.dx += rhs.dx;
    }
}

impl Sub for PixelOffset {
    type Output = PixelOffset;

    fn sub(self, rhs: Self) -> Self::Output {
        PixelOffset::new(self.dy - rhs.dy, self.dx - rhs.dx)
    }
}

impl Neg for PixelOffset {
    type Output = PixelOffset;

    fn neg(self) -> Self::Output {
        PixelOffset::new(-self.dy, -self.dx)
    }
}

impl std::fmt::Display for PixelOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(dy={}, dx={})", self.dy, self.dx)
    }
}

/// Multi-channel tilt series of XRF element maps.
///
/// Data is indexed `[channel, projection, row, column]`. Every channel has the
/// same projection count and the same image size.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionStack {
    data: Array4<f32>,
}

impl ProjectionStack {
    pub fn new(data: Array4<f32>) -> Result<Self> {
        if data.is_empty() {
            return Err(XrfAlignError::EmptyStack);
        }
        Ok(Self { data })
    }

    /// Build a stack from per-channel lists of projection images.
    pub fn from_projections(channels: &[Vec<Array2<f32>>]) -> Result<Self> {
        let first = channels
            .first()
            .and_then(|c| c.first())
            .ok_or(XrfAlignError::EmptyStack)?;
        let (h, w) = first.dim();
        let n = channels[0].len();

        let mut data = Array4::<f32>::zeros((channels.len(), n, h, w));
        for (c, projections) in channels.iter().enumerate() {
            if projections.len() != n {
                return Err(XrfAlignError::DimensionMismatch {
                    expected: vec![n],
                    found: vec![projections.len()],
                });
            }
            for (p, image) in projections.iter().enumerate() {
                if image.dim() != (h, w) {
                    return Err(XrfAlignError::DimensionMismatch {
                        expected: vec![h, w],
                        found: vec![image.nrows(), image.ncols()],
                    });
                }
                data.index_axis_mut(Axis(0), c)
                    .index_axis_mut(Axis(0), p)
                    .assign(image);
            }
        }

        Self::new(data)
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn into_inner(self) -> Array4<f32> {
        self.data
    }

    pub fn channels(&self) -> usize {
        self.data.dim().0
    }

    pub fn projections(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().2
    }

    pub fn width(&self) -> usize {
        self.data.dim().3
    }

    pub fn check_channel(&self, channel: usize) -> Result<()> {
        if channel >= self.channels() {
            return Err(XrfAlignError::ChannelOutOfRange {
                index: channel,
                total: self.channels(),
            });
        }
        Ok(())
    }

    pub fn check_projection(&self, index: usize) -> Result<()> {
        if index >= self.projections() {
            return Err(XrfAlignError::ProjectionOutOfRange {
                index,
                total: self.projections(),
            });
        }
        Ok(())
    }

    /// View of one channel at one projection angle.
    pub fn projection(&self, channel: usize, index: usize) -> Result<ArrayView2<'_, f32>> {
        self.check_channel(channel)?;
        self.check_projection(index)?;
        Ok(self
            .data
            .index_axis(Axis(0), channel)
            .index_axis_move(Axis(0), index))
    }

    /// Circularly roll every channel of one projection by `(dy, dx)`.
    pub(crate) fn roll_projection(&mut self, index: usize, dy: i64, dx: i64) -> Result<()> {
        self.check_projection(index)?;
        if dy == 0 && dx == 0 {
            return Ok(());
        }
        for channel in 0..self.channels() {
            let mut view = self
                .data
                .index_axis_mut(Axis(0), channel)
                .index_axis_move(Axis(0), index);
            let rolled = roll_array(&view.view(), dy, dx);
            view.assign(&rolled);
        }
        Ok(())
    }

    /// Replace NaN and infinite values with `sentinel`. Returns how many
    /// pixels were replaced.
    pub fn scrub_non_finite(&mut self, sentinel: f32) -> usize {
        let replaced = self.data.iter().filter(|v| !v.is_finite()).count();
        if replaced == 0 {
            return 0;
        }
        let scrub = |v: f32| if v.is_finite() { v } else { sentinel };
        if self.data.len() >= PARALLEL_ELEMENT_THRESHOLD {
            self.data.par_mapv_inplace(scrub);
        } else {
            self.data.mapv_inplace(scrub);
        }
        replaced
    }

    pub(crate) fn remove_projection(&mut self, index: usize) -> Result<()> {
        self.check_projection(index)?;
        if self.projections() == 1 {
            return Err(XrfAlignError::EmptyStack);
        }
        let keep: Vec<usize> = (0..self.projections()).filter(|&i| i != index).collect();
        self.data = self.data.select(Axis(1), &keep);
        Ok(())
    }

    /// Reorder projections so that new index `i` holds old index `order[i]`.
    pub(crate) fn reorder_projections(&mut self, order: &[usize]) -> Result<()> {
        validate_permutation(order, self.projections())?;
        self.data = self.data.select(Axis(1), order);
        Ok(())
    }
}

pub(crate) fn validate_permutation(order: &[usize], len: usize) -> Result<()> {
    if order.len() != len {
        return Err(XrfAlignError::DimensionMismatch {
            expected: vec![len],
            found: vec![order.len()],
        });
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len {
            return Err(XrfAlignError::ProjectionOutOfRange { index: i, total: len });
        }
        if std::mem::replace(&mut seen[i], true) {
            return Err(XrfAlignError::DegenerateInput(format!(
                "projection {i} appears twice in reorder"
            )));
        }
    }
    Ok(())
}

/// Circularly roll a 2D array: the pixel at `(r, c)` moves to
/// `((r + dy) mod h, (c + dx) mod w)`.
pub fn roll_array(data: &ArrayView2<f32>, dy: i64, dx: i64) -> Array2<f32> {
    let (h, w) = data.dim();
    let mut result = Array2::<f32>::zeros((h, w));
    if h == 0 || w == 0 {
        return result;
    }

    let dy = dy.rem_euclid(h as i64) as usize;
    let dx = dx.rem_euclid(w as i64) as usize;

    for row in 0..h {
        let dst_row = (row + dy) % h;
        for col in 0..w {
            result[[dst_row, (col + dx) % w]] = data[[row, col]];
        }
    }

    result
}
