//! Sinusoidal fit of centroid position versus rotation angle.
//!
//! For a single rotation axis a tracked feature moves along
//! `amplitude * sin(2π/360 * (θ - phase)) + offset`; the fit residuals are the
//! per-projection misalignment. Parameters are estimated with a small
//! Levenberg-Marquardt solver on the normal equations.

use std::f64::consts::TAU;

use tracing::debug;

use crate::consts::{
    SINE_FIT_FTOL, SINE_FIT_INITIAL_GUESS, SINE_FIT_MAX_DAMPING, SINE_FIT_MAX_ITERATIONS,
    SINE_FIT_XTOL,
};
use crate::error::{Result, XrfAlignError};

const DEG: f64 = TAU / 360.0;

/// Fitted parameters of `amplitude * sin(2π/360 * (θ - phase)) + offset`.
///
/// Parameters are normalized so that `amplitude >= 0` and `phase` lies in
/// `[0, 360)`; this does not change the curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SineFit {
    pub amplitude: f64,
    pub phase: f64,
    pub offset: f64,
}

impl SineFit {
    fn normalized(amplitude: f64, phase: f64, offset: f64) -> Self {
        let (amplitude, phase) = if amplitude < 0.0 {
            (-amplitude, phase + 180.0)
        } else {
            (amplitude, phase)
        };
        Self {
            amplitude,
            phase: phase.rem_euclid(360.0),
            offset,
        }
    }

    /// Model value at `theta` degrees.
    pub fn evaluate(&self, theta: f64) -> f64 {
        self.amplitude * (DEG * (theta - self.phase)).sin() + self.offset
    }

    /// Column of the rotation axis implied by the fit.
    pub fn rotation_center(&self) -> f64 {
        self.offset
    }

    /// `f(θ) - centroid` for every sample.
    pub fn residuals(&self, angles: &[f64], centroids: &[f64]) -> Result<Vec<f64>> {
        check_lengths(angles, centroids)?;
        Ok(angles
            .iter()
            .zip(centroids)
            .map(|(&theta, &c)| self.evaluate(theta) - c)
            .collect())
    }
}

/// Fit amplitude, phase and vertical offset to `(angle, centroid)` pairs,
/// starting from `(100, 100, 100)`.
pub fn fit_center_of_mass(angles: &[f64], centroids: &[f64]) -> Result<SineFit> {
    check_lengths(angles, centroids)?;
    let initial = [SINE_FIT_INITIAL_GUESS; 3];
    let p = levenberg_marquardt(angles, centroids, initial, SINE_FIT_MAX_ITERATIONS, |p, theta| {
        let (sin, cos) = (DEG * (theta - p[1])).sin_cos();
        (p[0] * sin + p[2], [sin, -p[0] * DEG * cos, 1.0])
    })?;
    let fit = SineFit::normalized(p[0], p[1], p[2]);
    debug!(
        amplitude = fit.amplitude,
        phase = fit.phase,
        offset = fit.offset,
        "Fitted centroid sine curve"
    );
    Ok(fit)
}

/// Fit amplitude and phase only (no vertical offset), starting from
/// `(100, 100)`. The returned fit has `offset == 0`.
pub fn fit_sine_no_offset(angles: &[f64], centroids: &[f64]) -> Result<SineFit> {
    check_lengths(angles, centroids)?;
    let initial = [SINE_FIT_INITIAL_GUESS; 2];
    let p = levenberg_marquardt(angles, centroids, initial, SINE_FIT_MAX_ITERATIONS, |p, theta| {
        let (sin, cos) = (DEG * (theta - p[1])).sin_cos();
        (p[0] * sin, [sin, -p[0] * DEG * cos])
    })?;
    Ok(SineFit::normalized(p[0], p[1], 0.0))
}

/// Two-parameter fit returning the residual sequence `f(θ) - centroid`
/// directly, one correction per projection.
pub fn fit_center_of_mass_no_offset(angles: &[f64], centroids: &[f64]) -> Result<Vec<f64>> {
    fit_sine_no_offset(angles, centroids)?.residuals(angles, centroids)
}

fn check_lengths(angles: &[f64], centroids: &[f64]) -> Result<()> {
    if angles.len() != centroids.len() {
        return Err(XrfAlignError::DimensionMismatch {
            expected: vec![angles.len()],
            found: vec![centroids.len()],
        });
    }
    Ok(())
}

/// Minimize `sum((model(p, x) - y)^2)` from `initial` within
/// `max_iterations` accepted steps.
///
/// `model` returns the predicted value and its gradient with respect to the
/// parameters.
fn levenberg_marquardt<const P: usize, F>(
    xs: &[f64],
    ys: &[f64],
    initial: [f64; P],
    max_iterations: usize,
    model: F,
) -> Result<[f64; P]>
where
    F: Fn(&[f64; P], f64) -> (f64, [f64; P]),
{
    if xs.len() < P {
        return Err(XrfAlignError::InsufficientData {
            needed: P,
            found: xs.len(),
        });
    }

    let mut params = initial;
    let mut normal = NormalEquations::build(xs, ys, &params, &model);
    let mut damping = 1e-3;
    if !normal.cost.is_finite() {
        return Err(XrfAlignError::FitFailure {
            params: params.to_vec(),
            iterations: 0,
        });
    }

    for iteration in 1..=max_iterations {
        if normal.cost == 0.0 {
            return Ok(params);
        }

        loop {
            let mut lhs = normal.jtj;
            let mut rhs = [0.0; P];
            for i in 0..P {
                lhs[i][i] += damping * normal.jtj[i][i].max(f64::EPSILON);
                rhs[i] = -normal.jtr[i];
            }

            let accepted = solve_linear(&lhs, &rhs).and_then(|step| {
                let mut candidate = params;
                for (c, s) in candidate.iter_mut().zip(&step) {
                    *c += s;
                }
                let trial = NormalEquations::build(xs, ys, &candidate, &model);
                (trial.cost.is_finite() && trial.cost < normal.cost)
                    .then_some((candidate, step, trial))
            });

            match accepted {
                Some((candidate, step, trial)) => {
                    let reduction = (normal.cost - trial.cost) / normal.cost;
                    let step_norm = norm(&step);
                    let param_norm = norm(&candidate);
                    params = candidate;
                    normal = trial;
                    damping = (damping / 10.0).max(1e-15);

                    if reduction <= SINE_FIT_FTOL
                        || step_norm <= SINE_FIT_XTOL * (param_norm + SINE_FIT_XTOL)
                    {
                        debug!(iteration, cost = normal.cost, "Sine fit converged");
                        return Ok(params);
                    }
                    break;
                }
                None => {
                    damping *= 10.0;
                    if damping > SINE_FIT_MAX_DAMPING {
                        // No step reduces the cost: stationary point.
                        debug!(iteration, cost = normal.cost, "Sine fit reached a stationary point");
                        return Ok(params);
                    }
                }
            }
        }

        if params.iter().any(|p| !p.is_finite()) {
            break;
        }
    }

    Err(XrfAlignError::FitFailure {
        params: params.to_vec(),
        iterations: max_iterations,
    })
}

/// `JᵀJ`, `Jᵀr` and the squared-residual cost at one parameter vector.
struct NormalEquations<const P: usize> {
    jtj: [[f64; P]; P],
    jtr: [f64; P],
    cost: f64,
}

impl<const P: usize> NormalEquations<P> {
    fn build<F>(xs: &[f64], ys: &[f64], params: &[f64; P], model: &F) -> Self
    where
        F: Fn(&[f64; P], f64) -> (f64, [f64; P]),
    {
        let mut jtj = [[0.0; P]; P];
        let mut jtr = [0.0; P];
        let mut cost = 0.0;

        for (&x, &y) in xs.iter().zip(ys) {
            let (value, grad) = model(params, x);
            let r = value - y;
            cost += r * r;
            for i in 0..P {
                jtr[i] += grad[i] * r;
                for j in 0..P {
                    jtj[i][j] += grad[i] * grad[j];
                }
            }
        }

        Self { jtj, jtr, cost }
    }
}

fn norm<const P: usize>(v: &[f64; P]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Solve `Ax = b` by Gaussian elimination with partial pivoting.
fn solve_linear<const N: usize>(a: &[[f64; N]; N], b: &[f64; N]) -> Option<[f64; N]> {
    let mut m = *a;
    let mut rhs = *b;

    for col in 0..N {
        let mut max_abs = m[col][col].abs();
        let mut max_row = col;
        for (row, r) in m.iter().enumerate().skip(col + 1) {
            if r[col].abs() > max_abs {
                max_abs = r[col].abs();
                max_row = row;
            }
        }
        if max_abs < 1e-300 || !max_abs.is_finite() {
            return None;
        }

        if max_row != col {
            m.swap(col, max_row);
            rhs.swap(col, max_row);
        }

        let pivot = m[col][col];
        for row in (col + 1)..N {
            let factor = m[row][col] / pivot;
            for j in col..N {
                m[row][j] -= factor * m[col][j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0; N];
    for i in (0..N).rev() {
        let mut sum = rhs[i];
        for j in (i + 1)..N {
            sum -= m[i][j] * x[j];
        }
        x[i] = sum / m[i][i];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_linear_known() {
        let a = [[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]];
        let b = [8.0, -11.0, -3.0];
        let x = solve_linear(&a, &b).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
        assert!((x[2] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_solve_linear_singular() {
        let a = [[1.0, 2.0], [2.0, 4.0]];
        assert!(solve_linear(&a, &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_iteration_limit_reports_fit_failure() {
        let angles: Vec<f64> = (0..36).map(|i| i as f64 * 10.0).collect();
        let centroids: Vec<f64> = angles
            .iter()
            .map(|&t| 20.0 * (DEG * (t - 30.0)).sin() + 50.0)
            .collect();
        let result = levenberg_marquardt(&angles, &centroids, [100.0; 3], 1, |p, theta| {
            let (sin, cos) = (DEG * (theta - p[1])).sin_cos();
            (p[0] * sin + p[2], [sin, -p[0] * DEG * cos, 1.0])
        });
        match result {
            Err(XrfAlignError::FitFailure { params, iterations }) => {
                assert_eq!(iterations, 1);
                assert_eq!(params.len(), 3);
                assert!(params.iter().all(|p| p.is_finite()));
            }
            other => panic!("expected FitFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_normalization_keeps_curve() {
        let raw = SineFit {
            amplitude: -20.0,
            phase: 30.0,
            offset: 5.0,
        };
        let fit = SineFit::normalized(raw.amplitude, raw.phase, raw.offset);
        assert!(fit.amplitude > 0.0);
        assert!((0.0..360.0).contains(&fit.phase));
        for theta in [0.0, 45.0, 123.0, 270.0] {
            assert!((fit.evaluate(theta) - raw.evaluate(theta)).abs() < 1e-9);
        }
    }
}
