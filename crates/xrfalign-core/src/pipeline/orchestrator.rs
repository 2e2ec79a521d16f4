use tracing::info;

use crate::error::Result;
use crate::io::alignment_file::save_alignment_file;
use crate::io::image_stack::load_image_stack;
use crate::io::theta_file::load_theta_file;
use crate::session::AlignmentSession;

use super::config::{AlignmentConfig, AlignmentPass, PipelineConfig};
use super::types::{AlignmentReport, AlignmentStage, NoOpReporter, PassSummary, ProgressReporter};

/// Apply the configured passes to a session, in order.
///
/// Each pass is committed to the session history on its own, so a failing
/// pass leaves the earlier passes applied and can be undone step by step.
pub fn run_alignment(
    session: &mut AlignmentSession,
    config: &AlignmentConfig,
    reporter: &dyn ProgressReporter,
) -> Result<AlignmentReport> {
    let mut report = AlignmentReport::default();
    let channel = config.reference_channel;
    session.stack().check_channel(channel)?;

    if config.sort_by_angle {
        reporter.begin_stage(AlignmentStage::Sorting, None);
        report.sorted = session.sort_by_angle()?;
        reporter.finish_stage();
    }

    let n = session.stack().projections();
    for (i, pass) in config.passes.iter().enumerate() {
        info!(pass = i + 1, method = %pass, "Running alignment pass");

        let rotation_center = match pass {
            AlignmentPass::CenterOfMass { model, rows } => {
                reporter.begin_stage(AlignmentStage::CenterOfMass, Some(n));
                let rows = rows.map(|[start, end]| start..end);
                session.align_center_of_mass_with_progress(
                    channel,
                    *model,
                    rows,
                    |done| reporter.advance(done),
                )?;
                reporter.finish_stage();
                session.rotation_center()
            }
            _ => {
                // Every non-centroid pass carries a registration method.
                let Some((method, apodize_sigma)) = pass.registration() else {
                    continue;
                };
                reporter.begin_stage(AlignmentStage::Registration, Some(n));
                session.align_sequential_with_progress(
                    channel,
                    method,
                    apodize_sigma,
                    |done| reporter.advance(done),
                )?;
                reporter.finish_stage();
                None
            }
        };

        let max_shift = session.shifts().max_abs();
        info!(
            pass = i + 1,
            max_x = max_shift.0,
            max_y = max_shift.1,
            "Alignment pass complete"
        );
        report.passes.push(PassSummary {
            method: pass.to_string(),
            max_shift,
            rotation_center,
        });
    }

    Ok(report)
}

/// Load the stack and angles named by `config`, align, and write the
/// alignment file.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<(AlignmentSession, AlignmentReport)> {
    let loaded = load_image_stack(&config.input)?;
    let thetas = load_theta_file(&config.thetas)?;
    info!(
        angles = thetas.len(),
        with_filenames = thetas.has_filenames(),
        "Read theta file"
    );

    let mut session = AlignmentSession::from_loaded(loaded, &thetas)?;
    let report = run_alignment(&mut session, &config.alignment, reporter)?;

    save_alignment_file(&session.alignment_table()?, &config.output)?;
    info!(path = %config.output.display(), "Wrote alignment file");

    Ok((session, report))
}

/// Run the full pipeline without progress reporting.
pub fn run_pipeline(config: &PipelineConfig) -> Result<(AlignmentSession, AlignmentReport)> {
    run_pipeline_reported(config, &NoOpReporter)
}
