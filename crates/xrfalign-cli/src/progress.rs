use std::cell::RefCell;

use indicatif::{ProgressBar, ProgressStyle};
use xrfalign_core::pipeline::{AlignmentStage, ProgressReporter};

/// Drives one indicatif bar per alignment stage.
#[derive(Default)]
pub struct BarReporter {
    bar: RefCell<Option<ProgressBar>>,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: AlignmentStage, total_items: Option<usize>) {
        let bar = match total_items {
            Some(total) => {
                let bar = ProgressBar::new(total as u64);
                if let Ok(style) =
                    ProgressStyle::default_bar().template("{msg:26} [{bar:40}] {pos}/{len}")
                {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        bar.set_message(stage.to_string());
        *self.bar.borrow_mut() = Some(bar);
    }

    fn advance(&self, items_done: usize) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.set_position(items_done as u64);
        }
    }

    fn finish_stage(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish();
        }
    }
}
