use crate::ui::icons::{CHECK, CROSS};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while the model request is in flight.
///
/// `indicatif` draws to stderr and hides itself when stderr is not a terminal,
/// so piped runs stay clean.
pub struct RequestSpinner {
    bar: ProgressBar,
}

impl RequestSpinner {
    pub fn start(message: impl Into<String>) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner} {msg} {elapsed:.dim}")
            .expect("progress bar template is a valid static string");

        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style);
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn succeed(self, message: impl AsRef<str>) {
        self.bar
            .finish_with_message(format!("{}{}", CHECK, style(message.as_ref()).green()));
    }

    pub fn fail(self, message: impl AsRef<str>) {
        self.bar
            .finish_with_message(format!("{}{}", CROSS, style(message.as_ref()).red()));
    }
}
