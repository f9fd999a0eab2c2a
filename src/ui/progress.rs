use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::icons::{CHECK, CROSS};

/// Spinner shown while an AI artifact is generated.
///
/// The caller drives the text with `set_message` from the card's rotating
/// loading message; the spinner itself only animates.
pub struct GenerationSpinner {
    bar: ProgressBar,
}

impl GenerationSpinner {
    pub fn new(initial: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} {elapsed:.dim}")
                .expect("progress bar template is a valid static string"),
        );
        bar.set_message(initial.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn finish_ok(&self, message: &str) {
        self.bar
            .finish_with_message(format!("{}{}", CHECK, style(message).green()));
    }

    pub fn finish_err(&self, message: &str) {
        self.bar
            .finish_with_message(format!("{}{}", CROSS, style(message).red()));
    }
}
