//! Console notification surface

use aiadapter_common::{Notifier, ProgressNotice};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Prints notices to stderr and shows progress as spinners
#[derive(Clone, Default)]
pub struct ConsoleNotifier {
    bars: MultiProgress,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

struct ConsoleProgress {
    bar: ProgressBar,
}

impl ProgressNotice for ConsoleProgress {
    fn set_message(&mut self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn hide(self: Box<Self>) {
        self.bar.finish_and_clear();
    }
}

impl Notifier for ConsoleNotifier {
    fn notice(&self, message: &str) {
        self.bars.suspend(|| eprintln!("{}", message));
    }

    fn progress(&self, message: &str) -> Box<dyn ProgressNotice> {
        let bar = self.bars.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Box::new(ConsoleProgress { bar })
    }
}
