//! Progress bar display for batch packaging

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for `package-all`
pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    /// Create a progress display for `total` components
    pub fn new(total: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_or_else(|_| ProgressStyle::default_bar(), |style| style.progress_chars("#>-"));

        let bar = ProgressBar::new(total);
        bar.set_style(style);
        Self { bar }
    }

    /// Record a finished component
    pub fn component_done(&self, name: &str) {
        self.bar.set_message(truncate(name, 50));
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Truncate long names from the left for display
fn truncate(name: &str, max: usize) -> String {
    let count = name.chars().count();
    if count <= max {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max - 3)).collect();
    format!("...{tail}")
}
