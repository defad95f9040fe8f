use crate::writer::WriteEntry;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_write_progress(&self, total_files: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(total_files));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} files {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message("Writing files...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if self.enabled {
            self.multi_progress.suspend(f)
        } else {
            f()
        }
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}

pub fn update_write_progress(pb: &ProgressBar, entry: &WriteEntry) {
    pb.inc(1);
    pb.set_message(entry.path.clone());
}

pub fn finish_progress_with_summary(pb: &ProgressBar, summary: &str) {
    pb.finish_and_clear();
    tracing::debug!(elapsed = ?pb.elapsed(), "{}", summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::WriteOutcome;

    #[test]
    fn test_disabled_manager_hides_bars() {
        let manager = ProgressManager::new(false);

        let pb = manager.create_write_progress(3);
        assert!(pb.is_hidden());
        assert_eq!(manager.suspend(|| 7), 7);
    }

    #[test]
    fn test_update_write_progress() {
        let pb = ProgressBar::hidden();
        pb.set_length(2);
        let entry = WriteEntry {
            path: "src/main.rs".to_string(),
            resolved_path: None,
            outcome: WriteOutcome::Created,
        };

        update_write_progress(&pb, &entry);
        assert_eq!(pb.position(), 1);
        assert_eq!(pb.message(), "src/main.rs");
    }
}
