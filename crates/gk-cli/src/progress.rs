use std::fmt::Display;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::ui;

/// How a single key pair came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairMark {
    Done,
    Skipped,
    Failed,
}

/// A stderr spinner for a key operation, or nothing when progress is off.
///
/// Pair outcomes are printed above the spinner as they are reported; the
/// spinner itself ends on a tally such as `Rotated 2/3 pair(s)`.
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    #[must_use]
    pub fn spinner(message: &str) -> Self {
        if !ui::prefs().progress {
            return Self::hidden();
        }

        let bar = ProgressBar::new_spinner()
            .with_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            )
            .with_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar: Some(bar) }
    }

    const fn hidden() -> Self {
        Self { bar: None }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Print one pair's outcome above the spinner.
    pub fn pair(&self, mark: PairMark, pair: &impl Display, detail: &str) {
        if let Some(bar) = &self.bar {
            bar.println(pair_line(mark, pair, detail));
        }
    }

    pub fn finish_ok(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    pub fn finish_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn finish_err(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(message.to_string());
        }
    }
}

fn pair_line(mark: PairMark, pair: &impl Display, detail: &str) -> String {
    let tag = match mark {
        PairMark::Done => "ok",
        PairMark::Skipped => "skip",
        PairMark::Failed => "FAIL",
    };
    if detail.is_empty() {
        format!("  {tag:<4}  {pair}")
    } else {
        format!("  {tag:<4}  {pair}  {detail}")
    }
}

/// `Rotated 2/3 pair(s)`.
#[must_use]
pub fn tally(verb: &str, done: usize, total: usize) -> String {
    format!("{verb} {done}/{total} pair(s)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pair_lines_align_on_the_tag() {
        assert_eq!(
            pair_line(PairMark::Done, &"work/github/octo", "SHA256:abc"),
            "  ok    work/github/octo  SHA256:abc"
        );
        assert_eq!(
            pair_line(PairMark::Failed, &"work/gitlab/dev", "token missing"),
            "  FAIL  work/gitlab/dev  token missing"
        );
        assert_eq!(
            pair_line(PairMark::Skipped, &"home/github/octo", ""),
            "  skip  home/github/octo"
        );
    }

    #[test]
    fn tally_counts_pairs() {
        assert_eq!(tally("Revoked", 1, 2), "Revoked 1/2 pair(s)");
    }

    #[test]
    fn hidden_progress_ignores_every_call() {
        let progress = Progress::hidden();
        progress.set_message("Rotating keys");
        progress.pair(PairMark::Done, &"work/github/octo", "SHA256:abc");
        progress.finish_err("Rotation failed");
        assert!(progress.bar.is_none());
    }
}
