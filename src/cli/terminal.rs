//! Terminal styling for the run summary

use owo_colors::{OwoColorize, colors::css};

/// Below this width the summary drops the digest column.
const NARROW_COLUMNS: u16 = 60;

/// How a line of the run summary should be emphasised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// The artifact was written.
    Done,
    /// The artifact was skipped but the run continued.
    Skipped,
    /// Secondary detail such as digests and remediation steps.
    Detail,
}

fn color_enabled() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Whether the summary should use its compact layout.
///
/// Output that is not a terminal (a pipe or a file) gets the full layout.
pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < NARROW_COLUMNS)
}

/// Style `text` for the given tone, or return it unchanged when colour is off.
pub fn paint(text: &str, tone: Tone) -> String {
    if !color_enabled() {
        return text.to_string();
    }
    match tone {
        Tone::Done => text.fg::<css::Green>().to_string(),
        Tone::Skipped => text.fg::<css::Orange>().to_string(),
        Tone::Detail => text.dimmed().to_string(),
    }
}
