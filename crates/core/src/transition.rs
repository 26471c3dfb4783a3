//! Text transition engine
//!
//! Pure functions combining the previously displayed content with new
//! content into what is actually shown. Widths and offsets count `char`s.
//!
//! `Fade` and `Smooth` are identity transitions over text: no character
//! blending is performed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::frame::split_lines;
use crate::RenderError;

/// Transition applied when a frame's content changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    #[default]
    None,
    Fade,
    Smooth,
    Slide,
    Wipe,
}

impl TransitionKind {
    /// Whether the transition shows the new content verbatim
    pub fn is_identity(self) -> bool {
        matches!(self, Self::None | Self::Fade | Self::Smooth)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fade => "fade",
            Self::Smooth => "smooth",
            Self::Slide => "slide",
            Self::Wipe => "wipe",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionKind {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "fade" => Ok(Self::Fade),
            "smooth" => Ok(Self::Smooth),
            "slide" => Ok(Self::Slide),
            "wipe" => Ok(Self::Wipe),
            other => Err(RenderError::InvalidValue(format!(
                "unknown transition '{}'",
                other
            ))),
        }
    }
}

/// Compute the displayed content for `kind`
pub fn apply(kind: TransitionKind, old: &str, new: &str, width: usize) -> String {
    match kind {
        TransitionKind::None | TransitionKind::Fade | TransitionKind::Smooth => new.to_string(),
        TransitionKind::Slide => slide(old, new, width),
        TransitionKind::Wipe => wipe(old, new),
    }
}

/// Shift old lines left by a quarter of the width and bring new lines in
/// behind a quarter-width gap, truncating every line to `width`.
pub fn slide(old: &str, new: &str, width: usize) -> String {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let rows = old_lines.len().max(new_lines.len());
    let shift = width / 4;
    let gap = " ".repeat(shift);

    (0..rows)
        .map(|i| {
            let old_line = old_lines.get(i).copied().unwrap_or("");
            let new_line = new_lines.get(i).copied().unwrap_or("");
            old_line
                .chars()
                .skip(shift)
                .chain(gap.chars())
                .chain(new_line.chars())
                .take(width)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reveal the top third (rounded up) of the new content over the old lines
/// below it.
pub fn wipe(old: &str, new: &str) -> String {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let revealed = new_lines.len().div_ceil(3);

    new_lines
        .iter()
        .take(revealed)
        .chain(old_lines.iter().skip(revealed))
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}
