//! Terminal viewport size collaborator

/// Visible terminal area in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
        }
    }
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Query the probe once, falling back to 80x24 when it has no answer
    pub fn detect(probe: &dyn ViewportProbe) -> Self {
        match probe.query() {
            Some(viewport) => viewport,
            None => {
                let fallback = Self::default();
                tracing::debug!(
                    "Terminal size unavailable, using {}x{}",
                    fallback.width,
                    fallback.height
                );
                fallback
            }
        }
    }
}

/// Terminal-size query service
pub trait ViewportProbe: Send + Sync {
    /// Current size, or `None` when the output is not a terminal
    fn query(&self) -> Option<Viewport>;
}

/// Probe backed by the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalProbe;

impl ViewportProbe for TerminalProbe {
    fn query(&self) -> Option<Viewport> {
        crossterm::terminal::size()
            .ok()
            .map(|(cols, rows)| Viewport::new(cols, rows))
    }
}

/// Probe with a predetermined answer
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedProbe(pub Option<Viewport>);

impl ViewportProbe for FixedProbe {
    fn query(&self) -> Option<Viewport> {
        self.0
    }
}
