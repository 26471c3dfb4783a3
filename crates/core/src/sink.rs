//! Output sink abstraction
//!
//! Every widget writes through an [`OutputSink`] instead of touching stdout
//! directly, so tests can capture output deterministically.

use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};
use crossterm::Command;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Writable destination for rendered text
pub trait OutputSink: Send + Sync {
    /// Write a chunk of already-formatted text
    fn write_str(&self, text: &str) -> io::Result<()>;
}

/// Sequence that erases the display and homes the cursor
pub fn clear_screen() -> String {
    let mut seq = String::new();
    // fmt::Write into a String never fails
    let _ = Clear(ClearType::All).write_ansi(&mut seq);
    let _ = MoveTo(0, 0).write_ansi(&mut seq);
    seq
}

/// Prefix for rewriting the current line in place
pub const CARRIAGE_RETURN: &str = "\r";

/// Process stdout, flushed after every write
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_str(&self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }
}

/// In-memory sink that records each write separately
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    writes: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All writes in arrival order
    pub fn writes(&self) -> Vec<String> {
        self.guard().clone()
    }

    /// Most recent write
    pub fn last(&self) -> Option<String> {
        self.guard().last().cloned()
    }

    /// Number of writes recorded
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Concatenation of every write
    pub fn contents(&self) -> String {
        self.guard().concat()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.guard().clear();
    }
}

impl OutputSink for MemorySink {
    fn write_str(&self, text: &str) -> io::Result<()> {
        self.guard().push(text.to_string());
        Ok(())
    }
}
