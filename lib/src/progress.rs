//! A single-line progress bar drawn to stderr.
//!
//! The bar looks like `[write] [████████░░░░░░░░] 42/100` and is redrawn in
//! place. It stays hidden when stderr isn't a terminal.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use colored::Colorize;
use parking_lot::Mutex;

const BAR_WIDTH: usize = 32;
const FILLED: &str = "█";
const EMPTY: &str = "░";

#[derive(Debug)]
pub struct Progress {
    label: &'static str,
    total: usize,
    current: AtomicUsize,
    visible: bool,
    lock: Mutex<()>,
}

impl Progress {
    /// A bar counting up to `total`, drawn only if `enabled` and stderr is a
    /// terminal.
    pub fn new(label: &'static str, total: usize, enabled: bool) -> Self {
        let visible = enabled && total > 0 && io::stderr().is_terminal();
        Progress { label, total, current: AtomicUsize::new(0), visible, lock: Mutex::new(()) }
    }

    /// A bar that counts but never draws.
    pub fn hidden(total: usize) -> Self {
        Progress::new("", total, false)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Advances the bar by one and redraws it. Returns the new position.
    pub fn inc(&self) -> usize {
        let current = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        if self.visible {
            self.draw(current);
        }

        current
    }

    /// Clears the bar from the terminal.
    pub fn finish(&self) {
        if self.visible {
            let _guard = self.lock.lock();
            let mut stderr = io::stderr().lock();
            write!(stderr, "\r\x1b[2K").ok();
            stderr.flush().ok();
        }
    }

    fn draw(&self, current: usize) {
        let _guard = self.lock.lock();
        let prefix = format!("[{}]", self.label).bright_cyan().bold();
        let mut stderr = io::stderr().lock();
        write!(stderr, "\r{prefix} [{}] {current}/{}", bar(current, self.total, BAR_WIDTH), self.total).ok();
        stderr.flush().ok();
    }
}

/// The bar itself: `width` cells, the first `current / total` of them full.
fn bar(current: usize, total: usize, width: usize) -> String {
    let filled = match total {
        0 => width,
        _ => (current.min(total) * width) / total,
    };

    FILLED.repeat(filled) + &EMPTY.repeat(width - filled)
}
