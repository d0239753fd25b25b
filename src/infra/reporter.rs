//! Console implementation of the `ProgressReporter` port.

use console::Term;
use owo_colors::{OwoColorize as _, Style};

use crate::application::ports::ProgressReporter;

/// Colours used for the three kinds of progress line.
#[derive(Default, Clone, Copy)]
struct Palette {
    step: Style,
    success: Style,
    warning: Style,
}

impl Palette {
    fn colorize(&mut self) {
        self.step = Style::new().dimmed();
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
    }
}

/// Writes progress to the terminal.
///
/// Command echoes and status listings go to stdout as they happen, so a
/// long wait shows each poll. Warnings (suppressed connection errors,
/// stderr of failed commands) go to stderr.
pub struct ConsoleReporter {
    palette: Palette,
    colored: bool,
}

impl ConsoleReporter {
    /// Colours are used only when stdout is a terminal, `no_color` is
    /// false and `NO_COLOR` is unset.
    #[must_use]
    pub fn new(no_color: bool) -> Self {
        let colored =
            !no_color && Term::stdout().is_term() && std::env::var_os("NO_COLOR").is_none();
        let mut palette = Palette::default();
        if colored {
            palette.colorize();
        }
        Self { palette, colored }
    }

    /// Whether this reporter emits ANSI styling.
    #[must_use]
    pub fn is_colored(&self) -> bool {
        self.colored
    }
}

impl ProgressReporter for ConsoleReporter {
    fn step(&self, message: &str) {
        println!("{}", message.style(self.palette.step));
    }

    fn success(&self, message: &str) {
        println!("{}", message.style(self.palette.success));
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", message.style(self.palette.warning));
    }
}
