//! Terminal styling
//!
//! Output goes through `anstream`, which drops the escape codes when the
//! stream is not a terminal.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Styling helpers for anything printable
pub trait Stylize: Display + Sized {
    /// Bold, for names the user should notice
    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    /// Yellow, for things that need attention
    fn warning(&self) -> String {
        self.yellow().to_string()
    }
}

impl<T: Display> Stylize for T {}

/// Green check mark
pub fn check() -> String {
    "✓".green().to_string()
}
