//! Output rendering abstraction for ringside.
//!
//! The conversation loop never prints; it hands frames to a [`Renderer`].
//! A frame is the whole partial reply as it should currently look, so a
//! renderer either extends what is already on screen or redraws it.

use colored::Colorize;
use std::io::{self, Write};

use crate::constants::CURSOR;

pub trait Renderer {
    /// Show the reply-so-far. Called after every streamed fragment.
    fn render_frame(&mut self, frame: &str);

    /// Replace the last frame with the finished reply.
    fn render_done(&mut self, final_frame: &str);

    /// Show a lookup's raw result (function-call display mode only).
    fn render_function_result(&mut self, name: &str, result: &str);

    fn render_warning(&mut self, msg: &str);

    /// Called when a turn fails.
    fn render_error(&mut self, err: &str);
}

/// Renders frames to stdout, appending in place while a frame only grows
/// and erasing and redrawing when it changes shape.
#[derive(Debug, Default)]
pub struct StdoutRenderer {
    /// What is currently on screen for this reply, cursor included.
    drawn: String,
}

impl StdoutRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the cursor back to where the current frame began and clears
    /// everything below it.
    fn erase(&mut self) {
        if self.drawn.is_empty() {
            return;
        }
        let up = visual_line_count(&self.drawn, terminal_width()).saturating_sub(1);
        if up > 0 {
            print!("\x1b[{}A", up);
        }
        print!("\r\x1b[J");
        self.drawn.clear();
    }

    /// The on-screen text without its trailing cursor, if it has one.
    fn drawn_text(&self) -> Option<&str> {
        self.drawn.strip_suffix(CURSOR)
    }
}

impl Renderer for StdoutRenderer {
    fn render_frame(&mut self, frame: &str) {
        let appended = match (self.drawn_text(), frame.strip_suffix(CURSOR)) {
            (Some(old), Some(new)) if new.starts_with(old) => {
                Some(new[old.len()..].to_string())
            }
            _ => None,
        };

        match appended {
            Some(suffix) => {
                // Step back over the cursor and keep writing.
                print!("\x08{}{}", suffix, CURSOR);
            }
            None => {
                self.erase();
                print!("{}", frame);
            }
        }
        self.drawn = frame.to_string();
        io::stdout().flush().ok();
    }

    fn render_done(&mut self, final_frame: &str) {
        if self.drawn_text() == Some(final_frame) {
            print!("\x08 \x08");
        } else {
            self.erase();
            print!("{}", final_frame);
        }
        println!();
        println!();
        self.drawn.clear();
        io::stdout().flush().ok();
    }

    fn render_function_result(&mut self, name: &str, result: &str) {
        println!("{}", format!("[{} result]", name).dimmed());
        println!("{}", result);
        println!();
    }

    fn render_warning(&mut self, msg: &str) {
        eprintln!("{} {}", "warning:".yellow().bold(), msg);
    }

    fn render_error(&mut self, err: &str) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), err);
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
        .max(1) // prevent division by zero
}

/// Number of terminal rows `text` occupies at `width` columns, counting
/// wrapped lines.
pub fn visual_line_count(text: &str, width: usize) -> usize {
    let width = width.max(1);
    text.split('\n')
        .map(|line| {
            let len = line.chars().count();
            if len == 0 {
                1
            } else {
                len.div_ceil(width)
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visual_line_count_wraps() {
        assert_eq!(visual_line_count("", 80), 1);
        assert_eq!(visual_line_count("hello", 80), 1);
        assert_eq!(visual_line_count(&"x".repeat(81), 80), 2);
        assert_eq!(visual_line_count("a\n\nb", 80), 3);
        assert_eq!(visual_line_count("Just a sec 🔍▌", 5), 3);
    }
}
