//! Operator-facing console output with ANSI colors.

use std::fmt::Display;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterColor {
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
    Dim,
    BoldRed,
    BoldGreen,
    BoldCyan,
}

impl PrinterColor {
    fn ansi_code(&self) -> &'static str {
        match self {
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Blue => "\x1b[34m",
            Self::Cyan => "\x1b[36m",
            Self::Dim => "\x1b[2m",
            Self::BoldRed => "\x1b[1;31m",
            Self::BoldGreen => "\x1b[1;32m",
            Self::BoldCyan => "\x1b[1;36m",
        }
    }
}

const RESET: &str = "\x1b[0m";

pub struct ColoredText {
    pub text: String,
    pub color: PrinterColor,
}

impl ColoredText {
    pub fn new(text: impl Into<String>, color: PrinterColor) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Console printer. Colors are skipped when `NO_COLOR` is set.
#[derive(Debug, Clone)]
pub struct Printer {
    color: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    pub fn new() -> Self {
        Self {
            color: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn paint(&self, content: &str, color: PrinterColor) -> String {
        if self.color {
            format!("{}{}{}", color.ansi_code(), content, RESET)
        } else {
            content.to_string()
        }
    }

    pub fn print(&self, content: &str, color: PrinterColor) {
        println!("{}", self.paint(content, color));
    }

    /// Print several colored segments on one line.
    pub fn print_colored(&self, segments: &[ColoredText]) {
        let line: String = segments
            .iter()
            .map(|segment| self.paint(&segment.text, segment.color))
            .collect();
        println!("{}", line);
    }

    pub fn heading(&self, title: &str) {
        self.print(title, PrinterColor::BoldCyan);
    }

    pub fn success(&self, message: impl Display) {
        self.print(&format!("✓ {}", message), PrinterColor::Green);
    }

    pub fn info(&self, message: impl Display) {
        self.print(&message.to_string(), PrinterColor::Blue);
    }

    pub fn warn(&self, message: impl Display) {
        self.print(&format!("! {}", message), PrinterColor::Yellow);
    }

    /// Errors go to stderr.
    pub fn error(&self, message: impl Display) {
        eprintln!("{}", self.paint(&message.to_string(), PrinterColor::BoldRed));
    }

    /// `label: value` with the label dimmed.
    pub fn field(&self, label: &str, value: impl Display) {
        self.print_colored(&[
            ColoredText::new(format!("  {}: ", label), PrinterColor::Dim),
            ColoredText::new(value.to_string(), PrinterColor::Cyan),
        ]);
    }

    pub fn json<T: Serialize>(&self, value: &T) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_wraps_in_ansi_codes() {
        let printer = Printer { color: true };
        assert_eq!(printer.paint("ok", PrinterColor::Green), "\x1b[32mok\x1b[0m");
    }

    #[test]
    fn test_plain_printer_leaves_text_alone() {
        assert_eq!(Printer::plain().paint("ok", PrinterColor::Red), "ok");
    }
}
