//! Formatting utilities for CLI output.
//!
//! Provides consistent formatting for modem state values and styled help
//! text for CLI commands.

use std::fmt::Display;

/// ANSI color codes for terminal output
pub struct Colors;

impl Colors {
    /// Reset all formatting
    pub const RESET: &'static str = "\x1b[0m";
    /// Bold text
    pub const BOLD: &'static str = "\x1b[1m";
    /// Dim text
    pub const DIM: &'static str = "\x1b[2m";

    /// Red color
    pub const RED: &'static str = "\x1b[31m";
    /// Green color
    pub const GREEN: &'static str = "\x1b[32m";
    /// Yellow color
    pub const YELLOW: &'static str = "\x1b[33m";
    /// Blue color
    pub const BLUE: &'static str = "\x1b[34m";
    /// Cyan color
    pub const CYAN: &'static str = "\x1b[36m";
}

/// Formats section headers with styling
pub fn format_header(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::CYAN, text, Colors::RESET)
}

/// Formats subheaders with styling
pub fn format_subheader(text: &str) -> String {
    format!(
        "{}{}{}{}",
        Colors::BOLD,
        Colors::YELLOW,
        text,
        Colors::RESET
    )
}

/// Formats command names with styling
pub fn format_command(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::GREEN, text, Colors::RESET)
}

/// Formats category names with styling
pub fn format_category(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::BLUE, text, Colors::RESET)
}

/// Formats descriptions with muted styling
pub fn format_description(text: &str) -> String {
    format!("{}{}{}", Colors::DIM, text, Colors::RESET)
}

/// Formats usage examples with styling
pub fn format_usage(text: &str) -> String {
    format!("{}{}{}", Colors::DIM, text, Colors::RESET)
}

/// Formats error messages with red styling
pub fn format_error(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::RED, text, Colors::RESET)
}

/// Formats a boolean as `on` or `off`.
///
/// # Examples
///
/// ```
/// use connui_cellular::cli::formatting::format_switch;
///
/// assert_eq!(format_switch(true), "on");
/// assert_eq!(format_switch(false), "off");
/// ```
pub fn format_switch(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Formats one `label: value` line of a state listing.
///
/// Labels are padded so that values line up; empty values print as `-`.
///
/// # Examples
///
/// ```
/// use connui_cellular::cli::formatting::format_field;
///
/// assert_eq!(format_field("Model", ""), "  Model          -");
/// ```
pub fn format_field(label: &str, value: impl Display) -> String {
    let value = value.to_string();
    let value = if value.is_empty() { "-" } else { value.as_str() };
    format!("  {:<15}{}", label, value)
}

/// Formats signal bars (0 to 5) as a gauge.
///
/// # Examples
///
/// ```
/// use connui_cellular::cli::formatting::format_bars;
///
/// assert_eq!(format_bars(3), "▮▮▮▯▯");
/// ```
pub fn format_bars(bars: u8) -> String {
    const MAX_BARS: u8 = 5;

    let filled = bars.min(MAX_BARS);
    (0..MAX_BARS)
        .map(|bar| if bar < filled { '▮' } else { '▯' })
        .collect()
}
