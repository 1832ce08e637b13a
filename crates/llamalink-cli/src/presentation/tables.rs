//! Table formatting utilities for CLI output.

/// Truncates a string to at most `max_len` characters, ending in "..." if cut.
///
/// ```rust
/// use llamalink_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("qwen3", 10), "qwen3");
/// assert_eq!(truncate_string("gemma-3-27b-it", 8), "gemma...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Format an optional value for table display, returning a default if None.
pub fn format_optional<T: std::fmt::Display>(value: Option<&T>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), ToString::to_string)
}
