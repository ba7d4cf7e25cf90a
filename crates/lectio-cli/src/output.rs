//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use lectio_core::{ContentStats, Reading};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single reading in full
    pub fn print_reading(&self, reading: &Reading) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:         {}", reading.id);
                println!("Date:       {}", reading.date);
                println!("Title:      {}", reading.title);
                println!("Type:       {}", reading.reading_type);
                if !reading.reference.is_empty() {
                    println!("Reference:  {}", reading.reference);
                }
                println!("Difficulty: {}/5", reading.difficulty);
                println!("Language:   {}", reading.language);
                println!("Words:      {}", reading.word_count);
                if reading.is_favorite {
                    println!("Favorite:   yes");
                }
                println!();
                println!("{}", reading.content);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(reading).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", reading.id);
            }
        }
    }

    /// Print a list of readings as summary rows
    pub fn print_readings(&self, readings: &[Reading]) {
        match self.format {
            OutputFormat::Human => {
                if readings.is_empty() {
                    println!("No readings found.");
                    return;
                }
                for reading in readings {
                    let star = if reading.is_favorite { " *" } else { "" };
                    println!(
                        "{} | {} | {}{} | {}",
                        short_id(&reading.id),
                        reading.date,
                        truncate(&reading.title, 35),
                        star,
                        reading.reading_type
                    );
                }
                println!("\n{} reading(s)", readings.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(readings).unwrap());
            }
            OutputFormat::Quiet => {
                for reading in readings {
                    println!("{}", reading.id);
                }
            }
        }
    }

    /// Print catalog statistics
    pub fn print_stats(&self, stats: &ContentStats) {
        match self.format {
            OutputFormat::Human => {
                println!("Catalog");
                println!("=======");
                println!("Readings:   {}", stats.total_readings);
                println!("Favorites:  {}", stats.total_favorites);
                println!("Languages:  {}", stats.languages.join(", "));
                if let (Some(from), Some(to)) = (&stats.earliest_date, &stats.latest_date) {
                    println!("Dates:      {} to {}", from, to);
                }
                println!("Difficulty: {:.1} average", stats.average_difficulty);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(stats).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", stats.total_readings);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// First 8 characters of an id; ids are user-supplied and may be non-ASCII
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abcdef0123456789"), "abcdef01");
        assert_eq!(short_id("abc"), "abc");
        // Multi-byte ids must not split a character
        assert_eq!(short_id("évangile-selon-jean"), "évangile");
    }
}
