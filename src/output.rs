use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::analytics::time::time_ago;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    /// One line per record
    Compact,
}

/// How command results are written to stdout. Passed to every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }

    /// Print a table, JSON array, or one compact line per item
    pub fn print_table<T, R, F, C>(&self, items: &[T], to_row: F, compact: C)
    where
        T: Serialize,
        R: Tabled,
        F: Fn(&T) -> R,
        C: Fn(&T) -> String,
    {
        match self.format {
            OutputFormat::Json => self.print_json(items),
            OutputFormat::Compact => {
                for item in items {
                    println!("{}", compact(item));
                }
            }
            OutputFormat::Table => {
                if items.is_empty() {
                    self.print_message("Nothing to show.");
                    return;
                }
                println!("{}", table(items.iter().map(to_row)));
            }
        }
    }

    /// Print a single item or JSON depending on output mode
    pub fn print_item<T: Serialize>(&self, item: &T, display: impl FnOnce(&T)) {
        if self.is_json() {
            self.print_json(item);
        } else {
            display(item);
        }
    }

    /// Print a status message. Suppressed by `--quiet`; JSON mode wraps it.
    pub fn print_message(&self, message: &str) {
        if self.is_json() {
            self.print_json(&serde_json::json!({ "message": message }));
        } else if !self.quiet {
            println!("{message}");
        }
    }
}

/// Render rows with the rounded table style used throughout the CLI.
pub fn table<R: Tabled>(rows: impl IntoIterator<Item = R>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => DateTime::<Local>::from(at).format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

pub fn format_date_only(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string())
}

/// "5m ago" style label, falling back to the date after a month.
pub fn format_relative(at: DateTime<Utc>) -> String {
    let now = Utc::now();
    if now.signed_duration_since(at).num_days() < 30 {
        time_ago(at, now)
    } else {
        format_date_only(Some(at))
    }
}

/// Truncate a string with ellipsis
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Login page crashes on submit", 12), "Login pag...");
        assert_eq!(truncate("Überprüfung fehlgeschlagen", 8), "Überp...");
    }

    #[test]
    fn missing_dates_render_as_dash() {
        assert_eq!(format_date(None), "-");
        assert_eq!(format_date_only(None), "-");
    }

    #[test]
    fn old_timestamps_fall_back_to_dates() {
        let at = chrono::TimeZone::with_ymd_and_hms(&Utc, 2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_relative(at), "2020-01-02");
    }
}
