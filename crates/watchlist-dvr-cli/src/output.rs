use clap::ValueEnum;
use comfy_table::{Cell, Color, Table};
use dvr_sync_models::WatchlistReport;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

/// Serialize for stdout. Pretty output is indented with four spaces.
pub fn to_json_string<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if !pretty {
        return serde_json::to_string(value);
    }
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn flag(value: bool) -> Cell {
    if value {
        Cell::new("✓").fg(Color::Green)
    } else {
        Cell::new("✗").fg(Color::Red)
    }
}

pub fn report_table(report: &WatchlistReport) -> Table {
    let with_errors = report.failed_count() > 0;

    let mut header = vec!["Title", "Year", "In library", "Scheduled", "Scheduled at", "New"];
    if with_errors {
        header.push("Error");
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(header);

    for result in &report.watchlist {
        let mut row = vec![
            Cell::new(&result.title),
            Cell::new(result.year.map(|y| y.to_string()).unwrap_or_default()),
            flag(result.in_library),
            flag(result.recording_scheduled),
            Cell::new(
                result
                    .recording_schedule_created
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ),
            flag(result.newly_scheduled),
        ];
        if with_errors {
            row.push(Cell::new(result.submission_error.as_deref().unwrap_or("")).fg(Color::Red));
        }
        table.add_row(row);
    }
    table
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message("success", msg.as_ref(), |m| println!("{} {}", "✓".green(), m));
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message("info", msg.as_ref(), |m| println!("{}", m));
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message("warning", msg.as_ref(), |m| println!("{} {}", "⚠".yellow(), m));
    }

    /// Errors are shown even in quiet mode.
    pub fn error(&self, msg: impl AsRef<str>) {
        match self.format {
            OutputFormat::Human => eprintln!("{} {}", "✗".red(), msg.as_ref()),
            _ => self.print_json(&json!({"type": "error", "message": msg.as_ref()})),
        }
    }

    fn message(&self, kind: &str, msg: &str, human: impl FnOnce(&str)) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => human(msg),
            _ => self.print_json(&json!({"type": kind, "message": msg})),
        }
    }

    pub fn json<T: Serialize>(&self, data: &T) {
        if self.quiet && !self.is_human() {
            return;
        }
        self.print_json(data);
    }

    /// The reconciliation report. Always printed: it is the command's result.
    pub fn report(&self, report: &WatchlistReport) {
        match self.format {
            OutputFormat::Human => {
                println!("{}", report_table(report));
                if !self.quiet {
                    println!(
                        "{} items: {} in library, {} scheduled ({} new), {} failed",
                        report.watchlist.len(),
                        report.in_library_count(),
                        report.scheduled_count(),
                        report.newly_scheduled_count(),
                        report.failed_count()
                    );
                }
            }
            _ => self.print_json(report),
        }
    }

    fn print_json<T: Serialize>(&self, data: &T) {
        let pretty = self.format != OutputFormat::Json;
        match to_json_string(data, pretty) {
            Ok(s) => println!("{}", s),
            Err(e) => tracing::error!("Failed to serialize output: {}", e),
        }
    }
}
