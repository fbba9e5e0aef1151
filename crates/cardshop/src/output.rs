//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use cardshop_core::OrderStatus;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Order status, colored by how much work it still needs.
pub fn paint_status(status: OrderStatus, color: bool) -> String {
    let text = status.to_string();
    if !color {
        return text;
    }
    match status {
        OrderStatus::Pending => text.yellow().to_string(),
        OrderStatus::Paid => text.cyan().to_string(),
        OrderStatus::Fulfilled => text.green().to_string(),
        OrderStatus::Canceled => text.dimmed().to_string(),
    }
}

/// Stock level, red when empty.
pub fn paint_stock(stock: u32, color: bool) -> String {
    if color && stock == 0 {
        stock.red().to_string()
    } else {
        stock.to_string()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status line on stderr, so stdout stays machine-readable.
pub fn print_done(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Item {
        id: u32,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: u32,
    }

    #[test]
    fn plain_emits_one_id_per_line() {
        let items = [Item { id: 1 }, Item { id: 2 }];
        let out = render_list(
            OutputFormat::Plain,
            &items,
            |i| Row { id: i.id },
            |i| i.id.to_string(),
        )
        .unwrap_or_default();
        assert_eq!(out, "1\n2");
    }

    #[test]
    fn compact_json_is_single_line() {
        let items = [Item { id: 1 }];
        let out = render_list(
            OutputFormat::JsonCompact,
            &items,
            |i| Row { id: i.id },
            |i| i.id.to_string(),
        )
        .unwrap_or_default();
        assert_eq!(out, r#"[{"id":1}]"#);
    }

    #[test]
    fn table_has_headers() {
        let items = [Item { id: 7 }];
        let out = render_list(
            OutputFormat::Table,
            &items,
            |i| Row { id: i.id },
            |i| i.id.to_string(),
        )
        .unwrap_or_default();
        assert!(out.contains("ID"));
        assert!(out.contains('7'));
    }

    #[test]
    fn uncolored_status_is_canonical_text() {
        assert_eq!(paint_status(OrderStatus::Canceled, false), "Canceled");
        assert_eq!(paint_stock(0, false), "0");
    }
}
