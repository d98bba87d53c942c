//! Aligned plain-text tables for terminal output.

use std::fmt::Write as _;

/// Renders `rows` under `headers`. Columns whose every non-empty cell parses as
/// a number are right-aligned; the rest are left-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    let mut numeric = vec![true; column_count];
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            let cell = sanitize(cell);
            widths[idx] = widths[idx].max(cell.chars().count());
            if !cell.is_empty() && cell.parse::<f64>().is_err() {
                numeric[idx] = false;
            }
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &vec![false; column_count]));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &numeric));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &numeric));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(cells: &[String], widths: &[usize], right_align: &[bool]) -> String {
    let line = widths
        .iter()
        .enumerate()
        .map(|(idx, width)| {
            let cell = cells.get(idx).map(|c| sanitize(c)).unwrap_or_default();
            if right_align[idx] {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn sanitize(cell: &str) -> String {
    cell.replace(['\n', '\r', '\t'], " ")
}
