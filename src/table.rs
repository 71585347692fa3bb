use std::fmt::Write as _;

/// Renders `rows` under `headers` as a plain aligned text table.
///
/// Cells that parse as numbers are right-aligned; everything else is
/// left-aligned. Rows shorter than the header are padded with blanks.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(sanitize(cell).chars().count());
        }
    }

    let mut output = String::new();
    let header_cells = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths, false));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let rule_cells = rule.iter().map(String::as_str).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule_cells, &widths, false));
    for row in rows {
        let cells = (0..column_count)
            .map(|idx| row.get(idx).map(String::as_str).unwrap_or(""))
            .collect::<Vec<_>>();
        let _ = writeln!(output, "{}", format_row(&cells, &widths, true));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(cells: &[&str], widths: &[usize], align_numbers: bool) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| {
            let cell = sanitize(cell);
            if align_numbers && cell.trim().parse::<f64>().is_ok() {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn sanitize(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}
