// Plain-text tables for dataset previews and summaries

use std::fmt;

use crate::compiler::format_general;
use crate::data::{NumericSummary, Preview, Summary};

/// Render a table with a header row, columns padded to a common width.
/// The first column is left-aligned, the rest right-aligned.
fn write_table(f: &mut fmt::Formatter<'_>, header: &[String], rows: &[Vec<String>]) -> fmt::Result {
    let n = header.len();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(n) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let write_row = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
        let mut line = String::new();
        for (i, width) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            if i > 0 {
                line.push_str("  ");
            }
            if i == 0 {
                line.push_str(&format!("{:<width$}", cell, width = width));
            } else {
                line.push_str(&format!("{:>width$}", cell, width = width));
            }
        }
        writeln!(f, "{}", line.trim_end())
    };

    write_row(f, header)?;
    for row in rows {
        write_row(f, row)?;
    }
    Ok(())
}

fn stat(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format_general(value, 6)
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = vec![String::new()];
        header.extend(self.columns.iter().cloned());

        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut cells = vec![i.to_string()];
                cells.extend(row.iter().cloned());
                cells
            })
            .collect();

        write_table(f, &header, &rows)
    }
}

impl fmt::Display for Summary {
    /// One column per dataset column, one row per statistic
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Numeric(columns) => {
                let mut header = vec![String::new()];
                header.extend(columns.iter().map(|c| c.column.clone()));

                let stats: [(&str, fn(&NumericSummary) -> String); 8] = [
                    ("count", |c| c.count.to_string()),
                    ("mean", |c| stat(c.mean)),
                    ("std", |c| stat(c.std)),
                    ("min", |c| stat(c.min)),
                    ("25%", |c| stat(c.q25)),
                    ("50%", |c| stat(c.q50)),
                    ("75%", |c| stat(c.q75)),
                    ("max", |c| stat(c.max)),
                ];

                let rows: Vec<Vec<String>> = stats
                    .iter()
                    .map(|(name, value)| {
                        let mut row = vec![name.to_string()];
                        row.extend(columns.iter().map(|c| value(c)));
                        row
                    })
                    .collect();

                write_table(f, &header, &rows)
            }
            Summary::Categorical(columns) => {
                let mut header = vec![String::new()];
                header.extend(columns.iter().map(|c| c.column.clone()));

                let rows = vec![
                    row("count", columns.iter().map(|c| c.count.to_string())),
                    row("unique", columns.iter().map(|c| c.unique.to_string())),
                    row("top", columns.iter().map(|c| c.top.clone().unwrap_or_else(|| "NaN".to_string()))),
                    row("freq", columns.iter().map(|c| c.freq.to_string())),
                ];

                write_table(f, &header, &rows)
            }
        }
    }
}

fn row(name: &str, cells: impl Iterator<Item = String>) -> Vec<String> {
    std::iter::once(name.to_string()).chain(cells).collect()
}
