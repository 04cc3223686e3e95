use std::io::{self, Write};

use super::PredictionRow;

/// Write rows as CSV with a `label` column, a `confidence` column when any row
/// carries one, then `columns` in order.
pub fn write_csv<W: Write>(
    writer: &mut W,
    rows: &[&PredictionRow],
    columns: &[String],
) -> io::Result<()> {
    let with_confidence = rows.iter().any(|row| row.confidence.is_some());
    let mut header = vec!["label".to_string()];
    if with_confidence {
        header.push("confidence".to_string());
    }
    header.extend(columns.iter().cloned());
    write_record(writer, header.iter().map(String::as_str))?;

    for row in rows {
        let mut cells = vec![row.label.as_str().to_string()];
        if with_confidence {
            cells.push(row.confidence.map(|c| c.to_string()).unwrap_or_default());
        }
        cells.extend(columns.iter().map(|key| {
            row.feature(key)
                .map(ToString::to_string)
                .unwrap_or_default()
        }));
        write_record(writer, cells.iter().map(String::as_str))?;
    }
    Ok(())
}

fn write_record<'a, W: Write>(
    writer: &mut W,
    cells: impl Iterator<Item = &'a str>,
) -> io::Result<()> {
    let line = cells.map(escape_cell).collect::<Vec<_>>().join(",");
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\r\n")
}

fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
