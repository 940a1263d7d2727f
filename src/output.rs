use crate::error::Result;
use crate::presenter::DisplayTable;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV bytes for a display table: UTF-8 with BOM, display headers (bands
/// dropped) and the same strings shown on screen.
pub fn table_to_csv(table: &DisplayTable) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.write_all(UTF8_BOM)?;
    {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buf);
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
    }
    Ok(buf)
}

pub fn write_csv(path: &Path, table: &DisplayTable) -> Result<()> {
    let bytes = table_to_csv(table)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Render up to `max_rows` rows. Banded tables get the band labels as an
/// extra header line.
pub fn render_table(table: &DisplayTable, max_rows: usize) -> String {
    if table.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    let banded = table.band_row();
    if let Some(bands) = &banded {
        builder.push_record(bands.clone());
    }
    builder.push_record(table.headers.clone());
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(row.clone());
    }
    let mut rendered = builder.build();
    if banded.is_some() {
        rendered.with(Style::modern());
    } else {
        rendered.with(Style::markdown());
    }
    rendered.to_string()
}

pub fn preview_table(title: &str, note: Option<&str>, table: &DisplayTable, max_rows: usize) {
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_table(table, max_rows));
    if table.rows.len() > max_rows {
        println!("... {} more rows\n", table.rows.len() - max_rows);
    }
}
