use std::io;
use std::path::Path;

use anyhow::Context;

use crate::models::Table;

pub fn write_csv<W: io::Write>(table: &Table, writer: W) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
pub fn csv_string(table: &Table) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn write_csv_file(table: &Table, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(table, io::BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))
}
