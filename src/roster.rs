use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::gradebook::Report;

/// One registration code per line; surrounding whitespace and blank lines are dropped.
pub fn parse_code_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_code_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read roster {}", path.display()))?;
    Ok(parse_code_list(&raw))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttendanceRow {
    pub code: String,
    pub attended: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreRow {
    pub code: String,
    pub assessment: u32,
    pub score: f64,
}

pub fn load_attendance(path: &Path) -> anyhow::Result<Vec<AttendanceRow>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open attendance file {}", path.display()))?;
    read_rows(reader).with_context(|| format!("invalid attendance row in {}", path.display()))
}

pub fn load_scores(path: &Path) -> anyhow::Result<Vec<ScoreRow>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open score file {}", path.display()))?;
    read_rows(reader).with_context(|| format!("invalid score row in {}", path.display()))
}

fn read_rows<R, T>(mut reader: csv::Reader<R>) -> anyhow::Result<Vec<T>>
where
    R: std::io::Read,
    T: DeserializeOwned,
{
    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result?);
    }
    Ok(rows)
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportOutcome {
    pub added: usize,
    pub skipped: Vec<String>,
}

/// Adds every listed code that has a non-zero attendance entry.
pub fn import_roster(
    report: &mut Report,
    codes: &[String],
    attendance: &[AttendanceRow],
) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();
    for code in codes {
        let attended = attendance
            .iter()
            .rev()
            .find(|row| &row.code == code)
            .map(|row| row.attended)
            .unwrap_or(0);
        if attended == 0 {
            tracing::warn!(code = %code, "no attendance recorded, student not added");
            outcome.skipped.push(code.clone());
            continue;
        }
        report.add_student(code, attended);
        outcome.added += 1;
    }
    outcome
}
