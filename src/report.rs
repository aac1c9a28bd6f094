use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gradebook::{LetterCounts, Report};
use crate::models::{Letter, Student};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterShare {
    pub letter: Letter,
    pub count: usize,
    pub percent: f64,
}

pub fn letter_shares(counts: &LetterCounts) -> Vec<LetterShare> {
    let total = counts.total();
    counts
        .iter()
        .map(|(letter, count)| LetterShare {
            letter,
            count,
            percent: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentStats {
    pub index: u32,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample deviation; undefined below two scores.
    pub std_dev: Option<f64>,
}

/// Per-assessment statistics over recorded scores only. Assessments nobody
/// has a score for are omitted.
pub fn assessment_stats(report: &Report) -> Vec<AssessmentStats> {
    (1..=report.num_assessments())
        .filter_map(|index| {
            let scores: Vec<f64> = report
                .students()
                .filter_map(|student| student.score(index))
                .collect();
            describe(&scores).map(|(mean, min, max, std_dev)| AssessmentStats {
                index,
                count: scores.len(),
                mean,
                min,
                max,
                std_dev,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassStats {
    pub graded: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Weighted averages of students holding a letter other than `O`.
pub fn class_stats(report: &Report) -> Option<ClassStats> {
    let weights = &report.config().weights;
    let averages: Vec<f64> = report
        .students()
        .filter(|student| matches!(student.final_letter(), Some(letter) if letter != Letter::O))
        .map(|student| student.weighted_average(weights))
        .collect();
    describe(&averages).map(|(mean, min, max, _)| ClassStats {
        graded: averages.len(),
        mean,
        min,
        max,
    })
}

pub fn mean_attendance(report: &Report) -> Option<f64> {
    if report.is_empty() {
        return None;
    }
    let total: f64 = report.students().map(Student::attendance_pct).sum();
    Some(total / report.len() as f64)
}

pub fn excluded_codes(report: &Report) -> Vec<String> {
    report
        .students()
        .filter(|student| student.final_letter() == Some(Letter::O))
        .map(|student| student.code().to_string())
        .collect()
}

fn describe(values: &[f64]) -> Option<(f64, f64, f64, Option<f64>)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std_dev = if values.len() < 2 {
        None
    } else {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    };
    Some((mean, min, max, std_dev))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub students: usize,
    pub letters: Vec<LetterShare>,
    pub assessments: Vec<AssessmentStats>,
    pub class: Option<ClassStats>,
    pub mean_attendance_pct: Option<f64>,
    pub excluded: Vec<String>,
}

impl SummaryView {
    pub fn from_report(report: &Report) -> Self {
        Self {
            students: report.len(),
            letters: letter_shares(&report.summary()),
            assessments: assessment_stats(report),
            class: class_stats(report),
            mean_attendance_pct: mean_attendance(report),
            excluded: excluded_codes(report),
        }
    }
}

pub fn build_report(report: &Report, generated_at: DateTime<Utc>) -> String {
    let view = SummaryView::from_report(report);
    let mut output = String::new();

    let _ = writeln!(output, "# Gradebook Summary");
    let _ = writeln!(
        output,
        "Generated {} for {} students across {} assessments",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        view.students,
        report.num_assessments()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Letter Distribution");

    if !report.has_final_letters() {
        let _ = writeln!(output, "No final letters computed yet.");
    } else {
        for share in view.letters.iter() {
            let _ = writeln!(
                output,
                "- {}: {} ({:.1}%)",
                share.letter, share.count, share.percent
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Assessment Statistics");

    if view.assessments.is_empty() {
        let _ = writeln!(output, "No scores recorded.");
    } else {
        let _ = writeln!(output, "| Assessment | Scores | Mean | Min | Max | Std Dev |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for stats in view.assessments.iter() {
            let std_dev = stats
                .std_dev
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                output,
                "| P{} | {} | {:.2} | {:.2} | {:.2} | {} |",
                stats.index, stats.count, stats.mean, stats.min, stats.max, std_dev
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Class Averages");

    match view.class {
        Some(class) => {
            let _ = writeln!(output, "- Graded students: {}", class.graded);
            let _ = writeln!(output, "- Mean: {:.2}", class.mean);
            let _ = writeln!(output, "- Highest: {:.2}", class.max);
            let _ = writeln!(output, "- Lowest: {:.2}", class.min);
        }
        None => {
            let _ = writeln!(output, "No graded students.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");

    match view.mean_attendance_pct {
        Some(pct) => {
            let _ = writeln!(output, "Mean attendance: {pct:.1}%");
        }
        None => {
            let _ = writeln!(output, "No students on the roster.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Excluded Students");

    if view.excluded.is_empty() {
        let _ = writeln!(output, "None.");
    } else {
        let _ = writeln!(output, "{}", view.excluded.join(", "));
    }

    output
}
