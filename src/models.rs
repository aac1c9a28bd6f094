use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::Thresholds;
use crate::grading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
    F,
    /// Excluded: attendance below the floor or no recorded work.
    O,
}

impl Letter {
    pub const ALL: [Letter; 6] = [
        Letter::A,
        Letter::B,
        Letter::C,
        Letter::D,
        Letter::F,
        Letter::O,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Letter::A => "A",
            Letter::B => "B",
            Letter::C => "C",
            Letter::D => "D",
            Letter::F => "F",
            Letter::O => "O",
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    code: String,
    attendance_pct: f64,
    scores: BTreeMap<u32, f64>,
    final_letter: Option<Letter>,
}

impl Student {
    /// `total_sessions` must be non-zero; the percentage is fixed at creation.
    pub fn new(code: impl Into<String>, sessions_attended: u32, total_sessions: u32) -> Self {
        Self {
            code: code.into(),
            attendance_pct: f64::from(sessions_attended) / f64::from(total_sessions) * 100.0,
            scores: BTreeMap::new(),
            final_letter: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn attendance_pct(&self) -> f64 {
        self.attendance_pct
    }

    #[cfg(test)]
    pub fn scores(&self) -> &BTreeMap<u32, f64> {
        &self.scores
    }

    pub fn score(&self, index: u32) -> Option<f64> {
        self.scores.get(&index).copied()
    }

    pub fn final_letter(&self) -> Option<Letter> {
        self.final_letter
    }

    /// Returns the previous score at `index`, if any.
    pub fn record_score(&mut self, index: u32, value: f64) -> Option<f64> {
        self.scores.insert(index, value)
    }

    pub fn remove_score(&mut self, index: u32) -> Option<f64> {
        self.scores.remove(&index)
    }

    pub fn weighted_average(&self, weights: &[f64]) -> f64 {
        grading::weighted_average(&self.scores, weights)
    }

    pub fn compute_final_letter(
        &mut self,
        weights: &[f64],
        thresholds: &Thresholds,
        min_attendance_pct: f64,
    ) -> Letter {
        let letter = grading::final_letter(
            &self.scores,
            self.attendance_pct,
            weights,
            thresholds,
            min_attendance_pct,
        );
        self.final_letter = Some(letter);
        letter
    }

    /// `[code, P1..PN, letter]` with blanks for missing scores and an unset letter.
    pub fn to_row(&self, num_assessments: u32) -> Vec<String> {
        let mut row = Vec::with_capacity(num_assessments as usize + 2);
        row.push(self.code.clone());
        for index in 1..=num_assessments {
            row.push(self.score(index).map(format_score).unwrap_or_default());
        }
        row.push(
            self.final_letter
                .map(|letter| letter.to_string())
                .unwrap_or_default(),
        );
        row
    }
}

/// Whole numbers keep one decimal so exported cells read `10.0`, not `10`.
pub fn format_score(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn header_for(num_assessments: u32) -> Vec<String> {
        let mut header = Vec::with_capacity(num_assessments as usize + 2);
        header.push("CODE".to_string());
        header.extend((1..=num_assessments).map(|index| format!("P{index}")));
        header.push("FINAL".to_string());
        header
    }
}
