use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::GradebookError;

pub const DEFAULT_MIN_ATTENDANCE_PCT: f64 = 25.0;

/// Lower bounds of the A/B/C/D bands. Anything below `min_d` is an F.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_a: f64,
    pub min_b: f64,
    pub min_c: f64,
    pub min_d: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_a: 8.5,
            min_b: 6.5,
            min_c: 5.0,
            min_d: 4.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), GradebookError> {
        let all_finite = [self.min_a, self.min_b, self.min_c, self.min_d]
            .iter()
            .all(|value| value.is_finite());
        if all_finite && self.min_d < self.min_c && self.min_c < self.min_b && self.min_b < self.min_a
        {
            return Ok(());
        }
        Err(GradebookError::ThresholdOrder {
            a: self.min_a,
            b: self.min_b,
            c: self.min_c,
            d: self.min_d,
        })
    }
}

fn default_min_attendance() -> f64 {
    DEFAULT_MIN_ATTENDANCE_PCT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseConfig {
    pub total_sessions: u32,
    pub num_assessments: u32,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default = "default_min_attendance")]
    pub min_attendance_pct: f64,
}

impl CourseConfig {
    /// Every assessment weighs 1, default thresholds and attendance floor.
    pub fn uniform(total_sessions: u32, num_assessments: u32) -> Self {
        Self {
            total_sessions,
            num_assessments,
            weights: vec![1.0; num_assessments as usize],
            thresholds: Thresholds::default(),
            min_attendance_pct: DEFAULT_MIN_ATTENDANCE_PCT,
        }
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read course config {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("invalid course config in {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let config: CourseConfig = serde_json::from_str(raw)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GradebookError> {
        if self.total_sessions == 0 {
            return Err(GradebookError::NoSessions);
        }
        if self.num_assessments == 0 {
            return Err(GradebookError::NoAssessments);
        }
        if self.weights.len() != self.num_assessments as usize {
            return Err(GradebookError::WeightCount {
                expected: self.num_assessments as usize,
                actual: self.weights.len(),
            });
        }
        for (index, weight) in (1u32..).zip(self.weights.iter()) {
            if !weight.is_finite() || *weight <= 0.0 {
                return Err(GradebookError::InvalidWeight {
                    index,
                    weight: *weight,
                });
            }
        }
        self.thresholds.validate()?;
        if !(0.0..=100.0).contains(&self.min_attendance_pct) {
            return Err(GradebookError::AttendanceRange(self.min_attendance_pct));
        }
        Ok(())
    }
}
