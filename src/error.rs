use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GradebookError {
    #[error("total sessions must be greater than zero")]
    NoSessions,
    #[error("a course needs at least one assessment")]
    NoAssessments,
    #[error("expected {expected} weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },
    #[error("weight for P{index} must be a positive number, got {weight}")]
    InvalidWeight { index: u32, weight: f64 },
    #[error("grade thresholds must satisfy D < C < B < A (got A={a}, B={b}, C={c}, D={d})")]
    ThresholdOrder { a: f64, b: f64, c: f64, d: f64 },
    #[error("minimum attendance must be between 0 and 100, got {0}")]
    AttendanceRange(f64),
    #[error("unknown student {0}")]
    UnknownStudent(String),
    #[error("assessment P{index} is outside P1..P{max}")]
    AssessmentOutOfRange { index: u32, max: u32 },
    #[error("student {code} has no score for P{index}")]
    MissingScore { code: String, index: u32 },
}
