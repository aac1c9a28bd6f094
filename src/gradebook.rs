use indexmap::IndexMap;

use crate::config::CourseConfig;
use crate::error::GradebookError;
use crate::models::{Letter, Student, Table};

/// Count of students per final letter. Every letter is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LetterCounts {
    counts: [usize; 6],
}

impl LetterCounts {
    fn slot(letter: Letter) -> usize {
        match letter {
            Letter::A => 0,
            Letter::B => 1,
            Letter::C => 2,
            Letter::D => 3,
            Letter::F => 4,
            Letter::O => 5,
        }
    }

    pub fn increment(&mut self, letter: Letter) {
        self.counts[Self::slot(letter)] += 1;
    }

    pub fn get(&self, letter: Letter) -> usize {
        self.counts[Self::slot(letter)]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Letter, usize)> + '_ {
        Letter::ALL.iter().map(|letter| (*letter, self.get(*letter)))
    }
}

/// A configured course roster. Build a new one with [`Report::setup`] to reset.
#[derive(Debug, Clone)]
pub struct Report {
    config: CourseConfig,
    students: IndexMap<String, Student>,
}

impl Report {
    pub fn setup(config: CourseConfig) -> Result<Self, GradebookError> {
        config.validate()?;
        tracing::info!(
            total_sessions = config.total_sessions,
            num_assessments = config.num_assessments,
            weights = ?config.weights,
            min_a = config.thresholds.min_a,
            min_b = config.thresholds.min_b,
            min_c = config.thresholds.min_c,
            min_d = config.thresholds.min_d,
            min_attendance_pct = config.min_attendance_pct,
            "course configured"
        );
        Ok(Self {
            config,
            students: IndexMap::new(),
        })
    }

    pub fn config(&self) -> &CourseConfig {
        &self.config
    }

    pub fn num_assessments(&self) -> u32 {
        self.config.num_assessments
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    #[cfg(test)]
    pub fn student(&self, code: &str) -> Option<&Student> {
        self.students.get(code)
    }

    /// Students in insertion order.
    pub fn students(&self) -> impl Iterator<Item = &Student> + '_ {
        self.students.values()
    }

    pub fn has_final_letters(&self) -> bool {
        self.students
            .values()
            .any(|student| student.final_letter().is_some())
    }

    /// Re-adding a code replaces the student in place, dropping its scores.
    pub fn add_student(&mut self, code: &str, sessions_attended: u32) -> &Student {
        let student = Student::new(code, sessions_attended, self.config.total_sessions);
        let pct = student.attendance_pct();
        let (slot, previous) = self.students.insert_full(code.to_string(), student);
        if previous.is_some() {
            tracing::info!(code, attendance_pct = %format!("{pct:.1}"), "student replaced");
        } else {
            tracing::info!(code, attendance_pct = %format!("{pct:.1}"), "student added");
        }
        &self.students[slot]
    }

    pub fn remove_student(&mut self, code: &str) -> Result<Student, GradebookError> {
        match self.students.shift_remove(code) {
            Some(student) => {
                tracing::info!(code, "student deleted");
                Ok(student)
            }
            None => Err(self.unknown(code)),
        }
    }

    /// Always writes, overwriting any existing score. Returns the previous one.
    pub fn record_score(
        &mut self,
        code: &str,
        index: u32,
        value: f64,
    ) -> Result<Option<f64>, GradebookError> {
        self.check_index(index)?;
        let student = self.student_mut(code)?;
        let previous = student.record_score(index, value);
        tracing::info!(code, assessment = index, score = value, "score added");
        Ok(previous)
    }

    /// Records `values` as P1, P2, ... in order.
    pub fn record_scores(&mut self, code: &str, values: &[f64]) -> Result<(), GradebookError> {
        if values.len() > self.config.num_assessments as usize {
            return Err(GradebookError::AssessmentOutOfRange {
                index: u32::try_from(values.len()).unwrap_or(u32::MAX),
                max: self.config.num_assessments,
            });
        }
        if !self.students.contains_key(code) {
            return Err(self.unknown(code));
        }
        for (index, value) in (1u32..).zip(values.iter()) {
            self.record_score(code, index, *value)?;
        }
        Ok(())
    }

    /// Only overwrites a score that already exists. Returns the replaced value.
    pub fn edit_score(
        &mut self,
        code: &str,
        index: u32,
        value: f64,
    ) -> Result<f64, GradebookError> {
        self.check_index(index)?;
        let student = self.student_mut(code)?;
        if student.score(index).is_none() {
            tracing::warn!(code, assessment = index, "edit skipped, no existing score");
            return Err(GradebookError::MissingScore {
                code: code.to_string(),
                index,
            });
        }
        let previous = student.record_score(index, value).unwrap_or_default();
        tracing::info!(
            code,
            assessment = index,
            previous,
            score = value,
            "score edited"
        );
        Ok(previous)
    }

    pub fn remove_score(&mut self, code: &str, index: u32) -> Result<f64, GradebookError> {
        let student = self.student_mut(code)?;
        match student.remove_score(index) {
            Some(previous) => {
                tracing::info!(code, assessment = index, "score deleted");
                Ok(previous)
            }
            None => {
                tracing::warn!(code, assessment = index, "delete skipped, no existing score");
                Err(GradebookError::MissingScore {
                    code: code.to_string(),
                    index,
                })
            }
        }
    }

    /// Recomputes every final letter from current scores and configuration.
    pub fn finalize(&mut self) {
        let config = &self.config;
        for student in self.students.values_mut() {
            student.compute_final_letter(
                &config.weights,
                &config.thresholds,
                config.min_attendance_pct,
            );
        }
        tracing::info!(students = self.students.len(), "final letters computed");
    }

    /// Students without a letter are left out of every bucket.
    pub fn summary(&self) -> LetterCounts {
        let mut counts = LetterCounts::default();
        for letter in self.students.values().filter_map(Student::final_letter) {
            counts.increment(letter);
        }
        counts
    }

    pub fn to_table(&self) -> Table {
        Table {
            header: Table::header_for(self.config.num_assessments),
            rows: self
                .students
                .values()
                .map(|student| student.to_row(self.config.num_assessments))
                .collect(),
        }
    }

    fn check_index(&self, index: u32) -> Result<(), GradebookError> {
        if index == 0 || index > self.config.num_assessments {
            tracing::warn!(assessment = index, "assessment index out of range");
            return Err(GradebookError::AssessmentOutOfRange {
                index,
                max: self.config.num_assessments,
            });
        }
        Ok(())
    }

    fn student_mut(&mut self, code: &str) -> Result<&mut Student, GradebookError> {
        if !self.students.contains_key(code) {
            return Err(self.unknown(code));
        }
        self.students
            .get_mut(code)
            .ok_or_else(|| GradebookError::UnknownStudent(code.to_string()))
    }

    fn unknown(&self, code: &str) -> GradebookError {
        tracing::warn!(code, "unknown student");
        GradebookError::UnknownStudent(code.to_string())
    }
}
