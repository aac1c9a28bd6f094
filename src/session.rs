use std::fmt::{self, Write as _};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::config::{CourseConfig, Thresholds, DEFAULT_MIN_ATTENDANCE_PCT};
use crate::error::GradebookError;
use crate::gradebook::Report;
use crate::models::{format_score, Table};
use crate::roster::{self, AttendanceRow, ImportOutcome};
use crate::{export, pdf, report};

pub const MAX_SCORE: f64 = 10.0;

#[derive(Parser, Debug)]
#[command(name = "gradebook", no_binary_name = true)]
struct CommandLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Configure a new course, discarding the current roster
    Setup(SetupArgs),
    /// Configure a new course from a JSON file
    LoadConfig { path: PathBuf },
    /// Add a student, replacing any student with the same code
    Add { code: String, attended: u32 },
    /// Add students from a file with one registration code per line
    Import {
        roster: PathBuf,
        /// Sessions attended, applied to every listed code
        #[arg(long, conflicts_with = "attendance")]
        attended: Option<u32>,
        /// CSV file with `code,attended` columns
        #[arg(long)]
        attendance: Option<PathBuf>,
    },
    /// Delete a student
    Remove { code: String },
    /// Record a score, overwriting any existing one
    Score { code: String, index: u32, value: f64 },
    /// Record scores for P1, P2, ... in order
    Scores {
        code: String,
        #[arg(required = true, num_args = 1..)]
        values: Vec<f64>,
    },
    /// Change a score that was already recorded
    Edit { code: String, index: u32, value: f64 },
    /// Delete a recorded score
    Unscore { code: String, index: u32 },
    /// Compute final letters for every student
    Finalize,
    /// Letter distribution and statistics
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Show the roster table
    Table,
    /// Write the roster table as comma-separated text
    ExportCsv { path: PathBuf },
    /// Write the roster table as a paginated PDF
    ExportPdf { path: PathBuf },
    /// Write the Markdown summary report
    Report { path: PathBuf },
    /// End the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Args, Debug, Clone)]
pub struct SetupArgs {
    /// Total number of class sessions
    #[arg(long)]
    pub sessions: u32,
    /// Number of assessments
    #[arg(long)]
    pub assessments: u32,
    /// Comma-separated weights, one per assessment (default: all 1)
    #[arg(long, value_delimiter = ',')]
    pub weights: Vec<f64>,
    #[arg(long, default_value_t = Thresholds::default().min_a)]
    pub min_a: f64,
    #[arg(long, default_value_t = Thresholds::default().min_b)]
    pub min_b: f64,
    #[arg(long, default_value_t = Thresholds::default().min_c)]
    pub min_c: f64,
    #[arg(long, default_value_t = Thresholds::default().min_d)]
    pub min_d: f64,
    /// Attendance percentage below which a student is excluded
    #[arg(long, default_value_t = DEFAULT_MIN_ATTENDANCE_PCT)]
    pub min_attendance: f64,
}

impl SetupArgs {
    pub fn into_config(self) -> CourseConfig {
        let mut config = CourseConfig::uniform(self.sessions, self.assessments);
        if !self.weights.is_empty() {
            config.weights = self.weights;
        }
        config.thresholds = Thresholds {
            min_a: self.min_a,
            min_b: self.min_b,
            min_c: self.min_c,
            min_d: self.min_d,
        };
        config.min_attendance_pct = self.min_attendance;
        config
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nothing,
    Output(String),
    Warning(String),
    Quit,
}

impl Reply {
    fn warn(message: impl fmt::Display) -> Self {
        Reply::Warning(message.to_string())
    }
}

/// Scores entered by hand sit on a 0-10 scale.
pub fn check_score(value: f64) -> Result<f64, String> {
    if value.is_finite() && (0.0..=MAX_SCORE).contains(&value) {
        Ok(value)
    } else {
        Err(format!("score {value} is outside 0-{MAX_SCORE}"))
    }
}

/// Holds the one live report of an interactive session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    report: Option<Report>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            report: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    #[cfg(test)]
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Replaces the report wholesale. On error the current one is kept.
    pub fn configure(&mut self, config: CourseConfig) -> Result<&Report, GradebookError> {
        let report: &Report = self.report.insert(Report::setup(config)?);
        Ok(report)
    }

    /// Runs one command line. Every failure, file I/O included, comes back as
    /// a warning and leaves the current report as it was.
    pub fn execute(&mut self, line: &str) -> Reply {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Reply::Nothing;
        }

        let command = match CommandLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                return match err.kind() {
                    clap::error::ErrorKind::DisplayHelp
                    | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                    | clap::error::ErrorKind::DisplayVersion => {
                        Reply::Output(err.to_string().trim_end().to_string())
                    }
                    _ => Reply::warn(err.to_string().trim_end()),
                }
            }
        };

        self.dispatch(command).unwrap_or_else(|err| {
            let message = format!("{err:#}");
            tracing::warn!(error = %message, "command failed");
            Reply::Warning(message)
        })
    }

    fn dispatch(&mut self, command: ShellCommand) -> anyhow::Result<Reply> {
        match command {
            ShellCommand::Setup(args) => Ok(self.configure_reply(args.into_config())),
            ShellCommand::LoadConfig { path } => {
                let config = CourseConfig::from_json_file(&path)?;
                Ok(self.configure_reply(config))
            }
            ShellCommand::Quit => Ok(Reply::Quit),
            other => {
                let Some(report) = self.report.as_mut() else {
                    return Ok(Reply::warn(
                        "no course configured, run `setup` or `load-config` first",
                    ));
                };
                apply(report, other)
            }
        }
    }

    fn configure_reply(&mut self, config: CourseConfig) -> Reply {
        match self.configure(config) {
            Ok(report) => {
                let config = report.config();
                Reply::Output(format!(
                    "Course configured: {} sessions, {} assessments, weights {:?}.",
                    config.total_sessions, config.num_assessments, config.weights
                ))
            }
            Err(err) => Reply::warn(err),
        }
    }
}

fn apply(report: &mut Report, command: ShellCommand) -> anyhow::Result<Reply> {
    let reply = match command {
        ShellCommand::Add { code, attended } => {
            let total = report.config().total_sessions;
            if attended > total {
                return Ok(Reply::warn(format!(
                    "attended sessions {attended} exceed the course total of {total}"
                )));
            }
            let student = report.add_student(&code, attended);
            Reply::Output(format!(
                "Student {code} added ({:.1}% attendance).",
                student.attendance_pct()
            ))
        }
        ShellCommand::Import {
            roster: path,
            attended,
            attendance,
        } => {
            let codes = roster::load_code_list(&path)?;
            let rows = match (attended, attendance) {
                (Some(attended), _) => codes
                    .iter()
                    .map(|code| AttendanceRow {
                        code: code.clone(),
                        attended,
                    })
                    .collect(),
                (None, Some(file)) => roster::load_attendance(&file)?,
                (None, None) => {
                    return Ok(Reply::warn("import needs --attended or --attendance"));
                }
            };
            let total = report.config().total_sessions;
            if let Some(row) = rows.iter().find(|row| row.attended > total) {
                return Ok(Reply::warn(format!(
                    "{} attended {} sessions, more than the course total of {total}",
                    row.code, row.attended
                )));
            }
            let outcome = roster::import_roster(report, &codes, &rows);
            let mut message = format!("Added {} students from {}.", outcome.added, path.display());
            if !outcome.skipped.is_empty() {
                let _ = write!(
                    message,
                    "\nSkipped without attendance: {}",
                    outcome.skipped.join(", ")
                );
            }
            Reply::Output(message)
        }
        ShellCommand::Remove { code } => match report.remove_student(&code) {
            Ok(_) => Reply::Output(format!("Student {code} deleted.")),
            Err(err) => Reply::warn(err),
        },
        ShellCommand::Score { code, index, value } => {
            let value = match check_score(value) {
                Ok(value) => value,
                Err(message) => return Ok(Reply::Warning(message)),
            };
            match report.record_score(&code, index, value) {
                Ok(Some(previous)) => Reply::Output(format!(
                    "P{index} for {code} set to {} (was {}).",
                    format_score(value),
                    format_score(previous)
                )),
                Ok(None) => Reply::Output(format!(
                    "P{index} for {code} set to {}.",
                    format_score(value)
                )),
                Err(err) => Reply::warn(err),
            }
        }
        ShellCommand::Scores { code, values } => {
            if let Some(message) = values.iter().find_map(|value| check_score(*value).err()) {
                return Ok(Reply::Warning(message));
            }
            match report.record_scores(&code, &values) {
                Ok(()) => Reply::Output(format!(
                    "Recorded {} scores for {code}.",
                    values.len()
                )),
                Err(err) => Reply::warn(err),
            }
        }
        ShellCommand::Edit { code, index, value } => {
            let value = match check_score(value) {
                Ok(value) => value,
                Err(message) => return Ok(Reply::Warning(message)),
            };
            match report.edit_score(&code, index, value) {
                Ok(previous) => Reply::Output(format!(
                    "P{index} for {code}: {} -> {}.",
                    format_score(previous),
                    format_score(value)
                )),
                Err(err) => Reply::warn(err),
            }
        }
        ShellCommand::Unscore { code, index } => match report.remove_score(&code, index) {
            Ok(_) => Reply::Output(format!("P{index} for {code} deleted.")),
            Err(err) => Reply::warn(err),
        },
        ShellCommand::Finalize => {
            if report.is_empty() {
                Reply::warn("no students on the roster")
            } else {
                report.finalize();
                Reply::Output(format!(
                    "Final letters computed for {} students.",
                    report.len()
                ))
            }
        }
        ShellCommand::Summary { json } => {
            if !report.has_final_letters() {
                Reply::warn("no final letters yet, run `finalize` first")
            } else if json {
                let view = report::SummaryView::from_report(report);
                Reply::Output(serde_json::to_string_pretty(&view)?)
            } else {
                Reply::Output(report::build_report(report, Utc::now()).trim_end().to_string())
            }
        }
        ShellCommand::Table => {
            if report.is_empty() {
                Reply::Output("No students added yet.".to_string())
            } else {
                Reply::Output(render_text_table(&report.to_table()))
            }
        }
        ShellCommand::ExportCsv { path } => {
            if report.is_empty() {
                Reply::warn("add students before exporting")
            } else {
                export::write_csv_file(&report.to_table(), &path)?;
                Reply::Output(format!("Wrote {}.", path.display()))
            }
        }
        ShellCommand::ExportPdf { path } => {
            if report.is_empty() {
                Reply::warn("add students before exporting")
            } else {
                pdf::write_table_file(&report.to_table(), &path)?;
                Reply::Output(format!("Wrote {}.", path.display()))
            }
        }
        ShellCommand::Report { path } => {
            std::fs::write(&path, report::build_report(report, Utc::now()))?;
            Reply::Output(format!("Report written to {}.", path.display()))
        }
        ShellCommand::Setup(_) | ShellCommand::LoadConfig { .. } | ShellCommand::Quit => {
            Reply::Nothing
        }
    };
    Ok(reply)
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub import: ImportOutcome,
    pub recorded: usize,
    /// One message per score row that was not recorded.
    pub rejected: Vec<String>,
}

/// Grades a course from files in one pass: roster and attendance, then the
/// optional score rows, then final letters. A bad score row is skipped and
/// reported, a bad file is an error.
pub fn grade_course(
    config: CourseConfig,
    roster_path: &Path,
    attendance_path: &Path,
    scores_path: Option<&Path>,
) -> anyhow::Result<(Report, BatchOutcome)> {
    let mut report = Report::setup(config)?;
    let codes = roster::load_code_list(roster_path)?;
    let attendance = roster::load_attendance(attendance_path)?;
    let total = report.config().total_sessions;
    if let Some(row) = attendance.iter().find(|row| row.attended > total) {
        anyhow::bail!(
            "{} attended {} sessions, more than the course total of {total}",
            row.code,
            row.attended
        );
    }

    let mut outcome = BatchOutcome {
        import: roster::import_roster(&mut report, &codes, &attendance),
        ..BatchOutcome::default()
    };

    if let Some(path) = scores_path {
        for row in roster::load_scores(path)? {
            let result = check_score(row.score)
                .map_err(anyhow::Error::msg)
                .and_then(|value| {
                    report
                        .record_score(&row.code, row.assessment, value)
                        .map_err(anyhow::Error::from)
                });
            match result {
                Ok(_) => outcome.recorded += 1,
                Err(err) => {
                    tracing::warn!(code = %row.code, assessment = row.assessment, error = %err, "score row skipped");
                    outcome
                        .rejected
                        .push(format!("{} P{}: {err}", row.code, row.assessment));
                }
            }
        }
    }

    if !report.is_empty() {
        report.finalize();
    }
    Ok((report, outcome))
}

/// Left-aligned columns separated by two spaces.
pub fn render_text_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.header.iter().map(|cell| cell.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    for cells in std::iter::once(&table.header).chain(table.rows.iter()) {
        let line = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(output, "{}", line.trim_end());
    }
    output.trim_end().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Prompt for input and keep going after warnings.
    Interactive,
    /// Stop at the first warning.
    Script,
}

pub fn run<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    mut output: W,
    mode: Mode,
) -> anyhow::Result<()> {
    let span = tracing::info_span!("session", id = %session.id());
    let _guard = span.enter();
    tracing::info!("session started");

    if mode == Mode::Interactive {
        writeln!(output, "Gradebook session. Type `help` for commands.")?;
        write!(output, "> ")?;
        output.flush()?;
    }

    for (number, line) in (1usize..).zip(input.lines()) {
        let line = line?;
        match session.execute(&line) {
            Reply::Nothing => {}
            Reply::Output(text) => writeln!(output, "{text}")?,
            Reply::Warning(text) => {
                if mode == Mode::Script {
                    anyhow::bail!("line {number}: {text}");
                }
                writeln!(output, "warning: {text}")?;
            }
            Reply::Quit => break,
        }
        if mode == Mode::Interactive {
            write!(output, "> ")?;
            output.flush()?;
        }
    }

    tracing::info!("session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Letter;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn configured() -> Session {
        let mut session = Session::new();
        let reply = session.execute("setup --sessions 10 --assessments 2");
        assert!(matches!(reply, Reply::Output(_)));
        session
    }

    fn output(reply: Reply) -> String {
        match reply {
            Reply::Output(text) => text,
            other => panic!("expected output, got {other:?}"),
        }
    }

    #[test]
    fn commands_need_a_course() {
        let mut session = Session::new();
        assert!(matches!(
            session.execute("add 1001 5"),
            Reply::Warning(_)
        ));
        assert!(session.report().is_none());
    }

    #[test]
    fn blank_and_comment_lines_do_nothing() {
        let mut session = Session::new();
        assert_eq!(session.execute("   "), Reply::Nothing);
        assert_eq!(session.execute("# roster for term 1"), Reply::Nothing);
    }

    #[test]
    fn setup_flags_build_the_config() {
        let mut session = Session::new();
        session.execute("setup --sessions 20 --assessments 3 --weights 1,2,1 --min-attendance 50");
        let config = session.report().unwrap().config();
        assert_eq!(config.weights, vec![1.0, 2.0, 1.0]);
        assert_eq!(config.min_attendance_pct, 50.0);
        assert_eq!(config.thresholds, Thresholds::default());
    }

    #[test]
    fn invalid_setup_keeps_the_current_report() {
        let mut session = configured();
        session.execute("add 1001 5");
        let reply = session.execute("setup --sessions 10 --assessments 2 --min-c 9");
        assert!(matches!(reply, Reply::Warning(_)));
        assert_eq!(session.report().unwrap().len(), 1);
    }

    #[test]
    fn reconfiguring_discards_students() {
        let mut session = configured();
        session.execute("add 1001 5");
        session.execute("setup --sessions 12 --assessments 1");
        assert!(session.report().unwrap().is_empty());
    }

    #[test]
    fn grading_flow() {
        let mut session = configured();
        session.execute("add 1001 3");
        session.execute("scores 1001 10 6");
        session.execute("add 1002 1");
        let reply = output(session.execute("finalize"));
        assert_eq!(reply, "Final letters computed for 2 students.");

        let report = session.report().unwrap();
        assert_eq!(report.student("1001").unwrap().final_letter(), Some(Letter::B));
        assert_eq!(report.student("1002").unwrap().final_letter(), Some(Letter::O));

        let table = output(session.execute("table"));
        assert_eq!(table, "CODE  P1    P2   FINAL\n1001  10.0  6.0  B\n1002             O");
    }

    #[test]
    fn score_commands_report_changes() {
        let mut session = configured();
        session.execute("add 1001 10");
        assert_eq!(
            output(session.execute("score 1001 1 7")),
            "P1 for 1001 set to 7.0."
        );
        assert_eq!(
            output(session.execute("score 1001 1 8.5")),
            "P1 for 1001 set to 8.5 (was 7.0)."
        );
        assert_eq!(
            output(session.execute("edit 1001 1 9")),
            "P1 for 1001: 8.5 -> 9.0."
        );
        assert!(matches!(
            session.execute("edit 1001 2 9"),
            Reply::Warning(_)
        ));
        assert_eq!(
            output(session.execute("unscore 1001 1")),
            "P1 for 1001 deleted."
        );
        assert!(matches!(
            session.execute("unscore 1001 1"),
            Reply::Warning(_)
        ));
    }

    #[test]
    fn rejects_out_of_scale_input() {
        let mut session = configured();
        assert!(matches!(
            session.execute("add 1001 11"),
            Reply::Warning(_)
        ));
        session.execute("add 1001 10");
        assert!(matches!(
            session.execute("score 1001 1 10.5"),
            Reply::Warning(_)
        ));
        assert!(matches!(
            session.execute("score 1001 3 5"),
            Reply::Warning(_)
        ));
        assert!(matches!(
            session.execute("scores 1001 5 11"),
            Reply::Warning(_)
        ));
        assert!(session.report().unwrap().student("1001").unwrap().scores().is_empty());
    }

    #[test]
    fn finalize_and_summary_guard_empty_state() {
        let mut session = configured();
        assert!(matches!(
            session.execute("finalize"),
            Reply::Warning(_)
        ));
        session.execute("add 1001 10");
        assert!(matches!(
            session.execute("summary"),
            Reply::Warning(_)
        ));
        session.execute("finalize");
        let summary = output(session.execute("summary"));
        assert!(summary.contains("- O: 1 (100.0%)"));

        let json = output(session.execute("summary --json"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["students"], 1);
        assert_eq!(value["excluded"][0], "1001");
    }

    #[test]
    fn unknown_commands_warn() {
        let mut session = configured();
        assert!(matches!(
            session.execute("promote 1001"),
            Reply::Warning(_)
        ));
        assert!(matches!(session.execute("help"), Reply::Output(_)));
        assert_eq!(session.execute("exit"), Reply::Quit);
    }

    #[test]
    fn import_and_export_files() {
        let dir = tempdir().unwrap();
        let roster = dir.path().join("roster.txt");
        std::fs::write(&roster, "1001\n\n 1002 \n").unwrap();
        let csv_path = dir.path().join("out.csv");
        let pdf_path = dir.path().join("out.pdf");

        let mut session = configured();
        assert!(matches!(
            session.execute("export-csv /dev/null"),
            Reply::Warning(_)
        ));
        let reply = output(session.execute(&format!("import {} --attended 8", roster.display())));
        assert!(reply.starts_with("Added 2 students"));
        session.execute("scores 1002 9 9");
        session.execute("finalize");
        session.execute(&format!("export-csv {}", csv_path.display()));
        session.execute(&format!("export-pdf {}", pdf_path.display()));

        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv_text, "CODE,P1,P2,FINAL\n1001,,,O\n1002,9.0,9.0,A\n");
        let pdf_bytes = std::fs::read(&pdf_path).unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn import_needs_attendance() {
        let mut session = configured();
        let reply = session.execute("import roster.txt");
        assert!(matches!(reply, Reply::Warning(_)));
    }

    #[test]
    fn interactive_run_keeps_going_after_warnings() {
        let mut session = Session::new();
        let input = Cursor::new("add 1001 5\nsetup --sessions 4 --assessments 1\nadd 1001 2\nquit\nadd 1002 2\n");
        let mut out = Vec::new();
        run(&mut session, input, &mut out, Mode::Interactive).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("warning: no course configured"));
        assert!(text.contains("Student 1001 added (50.0% attendance)."));
        assert_eq!(session.report().unwrap().len(), 1);
    }

    #[test]
    fn bad_path_is_a_warning_not_the_end_of_the_session() {
        let mut session = Session::new();
        let input = Cursor::new(
            "setup --sessions 4 --assessments 1\n\
             add 1001 2\n\
             import /nonexistent/roster.txt --attended 2\n\
             export-csv /nonexistent/dir/out.csv\n\
             load-config /nonexistent/course.json\n\
             add 1002 2\n",
        );
        let mut out = Vec::new();
        run(&mut session, input, &mut out, Mode::Interactive).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("warning: failed to read roster /nonexistent/roster.txt"));
        assert!(text.contains("warning: failed to create /nonexistent/dir/out.csv"));
        assert!(text.contains("warning: failed to read course config"));
        assert_eq!(session.report().unwrap().len(), 2);
    }

    #[test]
    fn script_run_stops_at_a_bad_path() {
        let mut session = Session::new();
        let input = Cursor::new(
            "setup --sessions 4 --assessments 1\nimport /nonexistent/roster.txt --attended 2\nadd 1001 2\n",
        );
        let err = run(&mut session, input, Vec::new(), Mode::Script).unwrap_err();
        assert!(err.to_string().starts_with("line 2: failed to read roster"));
        assert!(session.report().unwrap().is_empty());
    }

    fn course_files(dir: &Path, roster: &str, attendance: &str, scores: &str) {
        std::fs::write(dir.join("roster.txt"), roster).unwrap();
        std::fs::write(dir.join("attendance.csv"), attendance).unwrap();
        std::fs::write(dir.join("scores.csv"), scores).unwrap();
    }

    #[test]
    fn batch_grading_skips_bad_rows_and_absent_students() {
        let dir = tempdir().unwrap();
        course_files(
            dir.path(),
            "1001\n1002\n1003\n",
            "code,attended\n1001,8\n1002,0\n",
            "code,assessment,score\n1001,1,9\n1001,2,10.5\n9999,1,5\n1001,3,5\n",
        );

        let (report, outcome) = grade_course(
            CourseConfig::uniform(10, 2),
            &dir.path().join("roster.txt"),
            &dir.path().join("attendance.csv"),
            Some(&dir.path().join("scores.csv")),
        )
        .unwrap();

        assert_eq!(outcome.import.added, 1);
        assert_eq!(outcome.import.skipped, vec!["1002", "1003"]);
        assert_eq!(outcome.recorded, 1);
        assert_eq!(outcome.rejected.len(), 3);
        assert!(outcome.rejected[0].starts_with("1001 P2: score 10.5 is outside"));
        assert!(outcome.rejected[1].starts_with("9999 P1: unknown student"));
        assert!(outcome.rejected[2].starts_with("1001 P3:"));

        let student = report.student("1001").unwrap();
        assert_eq!(student.score(1), Some(9.0));
        assert_eq!(student.score(2), None);
        assert_eq!(student.final_letter(), Some(Letter::D));
    }

    #[test]
    fn batch_grading_without_scores_excludes_everyone() {
        let dir = tempdir().unwrap();
        course_files(dir.path(), "1001\n", "code,attended\n1001,10\n", "");

        let (report, outcome) = grade_course(
            CourseConfig::uniform(10, 2),
            &dir.path().join("roster.txt"),
            &dir.path().join("attendance.csv"),
            None,
        )
        .unwrap();
        assert_eq!(outcome.recorded, 0);
        assert_eq!(report.student("1001").unwrap().final_letter(), Some(Letter::O));
    }

    #[test]
    fn batch_grading_rejects_bad_files() {
        let dir = tempdir().unwrap();
        course_files(dir.path(), "1001\n", "code,attended\n1001,12\n", "");
        let roster = dir.path().join("roster.txt");
        let attendance = dir.path().join("attendance.csv");

        let err = grade_course(CourseConfig::uniform(10, 2), &roster, &attendance, None).unwrap_err();
        assert!(err.to_string().contains("more than the course total of 10"));

        let missing = dir.path().join("missing.csv");
        assert!(grade_course(CourseConfig::uniform(10, 2), &roster, &missing, None).is_err());
    }

    #[test]
    fn script_run_stops_at_first_warning() {
        let mut session = Session::new();
        let input = Cursor::new("setup --sessions 4 --assessments 1\nremove 9999\nadd 1001 2\n");
        let err = run(&mut session, input, Vec::new(), Mode::Script).unwrap_err();
        assert!(err.to_string().starts_with("line 2: unknown student 9999"));
        assert!(session.report().unwrap().is_empty());
    }
}
