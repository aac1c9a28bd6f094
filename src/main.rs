use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod config;
mod error;
mod export;
mod gradebook;
mod grading;
mod logging;
mod models;
mod pdf;
mod report;
mod roster;
mod session;

use config::CourseConfig;
use session::{Mode, Session};

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(about = "Course gradebook: attendance, weighted scores and final letters", long_about = None)]
struct Cli {
    /// Append-only log file [default: $GRADEBOOK_LOG, then gradebook.log]
    #[arg(long, global = true)]
    log: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session, or replay a command script
    Shell {
        /// Run commands from a file and stop at the first warning
        #[arg(long)]
        script: Option<PathBuf>,
        /// Course configuration (JSON) applied before the first command
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Grade a whole course from files in one pass
    Run {
        #[arg(long)]
        config: PathBuf,
        /// One registration code per line
        #[arg(long)]
        roster: PathBuf,
        /// CSV with `code,attended` columns
        #[arg(long)]
        attendance: PathBuf,
        /// CSV with `code,assessment,score` columns
        #[arg(long)]
        scores: Option<PathBuf>,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// Markdown summary report
        #[arg(long)]
        report: Option<PathBuf>,
        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&logging::resolve_log_path(cli.log))?;

    match cli.command {
        Commands::Shell { script, config } => {
            let mut session = Session::new();
            if let Some(path) = config {
                let config = CourseConfig::from_json_file(&path)?;
                session.configure(config)?;
                println!("Course configured from {}.", path.display());
            }
            match script {
                Some(path) => {
                    let file = std::fs::File::open(&path)
                        .with_context(|| format!("failed to open script {}", path.display()))?;
                    session::run(&mut session, BufReader::new(file), io::stdout(), Mode::Script)
                        .with_context(|| format!("script {} failed", path.display()))?;
                }
                None => {
                    session::run(&mut session, io::stdin().lock(), io::stdout(), Mode::Interactive)?;
                }
            }
        }
        Commands::Run {
            config,
            roster: roster_path,
            attendance: attendance_path,
            scores,
            csv,
            pdf: pdf_path,
            report: report_path,
            json,
        } => {
            let (gradebook, outcome) = session::grade_course(
                CourseConfig::from_json_file(&config)?,
                &roster_path,
                &attendance_path,
                scores.as_deref(),
            )?;
            println!("Added {} students from {}.", outcome.import.added, roster_path.display());
            if !outcome.import.skipped.is_empty() {
                println!("Skipped without attendance: {}", outcome.import.skipped.join(", "));
            }
            if let Some(path) = &scores {
                for message in &outcome.rejected {
                    println!("warning: skipped score row {message}");
                }
                println!("Recorded {} scores from {}.", outcome.recorded, path.display());
            }

            if gradebook.is_empty() {
                println!("No students on the roster.");
                return Ok(());
            }

            let view = report::SummaryView::from_report(&gradebook);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("Final letters:");
                for share in view.letters.iter() {
                    println!("- {}: {} ({:.1}%)", share.letter, share.count, share.percent);
                }
            }

            let table = gradebook.to_table();
            if let Some(path) = csv {
                export::write_csv_file(&table, &path)?;
                println!("Wrote {}.", path.display());
            }
            if let Some(path) = pdf_path {
                pdf::write_table_file(&table, &path)?;
                println!("Wrote {}.", path.display());
            }
            if let Some(path) = report_path {
                std::fs::write(&path, report::build_report(&gradebook, chrono::Utc::now()))?;
                println!("Report written to {}.", path.display());
            }
        }
    }

    Ok(())
}
